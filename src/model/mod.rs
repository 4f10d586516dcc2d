//! Core data model.
//!
//! This module contains:
//! - The volume/chapter hierarchy and its placeholder rules
//! - Book metadata and packaged resources

mod book;
pub mod hierarchy;

pub use book::{Book, DEFAULT_AUTHOR, DEFAULT_LANGUAGE, Metadata, Resource};
pub use hierarchy::{
    Chapter, DEFAULT_CHAPTER_TITLE, DEFAULT_VOLUME_TITLE, Hierarchy, Origin, Volume,
};
