//! # txtbook
//!
//! Recover the volume/chapter structure of a plain-text novel and package it
//! as an EPUB.
//!
//! ## Features
//!
//! - Detect volume and chapter titles such as `第一卷 风起` or `第十二章 归来`
//! - Build a strictly nested Volume → Chapter → line hierarchy
//! - Read UTF-8 (with or without BOM) or a caller-chosen legacy encoding
//! - Write EPUB 3 with nested NCX and nav tables of contents
//!
//! ## Quick Start
//!
//! ```no_run
//! use txtbook::{ConvertOptions, convert_file};
//!
//! // novel.txt -> novel.epub, titled "novel"
//! let summary = convert_file(ConvertOptions::for_input("novel.txt"))?;
//! println!("{} chapters", summary.chapters);
//! # Ok::<(), txtbook::Error>(())
//! ```
//!
//! ## Working with the hierarchy
//!
//! ```
//! use txtbook::parse_str;
//!
//! let volumes = parse_str("第一卷 风起\n第一章 序\n正文内容");
//! assert_eq!(volumes.len(), 1);
//! assert_eq!(volumes[0].title, "第一卷 风起");
//! assert_eq!(volumes[0].chapters[0].title, "第一章 序");
//! assert_eq!(volumes[0].chapters[0].content, vec!["正文内容"]);
//! ```

pub mod convert;
pub mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use convert::{
    BatchOptions, BatchReport, ConversionSummary, ConvertOptions, Converter, convert_directory,
    convert_file,
};
pub use error::{Error, Result};
pub use export::{write_epub, write_epub_to_writer};
pub use import::{parse_reader, parse_str, read_txt, read_txt_with_encoding};
pub use model::{Book, Chapter, Hierarchy, Metadata, Resource, Volume};
