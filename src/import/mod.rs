//! Importers that recover book structure from source text.
//!
//! - [`classify`] decides what each line means (blank, volume title,
//!   chapter title, or content).
//! - [`txt`] drives a [`Hierarchy`](crate::model::Hierarchy) from those
//!   classifications and handles reading and decoding the source.

pub mod classify;
mod txt;

pub use classify::{LineKind, classify_line, is_structural_marker};
pub use txt::{
    StructureBuilder, parse_lines, parse_reader, parse_str, read_txt, read_txt_bytes,
    read_txt_with_encoding,
};
