//! Export module for writing parsed books.
//!
//! Provides the `Exporter` trait, the EPUB implementation, and the XHTML page
//! synthesis it builds on.
//!
//! # Example
//!
//! ```no_run
//! use txtbook::{Book, Metadata, read_txt};
//! use txtbook::export::{EpubExporter, Exporter};
//! use std::fs::File;
//!
//! let book = Book::new(Metadata::new("My Book"), read_txt("input.txt")?);
//! let mut file = File::create("output.epub")?;
//! EpubExporter::new().export(&book, &mut file)?;
//! # Ok::<(), txtbook::Error>(())
//! ```

use std::io::{Seek, Write};

use crate::error::Result;
use crate::model::Book;

mod epub;
pub mod xhtml;

pub use epub::{EpubConfig, EpubExporter, write_epub, write_epub_to_writer};

/// Trait for exporting books to specific formats.
///
/// Exporters use a builder pattern where configuration is held in the struct,
/// and the `export` method writes to any `Write + Seek` destination.
pub trait Exporter {
    /// Export the book to the provided writer.
    ///
    /// The writer can be:
    /// - `std::fs::File` for disk output
    /// - `std::io::Cursor<Vec<u8>>` for seekable in-memory output
    /// - Any other type implementing `Write + Seek`
    fn export<W: Write + Seek>(&self, book: &Book, writer: &mut W) -> Result<()>;
}
