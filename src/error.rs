//! Error types for txtbook operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading a text source or writing an ebook.
#[derive(Error, Debug)]
pub enum Error {
    /// The text source could not be opened.
    #[error("source unavailable: {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bytes are not valid in the selected encoding.
    #[error("decode error: input is not valid {encoding}")]
    Decode { encoding: &'static str },

    /// The text source failed part-way through reading.
    #[error("read error: {0}")]
    Read(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// True for the failures that abort a parse (nothing was produced).
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Error::SourceUnavailable { .. } | Error::Decode { .. } | Error::Read(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
