use super::hierarchy::{Chapter, Volume};

/// Language tag used when none is given.
pub const DEFAULT_LANGUAGE: &str = "zh-CN";

/// Author used when none is given.
pub const DEFAULT_AUTHOR: &str = "Unknown Author";

/// A parsed book: metadata plus the recovered volume hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub metadata: Metadata,
    pub volumes: Vec<Volume>,
}

/// Book metadata (Dublin Core subset)
#[derive(Debug, Clone)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub identifier: String,
    pub cover_image: Option<Resource>,
}

/// A binary resource packaged alongside the text (the cover image).
#[derive(Debug, Clone)]
pub struct Resource {
    /// File name inside the package, e.g. `cover.jpg`.
    pub href: String,
    pub data: Vec<u8>,
    pub media_type: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            authors: Vec::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            identifier: String::new(),
            cover_image: None,
        }
    }
}

impl Book {
    pub fn new(metadata: Metadata, volumes: Vec<Volume>) -> Self {
        Self { metadata, volumes }
    }

    /// Iterate `(volume index, chapter index, volume, chapter)` in reading
    /// order. Indices are 1-based, matching the packaged file names.
    pub fn chapters(&self) -> impl Iterator<Item = (usize, usize, &Volume, &Chapter)> {
        self.volumes.iter().enumerate().flat_map(|(vi, volume)| {
            volume
                .chapters
                .iter()
                .enumerate()
                .map(move |(ci, chapter)| (vi + 1, ci + 1, volume, chapter))
        })
    }

    pub fn chapter_count(&self) -> usize {
        self.volumes.iter().map(|v| v.chapters.len()).sum()
    }
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_cover(mut self, cover: Resource) -> Self {
        self.cover_image = Some(cover);
        self
    }
}

impl Resource {
    pub fn new(href: impl Into<String>, data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            data,
            media_type: media_type.into(),
        }
    }
}
