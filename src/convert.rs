//! Text-to-EPUB conversion pipeline.
//!
//! Ties the importer and the exporter together: read and parse a text file,
//! attach metadata and an optional cover, package the result as EPUB. Also
//! provides batch conversion of every `.txt` file in a directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::error::{Error, Result};
use crate::export::{EpubConfig, EpubExporter};
use crate::import::read_txt_with_encoding;
use crate::model::{Book, DEFAULT_AUTHOR, DEFAULT_LANGUAGE, Metadata, Resource, Volume};
use crate::util::guess_media_type;

/// Cover image extensions looked up next to a text file, in priority order.
const COVER_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// What to convert and how to label it.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title: String,
    pub author: String,
    pub language: String,
    pub cover: Option<PathBuf>,
    /// Source encoding; UTF-8 (or whatever a BOM says) when `None`.
    pub encoding: Option<&'static Encoding>,
}

impl ConvertOptions {
    /// Defaults derived from the input path: `<stem>.epub` alongside it, the
    /// stem as title, and a same-stem image as cover if one exists.
    pub fn for_input(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let title = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            output: input.with_extension("epub"),
            cover: discover_cover(&input),
            title,
            author: DEFAULT_AUTHOR.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            encoding: None,
            input,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the author; an empty name falls back to the default author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        self.author = if author.trim().is_empty() {
            DEFAULT_AUTHOR.to_string()
        } else {
            author
        };
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_cover(mut self, cover: impl Into<PathBuf>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

/// Find `<stem>.jpg`, `<stem>.jpeg` or `<stem>.png` next to `txt_path`.
pub fn discover_cover(txt_path: &Path) -> Option<PathBuf> {
    COVER_EXTENSIONS
        .iter()
        .map(|ext| txt_path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub volumes: usize,
    pub chapters: usize,
    pub content_lines: usize,
    pub has_cover: bool,
}

/// Runs one conversion, reporting progress (0-100) as it goes.
///
/// Parsing ends at 15, cover handling at 50, and packaging advances from 50
/// to 95 chapter by chapter.
pub struct Converter<'a> {
    options: ConvertOptions,
    epub: EpubConfig,
    progress: Option<Box<dyn FnMut(u8) + 'a>>,
    last_progress: Option<u8>,
}

impl<'a> Converter<'a> {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            epub: EpubConfig::default(),
            progress: None,
            last_progress: None,
        }
    }

    pub fn with_epub_config(mut self, config: EpubConfig) -> Self {
        self.epub = config;
        self
    }

    /// Register a progress callback; values are clamped to 0-100 and each
    /// value is reported once.
    pub fn with_progress(mut self, callback: impl FnMut(u8) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    fn report(&mut self, value: usize) {
        let value = value.min(100) as u8;
        if self.last_progress == Some(value) {
            return;
        }
        self.last_progress = Some(value);
        if let Some(callback) = self.progress.as_mut() {
            callback(value);
        }
    }

    /// Parse the input and attach metadata and cover, without writing.
    pub fn load_book(&self) -> Result<Book> {
        let volumes = self.parse()?;
        Ok(self.assemble(volumes))
    }

    fn parse(&self) -> Result<Vec<Volume>> {
        read_txt_with_encoding(&self.options.input, self.options.encoding)
    }

    fn assemble(&self, volumes: Vec<Volume>) -> Book {
        let opts = &self.options;
        let mut metadata = Metadata::new(opts.title.clone())
            .with_author(opts.author.clone())
            .with_language(opts.language.clone());
        if let Some(cover) = load_cover(opts.cover.as_deref()) {
            metadata = metadata.with_cover(cover);
        }

        Book::new(metadata, volumes)
    }

    /// Convert and write the EPUB; nothing is written if parsing fails.
    pub fn run(mut self) -> Result<ConversionSummary> {
        log::info!("starting conversion for '{}'", self.options.title);
        self.report(0);

        let volumes = self.parse().inspect_err(|e| {
            log::error!("failed to parse {}: {e}", self.options.input.display());
        })?;
        self.report(15);

        let book = self.assemble(volumes);
        self.report(50);

        log::info!("packaging {} chapter(s)", book.chapter_count());
        let mut buffer = Cursor::new(Vec::new());
        let exporter = EpubExporter::new().with_config(self.epub.clone());
        exporter.export_with_progress(&book, &mut buffer, |done, total| {
            self.report(50 + 45 * done / total.max(1));
        })?;
        self.report(95);

        log::info!("writing EPUB file to: {}", self.options.output.display());
        fs::write(&self.options.output, buffer.into_inner())?;
        self.report(100);

        log::info!("conversion complete for '{}'", self.options.title);
        Ok(ConversionSummary {
            input: self.options.input.clone(),
            output: self.options.output.clone(),
            volumes: book.volumes.len(),
            chapters: book.chapter_count(),
            content_lines: book.volumes.iter().map(|v| v.content_line_count()).sum(),
            has_cover: book.metadata.cover_image.is_some(),
        })
    }
}

/// Read a cover image. A missing or unreadable cover is logged and skipped.
fn load_cover(path: Option<&Path>) -> Option<Resource> {
    let path = path?;
    if !path.is_file() {
        log::warn!("cover image not found: {}; continuing without cover", path.display());
        return None;
    }

    match fs::read(path) {
        Ok(data) => {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "img".to_string());
            log::info!("using cover image: {}", path.display());
            Some(Resource::new(
                format!("cover.{ext}"),
                data,
                guess_media_type(&path.to_string_lossy()),
            ))
        }
        Err(e) => {
            log::error!("failed to read cover image {}: {e}", path.display());
            None
        }
    }
}

/// Convert one file with the given options.
pub fn convert_file(options: ConvertOptions) -> Result<ConversionSummary> {
    Converter::new(options).run()
}

/// Settings applied to every file of a directory conversion.
///
/// Output path, title and cover stay per file (derived from each file's
/// name); only these shared settings are overridden.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub author: Option<String>,
    pub language: Option<String>,
    pub encoding: Option<&'static Encoding>,
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Overlay the shared settings on one file's options.
    pub fn apply(&self, mut options: ConvertOptions) -> ConvertOptions {
        if let Some(ref author) = self.author {
            options = options.with_author(author.as_str());
        }
        if let Some(ref language) = self.language {
            options = options.with_language(language.as_str());
        }
        if let Some(encoding) = self.encoding {
            options = options.with_encoding(encoding);
        }
        options
    }
}

/// Results of converting a directory.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<ConversionSummary>,
    pub failed: Vec<(PathBuf, Error)>,
}

/// List the `.txt` files directly inside `dir`, sorted by path.
pub fn find_txt_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_txt = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if is_txt && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Convert every `.txt` file in `dir` to a sibling `.epub`, applying the
/// shared `batch` settings to each.
///
/// A failure on one file is logged and recorded; the rest still run.
pub fn convert_directory(dir: &Path, batch: &BatchOptions) -> Result<BatchReport> {
    log::info!("scanning directory for TXT files: {}", dir.display());
    let files = find_txt_files(dir)?;
    if files.is_empty() {
        log::info!("no TXT files found in {}", dir.display());
        return Ok(BatchReport::default());
    }
    log::info!("found {} TXT file(s) to convert", files.len());

    let mut report = BatchReport::default();
    for path in files {
        log::info!("--- processing file: {} ---", path.display());
        match convert_file(batch.apply(ConvertOptions::for_input(&path))) {
            Ok(summary) => report.converted.push(summary),
            Err(e) => {
                log::error!("failed to convert {}: {e}", path.display());
                report.failed.push((path, e));
            }
        }
    }
    Ok(report)
}
