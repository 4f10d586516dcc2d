//! EPUB exporter.
//!
//! Packages a [`Book`] as an EPUB 3 file with an EPUB 2 NCX fallback. The
//! table of contents mirrors the volume/chapter nesting and the spine follows
//! hierarchy traversal order.

use std::io::{Seek, Write};
use std::path::Path;

use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;
use crate::model::{Book, Metadata};
use crate::util::{format_utc_timestamp, time_now_secs, uuid_v4};

use super::Exporter;
use super::xhtml::{
    STYLESHEET, STYLESHEET_HREF, chapter_file_name, document_head, render_chapter,
    render_cover_page,
};

/// Configuration for EPUB export.
#[derive(Debug, Clone, Default)]
pub struct EpubConfig {
    /// Compression level for deflate (0-9, default 6).
    pub compression_level: Option<u32>,
    /// Fixed `dcterms:modified` value; the current time when `None`.
    pub modified: Option<String>,
}

/// EPUB format exporter.
///
/// # Example
///
/// ```no_run
/// use txtbook::{Book, Metadata, parse_str};
/// use txtbook::export::{EpubExporter, Exporter};
/// use std::fs::File;
///
/// let volumes = parse_str("第一章 序\n正文");
/// let book = Book::new(Metadata::new("书名"), volumes);
/// let mut file = File::create("output.epub")?;
/// EpubExporter::new().export(&book, &mut file)?;
/// # Ok::<(), txtbook::Error>(())
/// ```
pub struct EpubExporter {
    config: EpubConfig,
}

impl EpubExporter {
    /// Create a new exporter with default configuration.
    pub fn new() -> Self {
        Self {
            config: EpubConfig::default(),
        }
    }

    /// Configure the exporter with custom settings.
    pub fn with_config(mut self, config: EpubConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for EpubExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// A table of contents entry (hierarchical)
#[derive(Debug, Clone, PartialEq, Eq)]
struct TocEntry {
    title: String,
    href: String,
    children: Vec<TocEntry>,
}

struct ManifestItem {
    id: String,
    href: String,
    media_type: String,
    properties: Option<&'static str>,
}

/// A file inside the package content directory.
struct PackageFile {
    href: String,
    data: Vec<u8>,
}

const NAV_HREF: &str = "nav.xhtml";
const COVER_PAGE_HREF: &str = "cover.xhtml";
const XHTML: &str = "application/xhtml+xml";

impl Exporter for EpubExporter {
    fn export<W: Write + Seek>(&self, book: &Book, writer: &mut W) -> Result<()> {
        self.export_with_progress(book, writer, |_, _| {})
    }
}

impl EpubExporter {
    /// Export, calling `on_chapter(done, total)` after each chapter page is
    /// rendered.
    pub fn export_with_progress<W, F>(
        &self,
        book: &Book,
        writer: &mut W,
        mut on_chapter: F,
    ) -> Result<()>
    where
        W: Write + Seek,
        F: FnMut(usize, usize),
    {
        let mut zip = ZipWriter::new(writer);

        let compression_level = self.config.compression_level.unwrap_or(6);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level as i64));

        // 1. Write mimetype (must be first, uncompressed)
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        // 2. Write container.xml
        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML)?;

        // Generate identifier once for consistency between OPF and NCX
        let identifier = if book.metadata.identifier.is_empty() {
            format!("urn:uuid:{}", uuid_v4())
        } else {
            book.metadata.identifier.clone()
        };
        let modified = self
            .config
            .modified
            .clone()
            .unwrap_or_else(|| format_utc_timestamp(time_now_secs()));

        // 3. Collect package files, manifest and spine
        let language = book.metadata.language.as_str();
        let mut files: Vec<PackageFile> = Vec::new();
        let mut manifest: Vec<ManifestItem> = Vec::new();
        let mut spine_refs: Vec<String> = Vec::new();

        manifest.push(ManifestItem {
            id: "style_main".to_string(),
            href: STYLESHEET_HREF.to_string(),
            media_type: "text/css".to_string(),
            properties: None,
        });
        files.push(PackageFile {
            href: STYLESHEET_HREF.to_string(),
            data: STYLESHEET.as_bytes().to_vec(),
        });

        if let Some(ref cover) = book.metadata.cover_image {
            let image_href = format!("images/{}", cover.href);
            manifest.push(ManifestItem {
                id: "cover-image".to_string(),
                href: image_href.clone(),
                media_type: cover.media_type.clone(),
                properties: Some("cover-image"),
            });
            files.push(PackageFile {
                href: image_href.clone(),
                data: cover.data.clone(),
            });

            manifest.push(ManifestItem {
                id: "cover".to_string(),
                href: COVER_PAGE_HREF.to_string(),
                media_type: XHTML.to_string(),
                properties: None,
            });
            files.push(PackageFile {
                href: COVER_PAGE_HREF.to_string(),
                data: render_cover_page(&image_href, &book.metadata.title, language).into_bytes(),
            });
            spine_refs.push("cover".to_string());
        }

        let toc = build_toc(book);

        manifest.push(ManifestItem {
            id: "nav".to_string(),
            href: NAV_HREF.to_string(),
            media_type: XHTML.to_string(),
            properties: Some("nav"),
        });
        files.push(PackageFile {
            href: NAV_HREF.to_string(),
            data: generate_nav(&book.metadata, &toc).into_bytes(),
        });
        spine_refs.push("nav".to_string());

        let total_chapters = book.chapter_count();
        for (done, (vi, ci, _, chapter)) in book.chapters().enumerate() {
            let href = chapter_file_name(vi, ci);
            let id = format!("chapter_{vi:03}_{ci:03}");
            manifest.push(ManifestItem {
                id: id.clone(),
                href: href.clone(),
                media_type: XHTML.to_string(),
                properties: None,
            });
            files.push(PackageFile {
                href,
                data: render_chapter(chapter, language).into_bytes(),
            });
            spine_refs.push(id);
            on_chapter(done + 1, total_chapters);
        }

        // 4. Write content.opf
        let opf = generate_opf(&book.metadata, &identifier, &modified, &manifest, &spine_refs);
        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(opf.as_bytes())?;

        // 5. Write toc.ncx
        let ncx = generate_ncx(&book.metadata, &identifier, &toc);
        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(ncx.as_bytes())?;

        // 6. Write stylesheet, cover, nav and chapters
        for file in &files {
            zip.start_file(format!("OEBPS/{}", file.href), deflated)?;
            zip.write_all(&file.data)?;
        }

        zip.finish()?;
        log::debug!(
            "wrote EPUB with {} chapter(s) and {} manifest item(s)",
            book.chapter_count(),
            manifest.len()
        );
        Ok(())
    }
}

/// Container.xml template.
const CONTAINER_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// One entry per volume that has chapters, pointing at its first chapter,
/// with its chapters nested underneath.
fn build_toc(book: &Book) -> Vec<TocEntry> {
    let mut toc = Vec::new();
    for (vi, volume) in book.volumes.iter().enumerate() {
        let children: Vec<TocEntry> = volume
            .chapters
            .iter()
            .enumerate()
            .map(|(ci, chapter)| TocEntry {
                title: chapter.title.clone(),
                href: chapter_file_name(vi + 1, ci + 1),
                children: Vec::new(),
            })
            .collect();

        let Some(first) = children.first() else {
            continue;
        };
        toc.push(TocEntry {
            title: volume.title.clone(),
            href: first.href.clone(),
            children,
        });
    }
    toc
}

fn toc_depth(toc: &[TocEntry]) -> usize {
    toc.iter()
        .map(|e| 1 + toc_depth(&e.children))
        .max()
        .unwrap_or(0)
}

/// Generate content.opf from metadata and manifest.
fn generate_opf(
    metadata: &Metadata,
    identifier: &str,
    modified: &str,
    manifest: &[ManifestItem],
    spine_refs: &[String],
) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );

    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape(metadata.title.as_str())
    ));
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape(identifier)
    ));

    let language = if metadata.language.is_empty() {
        crate::model::DEFAULT_LANGUAGE
    } else {
        &metadata.language
    };
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape(language)
    ));

    for author in &metadata.authors {
        opf.push_str(&format!(
            "    <dc:creator>{}</dc:creator>\n",
            escape(author.as_str())
        ));
    }

    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        escape(modified)
    ));

    // EPUB 2 readers look for the cover through this meta
    if metadata.cover_image.is_some() {
        opf.push_str("    <meta name=\"cover\" content=\"cover-image\"/>\n");
    }

    opf.push_str("  </metadata>\n  <manifest>\n");
    opf.push_str(
        "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
    );

    for item in manifest {
        let properties = item
            .properties
            .map(|p| format!(" properties=\"{p}\""))
            .unwrap_or_default();
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>\n",
            escape(item.id.as_str()),
            escape(item.href.as_str()),
            escape(item.media_type.as_str()),
            properties
        ));
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    for id in spine_refs {
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", escape(id.as_str())));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

/// Generate toc.ncx from TOC entries.
fn generate_ncx(metadata: &Metadata, identifier: &str, toc: &[TocEntry]) -> String {
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
"#,
    );
    ncx.push_str(&format!(
        "    <meta name=\"dtb:uid\" content=\"{}\"/>\n",
        escape(identifier)
    ));
    ncx.push_str(&format!(
        "    <meta name=\"dtb:depth\" content=\"{}\"/>\n",
        toc_depth(toc).max(1)
    ));
    ncx.push_str(
        r#"    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
"#,
    );
    ncx.push_str(&format!(
        "    <text>{}</text>\n",
        escape(metadata.title.as_str())
    ));
    ncx.push_str("  </docTitle>\n  <navMap>\n");

    let mut play_order = 1;
    write_nav_points(&mut ncx, toc, &mut play_order, 2);

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

/// Recursively write navPoint elements.
fn write_nav_points(ncx: &mut String, entries: &[TocEntry], play_order: &mut usize, indent: usize) {
    let indent_str = "  ".repeat(indent);

    for entry in entries {
        ncx.push_str(&format!(
            "{}<navPoint id=\"navPoint-{}\" playOrder=\"{}\">\n",
            indent_str, play_order, play_order
        ));
        ncx.push_str(&format!(
            "{}  <navLabel><text>{}</text></navLabel>\n",
            indent_str,
            escape(entry.title.as_str())
        ));
        ncx.push_str(&format!(
            "{}  <content src=\"{}\"/>\n",
            indent_str,
            escape(entry.href.as_str())
        ));

        *play_order += 1;

        if !entry.children.is_empty() {
            write_nav_points(ncx, &entry.children, play_order, indent + 1);
        }

        ncx.push_str(&format!("{}</navPoint>\n", indent_str));
    }
}

/// Generate the EPUB 3 navigation document.
fn generate_nav(metadata: &Metadata, toc: &[TocEntry]) -> String {
    let mut nav = document_head(&metadata.title, &metadata.language, None);
    nav.push_str("<body>\n  <nav epub:type=\"toc\" id=\"toc\">\n");
    nav.push_str(&format!(
        "    <h1>{}</h1>\n",
        escape(metadata.title.as_str())
    ));
    write_nav_list(&mut nav, toc, 2);
    nav.push_str("  </nav>\n</body>\n</html>\n");
    nav
}

fn write_nav_list(nav: &mut String, entries: &[TocEntry], indent: usize) {
    let indent_str = "  ".repeat(indent);
    nav.push_str(&format!("{indent_str}<ol>\n"));
    for entry in entries {
        nav.push_str(&format!(
            "{}  <li><a href=\"{}\">{}</a>",
            indent_str,
            escape(entry.href.as_str()),
            escape(entry.title.as_str())
        ));
        if entry.children.is_empty() {
            nav.push_str("</li>\n");
        } else {
            nav.push('\n');
            write_nav_list(nav, &entry.children, indent + 2);
            nav.push_str(&format!("{indent_str}  </li>\n"));
        }
    }
    nav.push_str(&format!("{indent_str}</ol>\n"));
}

/// Write a [`Book`] to an EPUB file on disk.
pub fn write_epub<P: AsRef<Path>>(book: &Book, path: P) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    EpubExporter::new().export(book, &mut file)
}

/// Write a [`Book`] to any [`Write`] + [`Seek`] destination.
pub fn write_epub_to_writer<W: Write + Seek>(book: &Book, writer: &mut W) -> Result<()> {
    EpubExporter::new().export(book, writer)
}
