//! XHTML page synthesis for chapters and the cover.
//!
//! Every chapter becomes one standalone XHTML5 document: an `<h1>` with the
//! chapter title followed by one `<p>` per content line. All text goes through
//! XML escaping.

use quick_xml::escape::escape;

use crate::model::{Chapter, DEFAULT_LANGUAGE};

/// Path of the shared stylesheet, relative to the package content directory.
pub const STYLESHEET_HREF: &str = "style/main.css";

/// Stylesheet linked from every chapter page.
pub const STYLESHEET: &str = "\
body {
    font-family: sans-serif;
}
p {
    text-indent: 2em;
    margin-top: 0;
    margin-bottom: 0;
    line-height: 1.6;
}
h1 {
    text-align: center;
    font-weight: bold;
    margin-top: 1.5em;
    margin-bottom: 1em;
}
.cover {
    margin: 0;
    padding: 0;
    text-align: center;
}
.cover img {
    max-width: 100%;
    max-height: 100%;
}
";

/// File name of a chapter page: `{volume:03}_{chapter:03}.xhtml`, 1-based.
pub fn chapter_file_name(volume_index: usize, chapter_index: usize) -> String {
    format!("{volume_index:03}_{chapter_index:03}.xhtml")
}

/// Synthesize the XHTML document for one chapter.
pub fn render_chapter(chapter: &Chapter, language: &str) -> String {
    let mut doc = document_head(&chapter.title, language, Some(STYLESHEET_HREF));

    doc.push_str("<body>\n");
    doc.push_str(&format!("  <h1>{}</h1>\n", escape(chapter.title.as_str())));
    for line in &chapter.content {
        doc.push_str(&format!("  <p>{}</p>\n", escape(line.as_str())));
    }
    doc.push_str("</body>\n</html>\n");
    doc
}

/// Synthesize a page showing the cover image full-bleed.
pub fn render_cover_page(image_href: &str, title: &str, language: &str) -> String {
    let mut doc = document_head(title, language, Some(STYLESHEET_HREF));
    doc.push_str(&format!(
        "<body class=\"cover\">\n  <img src=\"{}\" alt=\"{}\"/>\n</body>\n</html>\n",
        escape(image_href),
        escape(title)
    ));
    doc
}

/// XML declaration, doctype, `<html>` and a complete `<head>`.
///
/// An empty `language` falls back to [`DEFAULT_LANGUAGE`], as in the OPF.
pub(crate) fn document_head(title: &str, language: &str, stylesheet_href: Option<&str>) -> String {
    let language = escape(if language.is_empty() {
        DEFAULT_LANGUAGE
    } else {
        language
    });
    let mut doc = String::new();

    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n");
    doc.push_str(&format!(
        "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\" lang=\"{language}\" xml:lang=\"{language}\">\n"
    ));
    doc.push_str("<head>\n  <meta charset=\"utf-8\"/>\n");
    doc.push_str(&format!("  <title>{}</title>\n", escape(title)));
    if let Some(href) = stylesheet_href {
        doc.push_str(&format!(
            "  <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>\n",
            escape(href)
        ));
    }
    doc.push_str("</head>\n");
    doc
}
