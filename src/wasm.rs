//! WASM bindings for browser-based conversion.
//!
//! This module exposes the parse-and-package pipeline to JavaScript via
//! wasm-bindgen.

use std::io::Cursor;
use wasm_bindgen::prelude::*;

use crate::export::write_epub_to_writer;
use crate::import::read_txt_bytes;
use crate::model::{Book, DEFAULT_AUTHOR, Metadata};
use crate::util::encoding_for_label;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Convert a plain-text novel to EPUB.
///
/// Takes raw text bytes (UTF-8 unless `encoding` names another WHATWG label)
/// and returns EPUB bytes.
#[wasm_bindgen]
pub fn txt_to_epub(
    data: &[u8],
    title: &str,
    author: Option<String>,
    encoding: Option<String>,
) -> Result<Vec<u8>, JsValue> {
    let encoding = encoding
        .as_deref()
        .map(encoding_for_label)
        .transpose()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let volumes = read_txt_bytes(data, encoding).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let author = author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
    let book = Book::new(Metadata::new(title).with_author(author), volumes);

    let mut output = Cursor::new(Vec::new());
    write_epub_to_writer(&book, &mut output).map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(output.into_inner())
}

/// Parse a plain-text novel and return its outline as `volume\tchapter\tlines`
/// rows, one per chapter.
#[wasm_bindgen]
pub fn txt_outline(data: &[u8]) -> Result<String, JsValue> {
    let volumes = read_txt_bytes(data, None).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let mut out = String::new();
    for volume in &volumes {
        for chapter in &volume.chapters {
            out.push_str(&format!(
                "{}\t{}\t{}\n",
                volume.title,
                chapter.title,
                chapter.content.len()
            ));
        }
    }
    Ok(out)
}
