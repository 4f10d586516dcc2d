//! Plain-text importer.
//!
//! Reads a decoded text one line at a time and grows a [`Hierarchy`] from the
//! structural markers it finds. A parse either completes or fails as a whole;
//! no partially built hierarchy is ever returned.

use std::fs::File;
use std::io::{self, BufRead, Read};
use std::path::Path;

use encoding_rs::Encoding;

use super::classify::{LineKind, classify_line};
use crate::error::{Error, Result};
use crate::model::{Hierarchy, Volume};
use crate::util::decode_text;

const BOM: char = '\u{feff}';

/// Incremental driver that feeds classified lines into a [`Hierarchy`].
///
/// # Example
///
/// ```
/// use txtbook::import::StructureBuilder;
///
/// let mut builder = StructureBuilder::new();
/// for line in ["第一卷 风起", "第一章 序", "正文内容"] {
///     builder.push_line(line);
/// }
/// let volumes = builder.finish();
/// assert_eq!(volumes[0].title, "第一卷 风起");
/// assert_eq!(volumes[0].chapters[0].content, vec!["正文内容"]);
/// ```
#[derive(Debug, Default)]
pub struct StructureBuilder {
    hierarchy: Hierarchy,
    lines_seen: usize,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hierarchy built so far (before final pruning).
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Classify one raw line and apply it.
    ///
    /// A byte-order mark at the very start of the input is dropped.
    pub fn push_line(&mut self, raw: &str) {
        let raw = if self.lines_seen == 0 {
            raw.strip_prefix(BOM).unwrap_or(raw)
        } else {
            raw
        };
        self.lines_seen += 1;

        match classify_line(raw) {
            LineKind::Blank => {}
            LineKind::Volume(title) => {
                log::info!("detected volume title: {title}");
                self.hierarchy.remove_trailing_empty_chapter();
                self.hierarchy.add_volume(title);
            }
            LineKind::Chapter(title) => {
                log::info!("detected chapter title: {title}");
                self.hierarchy.add_chapter(title, None);
            }
            LineKind::Content(line) => {
                log::debug!("content line: {line}");
                self.hierarchy.append_content_line(line);
            }
        }
    }

    /// Prune trailing placeholders and hand off the finished volumes.
    pub fn finish(self) -> Vec<Volume> {
        self.finish_hierarchy().into_volumes()
    }

    /// Like [`finish`](Self::finish) but keeps the [`Hierarchy`] wrapper.
    pub fn finish_hierarchy(mut self) -> Hierarchy {
        self.hierarchy.prune_trailing_placeholders();
        log::debug!(
            "parsed {} volume(s), {} chapter(s), {} content line(s)",
            self.hierarchy.volumes().len(),
            self.hierarchy.chapter_count(),
            self.hierarchy.content_line_count()
        );
        self.hierarchy
    }
}

/// Split on `\n`, `\r\n` and bare `\r`.
///
/// `\r\n` yields an extra empty piece, which classifies as blank and is
/// skipped like any other blank line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n'])
}

/// Parse an already decoded text.
pub fn parse_str(text: &str) -> Vec<Volume> {
    let mut builder = StructureBuilder::new();
    for line in split_lines(text) {
        builder.push_line(line);
    }
    builder.finish()
}

/// Parse a stream of lines, aborting on the first read error.
pub fn parse_lines<I, S>(lines: I) -> Result<Vec<Volume>>
where
    I: IntoIterator<Item = io::Result<S>>,
    S: AsRef<str>,
{
    let mut builder = StructureBuilder::new();
    for line in lines {
        let line = line.map_err(read_error)?;
        for piece in split_lines(line.as_ref()) {
            builder.push_line(piece);
        }
    }
    Ok(builder.finish())
}

/// Parse UTF-8 text from any buffered reader.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<Volume>> {
    parse_lines(reader.lines())
}

/// Decode `bytes` (UTF-8 unless a BOM or `encoding` says otherwise) and parse.
pub fn read_txt_bytes(bytes: &[u8], encoding: Option<&'static Encoding>) -> Result<Vec<Volume>> {
    let text = decode_text(bytes, encoding)?;
    Ok(parse_str(&text))
}

/// Read and parse a UTF-8 text file.
///
/// # Example
///
/// ```no_run
/// let volumes = txtbook::read_txt("novel.txt")?;
/// for volume in &volumes {
///     println!("{} ({} chapters)", volume.title, volume.chapters.len());
/// }
/// # Ok::<(), txtbook::Error>(())
/// ```
pub fn read_txt<P: AsRef<Path>>(path: P) -> Result<Vec<Volume>> {
    read_txt_with_encoding(path, None)
}

/// Read and parse a text file in the given encoding.
pub fn read_txt_with_encoding<P: AsRef<Path>>(
    path: P,
    encoding: Option<&'static Encoding>,
) -> Result<Vec<Volume>> {
    let path = path.as_ref();
    if path.is_dir() {
        log::error!("expected a text file but found a directory: {}", path.display());
        return Err(Error::SourceUnavailable {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::IsADirectory, "is a directory"),
        });
    }

    let mut file = File::open(path).map_err(|source| {
        log::error!("text file not found at {}: {source}", path.display());
        Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(Error::Read)?;

    read_txt_bytes(&bytes, encoding).inspect_err(|e| {
        log::error!("error reading or parsing {}: {e}", path.display());
    })
}

/// Invalid UTF-8 from `BufRead::lines` is a decode failure; anything else is a
/// read failure.
fn read_error(e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::InvalidData {
        Error::Decode { encoding: "UTF-8" }
    } else {
        Error::Read(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_CHAPTER_TITLE, DEFAULT_VOLUME_TITLE};
    use proptest::prelude::*;

    fn outline(volumes: &[Volume]) -> Vec<(String, Vec<(String, Vec<String>)>)> {
        volumes
            .iter()
            .map(|v| {
                (
                    v.title.clone(),
                    v.chapters
                        .iter()
                        .map(|c| (c.title.clone(), c.content.clone()))
                        .collect(),
                )
            })
            .collect()
    }

    fn all_content(volumes: &[Volume]) -> Vec<String> {
        volumes
            .iter()
            .flat_map(|v| v.chapters.iter())
            .flat_map(|c| c.content.iter().cloned())
            .collect()
    }

    #[test]
    fn test_content_only() {
        let volumes = parse_str("content only\nmore content");
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].title, DEFAULT_VOLUME_TITLE);
        assert!(volumes[0].is_placeholder());
        assert_eq!(volumes[0].chapters.len(), 1);
        assert_eq!(volumes[0].chapters[0].title, DEFAULT_CHAPTER_TITLE);
        assert_eq!(
            volumes[0].chapters[0].content,
            vec!["content only", "more content"]
        );
    }

    #[test]
    fn test_volume_chapter_content() {
        let volumes = parse_str("第一卷 风起\n第一章 序\n正文内容");
        assert_eq!(
            outline(&volumes),
            vec![(
                "第一卷 风起".to_string(),
                vec![("第一章 序".to_string(), vec!["正文内容".to_string()])]
            )]
        );
    }

    #[test]
    fn test_chapterless_volume_survives_when_not_last() {
        let volumes = parse_str("第一卷 甲\n第二卷 乙\n第一章 序\n内容");
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0].title, "第一卷 甲");
        assert!(volumes[0].chapters.is_empty());
        assert_eq!(volumes[1].title, "第二卷 乙");
        assert_eq!(volumes[1].chapters.len(), 1);
        assert_eq!(volumes[1].chapters[0].title, "第一章 序");
        assert_eq!(volumes[1].chapters[0].content, vec!["内容"]);
    }

    #[test]
    fn test_empty_input_keeps_one_placeholder_volume() {
        // The "more than one volume" guard protects the lone seed volume,
        // so empty input yields one placeholder volume with no chapters.
        for input in ["", "\n\n   \n\u{3000}"] {
            let volumes = parse_str(input);
            assert_eq!(volumes.len(), 1, "input {input:?}");
            assert_eq!(volumes[0].title, DEFAULT_VOLUME_TITLE);
            assert!(volumes[0].is_placeholder());
            assert!(volumes[0].chapters.is_empty());
        }
    }

    #[test]
    fn test_preface_before_first_volume() {
        let volumes = parse_str("楔子\n第一卷 风起\n第一章 序\n正文");
        assert_eq!(
            outline(&volumes),
            vec![
                (
                    DEFAULT_VOLUME_TITLE.to_string(),
                    vec![(DEFAULT_CHAPTER_TITLE.to_string(), vec!["楔子".to_string()])]
                ),
                (
                    "第一卷 风起".to_string(),
                    vec![("第一章 序".to_string(), vec!["正文".to_string()])]
                ),
            ]
        );
    }

    #[test]
    fn test_chapters_without_volumes() {
        let volumes = parse_str("第一章 开端\n甲\n\n第二章 发展\n乙\n丙");
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].title, DEFAULT_VOLUME_TITLE);
        assert_eq!(
            volumes[0]
                .chapters
                .iter()
                .map(|c| c.title.as_str())
                .collect::<Vec<_>>(),
            vec!["第一章 开端", "第二章 发展"]
        );
        assert_eq!(volumes[0].chapters[1].content, vec!["乙", "丙"]);
    }

    #[test]
    fn test_empty_chapter_dropped_at_volume_boundary() {
        let volumes = parse_str("第一卷\n第一章\n正文\n第二章\n第二卷\n第三章\n正文");
        assert_eq!(volumes[0].chapters.len(), 1);
        assert_eq!(volumes[0].chapters[0].title, "第一章");
        assert_eq!(volumes[1].chapters[0].title, "第三章");
    }

    #[test]
    fn test_trailing_real_empty_chapter_is_kept() {
        let volumes = parse_str("第一章\n正文\n第二章");
        assert_eq!(volumes[0].chapters.len(), 2);
        assert!(volumes[0].chapters[1].content.is_empty());
    }

    #[test]
    fn test_trailing_real_empty_volume_is_kept() {
        let volumes = parse_str("第一卷\n第一章\n正文\n第二卷");
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[1].title, "第二卷");
        assert!(volumes[1].chapters.is_empty());
    }

    #[test]
    fn test_content_after_chapterless_volume_gets_default_chapter() {
        let volumes = parse_str("第一卷\n正文");
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].chapters[0].title, DEFAULT_CHAPTER_TITLE);
        assert_eq!(volumes[0].chapters[0].content, vec!["正文"]);
    }

    #[test]
    fn test_crlf_and_indentation() {
        let volumes = parse_str("\u{3000}\u{3000}第一章 序\r\n\u{3000}\u{3000}他说：  走吧。\r\n");
        assert_eq!(volumes[0].chapters[0].title, "第一章 序");
        assert_eq!(volumes[0].chapters[0].content, vec!["他说：  走吧。"]);
    }

    #[test]
    fn test_parse_reader() {
        let input = "第一章\n一\n二\n".as_bytes();
        let volumes = parse_reader(input).unwrap();
        assert_eq!(volumes[0].chapters[0].content, vec!["一", "二"]);
    }

    #[test]
    fn test_parse_reader_rejects_invalid_utf8() {
        let input: &[u8] = &[b'o', b'k', b'\n', 0xFF, 0xFE, b'\n'];
        assert!(matches!(
            parse_reader(input),
            Err(Error::Decode { encoding: "UTF-8" })
        ));
    }

    #[test]
    fn test_parse_lines_aborts_on_read_error() {
        let lines: Vec<io::Result<String>> = vec![
            Ok("第一章".to_string()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone")),
            Ok("never seen".to_string()),
        ];
        assert!(matches!(parse_lines(lines), Err(Error::Read(_))));
    }

    #[test]
    fn test_read_txt_bytes_with_encoding() {
        let (bytes, _, _) = encoding_rs::GB18030.encode("第一卷 风起\n第一章 序\n正文");
        let volumes = read_txt_bytes(&bytes, Some(encoding_rs::GB18030)).unwrap();
        assert_eq!(volumes[0].title, "第一卷 风起");
        assert_eq!(volumes[0].chapters[0].content, vec!["正文"]);
    }

    #[test]
    fn test_read_txt_bytes_rejects_wrong_encoding() {
        let (bytes, _, _) = encoding_rs::GBK.encode("第一章 序");
        assert!(matches!(
            read_txt_bytes(&bytes, None),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_read_txt_missing_file() {
        let err = read_txt("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert!(err.is_source_failure());
    }

    #[test]
    fn test_bare_carriage_returns_split_lines() {
        let volumes = parse_str("第一卷 风起\r第一章 序\r正文内容\r");
        assert_eq!(
            outline(&volumes),
            vec![(
                "第一卷 风起".to_string(),
                vec![("第一章 序".to_string(), vec!["正文内容".to_string()])]
            )]
        );
    }

    #[test]
    fn test_mixed_line_endings() {
        let volumes = parse_str("第一章 甲\r\n一\r二\n第二章 乙\r\n三");
        assert_eq!(
            outline(&volumes)[0].1,
            vec![
                ("第一章 甲".to_string(), vec!["一".to_string(), "二".to_string()]),
                ("第二章 乙".to_string(), vec!["三".to_string()]),
            ]
        );
    }

    #[test]
    fn test_parse_reader_splits_bare_carriage_returns() {
        let input = "第一章 序\r一\r二".as_bytes();
        let volumes = parse_reader(input).unwrap();
        assert_eq!(volumes[0].chapters[0].title, "第一章 序");
        assert_eq!(volumes[0].chapters[0].content, vec!["一", "二"]);
    }

    #[test]
    fn test_parse_reader_drops_leading_bom() {
        let input = "\u{feff}第一卷 风起\n第一章 序\n正文".as_bytes();
        let volumes = parse_reader(input).unwrap();
        assert_eq!(
            outline(&volumes),
            vec![(
                "第一卷 风起".to_string(),
                vec![("第一章 序".to_string(), vec!["正文".to_string()])]
            )]
        );
    }

    #[test]
    fn test_parse_str_drops_leading_bom_only() {
        let volumes = parse_str("\u{feff}第一章 序\n\u{feff}正文");
        assert_eq!(volumes[0].chapters[0].title, "第一章 序");
        // Only the mark at the very start of the input is a BOM.
        assert_eq!(volumes[0].chapters[0].content, vec!["\u{feff}正文"]);
    }

    fn line_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("  ".to_string()),
            "第[一二三]卷( [甲乙丙])?",
            "第[0-9]{1,3}[章回节]( [甲乙丙])?",
            "第[一二]卷 第[一二]章",
            "[a-z甲乙丙丁，。]{1,8}",
        ]
    }

    proptest! {
        #[test]
        fn prop_content_lines_are_never_lost(
            lines in prop::collection::vec(line_strategy(), 0..40),
            newline in prop::sample::select(vec!["\n", "\r\n", "\r"]),
        ) {
            let volumes = parse_str(&lines.join(newline));
            let expected: Vec<String> = lines
                .iter()
                .map(|l| l.trim())
                .filter(|l| matches!(classify_line(l), LineKind::Content(_)))
                .map(str::to_string)
                .collect();
            prop_assert_eq!(all_content(&volumes), expected);
        }

        #[test]
        fn prop_pruning_is_idempotent(lines in prop::collection::vec(line_strategy(), 0..40)) {
            let mut builder = StructureBuilder::new();
            for line in &lines {
                builder.push_line(line);
            }
            let mut hierarchy = builder.finish_hierarchy();
            let once = hierarchy.clone();
            hierarchy.prune_trailing_placeholders();
            prop_assert_eq!(hierarchy, once);
        }

        #[test]
        fn prop_hierarchy_is_never_empty(lines in prop::collection::vec(line_strategy(), 0..40)) {
            let volumes = parse_str(&lines.join("\n"));
            prop_assert!(!volumes.is_empty());
            // Only the trailing seed, or real volumes that never saw a
            // chapter, may be chapterless.
            for (i, volume) in volumes.iter().enumerate() {
                if volume.chapters.is_empty() && volume.is_placeholder() {
                    prop_assert_eq!(volumes.len(), 1);
                    prop_assert_eq!(i, 0);
                }
            }
        }

        #[test]
        fn prop_volume_markers_open_volumes(n in 1usize..6) {
            let input: Vec<String> = (1..=n)
                .map(|i| format!("第{i}卷\n第{i}章\n正文{i}"))
                .collect();
            let volumes = parse_str(&input.join("\n"));
            prop_assert_eq!(volumes.len(), n);
            for (i, volume) in volumes.iter().enumerate() {
                prop_assert_eq!(&volume.title, &format!("第{}卷", i + 1));
                prop_assert_eq!(volume.chapters.len(), 1);
            }
        }
    }
}
