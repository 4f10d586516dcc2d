//! Line classification for plain-text novels.
//!
//! A structural marker is a line that starts with `第` or `卷`, then a numeral
//! (Arabic digits or Chinese numeral characters), then a unit character such
//! as `章` or `卷`. Everything after the unit is free-form title text.

use std::sync::OnceLock;

use regex::Regex;

/// What a single input line means to the structure builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty after trimming; skipped.
    Blank,
    /// Opens a new volume; carries the whole trimmed line as its title.
    Volume(&'a str),
    /// Opens a new chapter; carries the whole trimmed line as its title.
    Chapter(&'a str),
    /// Prose, trimmed at both ends.
    Content(&'a str),
}

/// Unit character that marks a volume title.
const VOLUME_UNIT: char = '卷';

/// Unit characters that force a chapter reading even when `卷` is present.
const CHAPTER_UNITS: [char; 3] = ['章', '回', '节'];

fn title_pattern() -> &'static Regex {
    static TITLE_REGEX: OnceLock<Regex> = OnceLock::new();
    TITLE_REGEX.get_or_init(|| {
        Regex::new(r"^[\s\u{3000}]*[第卷][0-9零〇一二三四五六七八九十百千两]+[章回部节集卷篇辑]")
            .expect("Invalid title regex")
    })
}

/// Whether `line` starts with a volume/chapter marker.
pub fn is_structural_marker(line: &str) -> bool {
    title_pattern().is_match(line)
}

/// Volume unless the title mentions any chapter unit.
fn is_volume_title(title: &str) -> bool {
    title.contains(VOLUME_UNIT) && !title.contains(CHAPTER_UNITS)
}

/// Classify one raw line.
///
/// Leading and trailing whitespace (including the full-width space U+3000)
/// is trimmed; internal whitespace is kept.
pub fn classify_line(raw: &str) -> LineKind<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return LineKind::Blank;
    }

    if !is_structural_marker(line) {
        return LineKind::Content(line);
    }

    if is_volume_title(line) {
        LineKind::Volume(line)
    } else {
        LineKind::Chapter(line)
    }
}
