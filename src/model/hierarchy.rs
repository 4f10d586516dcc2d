//! Volume/chapter hierarchy recovered from a plain-text document.
//!
//! The hierarchy is an append-only tree: mutations always target the last
//! volume and, within it, the last chapter. It is seeded with a placeholder
//! volume holding a placeholder chapter so there is always somewhere to put a
//! content line, and those placeholders are overwritten or pruned once real
//! structure shows up.

/// Title given to a volume that was synthesized rather than read.
pub const DEFAULT_VOLUME_TITLE: &str = "默认卷";

/// Title given to a chapter that was synthesized rather than read.
pub const DEFAULT_CHAPTER_TITLE: &str = "开篇";

/// Whether a node's title came from the document or was synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Created to keep the tree well-formed; carries a default title.
    Placeholder,
    /// Titled from the input (or by an explicit caller).
    #[default]
    Real,
}

/// Second-level unit: a titled run of content lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Chapter {
    pub title: String,
    pub content: Vec<String>,
    #[cfg_attr(feature = "cli", serde(skip))]
    origin: Origin,
}

/// Top-level unit: a titled run of chapters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Volume {
    pub title: String,
    pub chapters: Vec<Chapter>,
    #[cfg_attr(feature = "cli", serde(skip))]
    origin: Origin,
}

impl Chapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: Vec::new(),
            origin: Origin::Real,
        }
    }

    pub fn with_content(mut self, content: Vec<String>) -> Self {
        self.content = content;
        self
    }

    fn placeholder() -> Self {
        Self {
            title: DEFAULT_CHAPTER_TITLE.to_string(),
            content: Vec::new(),
            origin: Origin::Placeholder,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == Origin::Placeholder
    }

    /// A synthesized chapter that never received a line.
    fn is_vacant(&self) -> bool {
        self.is_placeholder() && self.content.is_empty()
    }
}

impl Volume {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            chapters: Vec::new(),
            origin: Origin::Real,
        }
    }

    pub fn with_chapter(mut self, chapter: Chapter) -> Self {
        self.chapters.push(chapter);
        self
    }

    fn placeholder() -> Self {
        Self {
            title: DEFAULT_VOLUME_TITLE.to_string(),
            chapters: vec![Chapter::placeholder()],
            origin: Origin::Placeholder,
        }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == Origin::Placeholder
    }

    /// Number of content lines across all chapters.
    pub fn content_line_count(&self) -> usize {
        self.chapters.iter().map(|c| c.content.len()).sum()
    }
}

/// The ordered sequence of volumes built up while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    volumes: Vec<Volume>,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl Hierarchy {
    /// Create a hierarchy seeded with one placeholder volume and chapter.
    pub fn new() -> Self {
        log::debug!("hierarchy seeded with default volume and chapter");
        Self {
            volumes: vec![Volume::placeholder()],
        }
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn into_volumes(self) -> Vec<Volume> {
        self.volumes
    }

    pub fn last_volume(&self) -> Option<&Volume> {
        self.volumes.last()
    }

    pub fn chapter_count(&self) -> usize {
        self.volumes.iter().map(|v| v.chapters.len()).sum()
    }

    pub fn content_line_count(&self) -> usize {
        self.volumes.iter().map(Volume::content_line_count).sum()
    }

    /// Iterate `(volume, chapter)` pairs in hierarchy traversal order.
    pub fn chapters(&self) -> impl Iterator<Item = (&Volume, &Chapter)> {
        self.volumes
            .iter()
            .flat_map(|v| v.chapters.iter().map(move |c| (v, c)))
    }

    /// Nothing real has been observed yet: a lone placeholder volume whose
    /// chapters (if any) are vacant placeholders.
    fn is_pristine(&self) -> bool {
        match self.volumes.as_slice() {
            [only] => {
                only.is_placeholder()
                    && only.chapters.len() <= 1
                    && only.chapters.iter().all(Chapter::is_vacant)
            }
            _ => false,
        }
    }

    /// The tail volume, recreating the seed if the tree was somehow emptied.
    fn tail(&mut self) -> &mut Volume {
        if self.volumes.is_empty() {
            log::warn!("hierarchy had no volumes; recreating default structure");
            self.volumes.push(Volume::placeholder());
        }
        let last = self.volumes.len() - 1;
        &mut self.volumes[last]
    }

    /// Open a new volume.
    ///
    /// While the hierarchy is still pristine the seed volume is renamed in
    /// place, so a leading volume marker does not leave an empty default
    /// volume behind.
    pub fn add_volume(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self.is_pristine() {
            let volume = self.tail();
            volume.title = title;
            volume.origin = Origin::Real;
            log::info!("renamed default volume to: {}", volume.title);
            return;
        }

        if let Some(previous) = self.volumes.last()
            && previous.chapters.is_empty()
        {
            log::warn!(
                "adding volume '{}' but previous volume '{}' has no chapters",
                title,
                previous.title
            );
        }
        log::info!("added volume: {title}");
        self.volumes.push(Volume::new(title));
    }

    /// Open a new chapter in the last volume.
    ///
    /// A vacant placeholder chapter at the tail is overwritten instead of
    /// being left behind.
    pub fn add_chapter(&mut self, title: impl Into<String>, content: Option<Vec<String>>) {
        let chapter = Chapter::new(title).with_content(content.unwrap_or_default());
        let volume = self.tail();

        if volume.chapters.last().is_some_and(Chapter::is_vacant) {
            volume.chapters.pop();
            log::info!(
                "replaced default chapter in volume '{}' with: {}",
                volume.title,
                chapter.title
            );
        } else if volume.chapters.is_empty() {
            log::info!("added first chapter '{}' to volume '{}'", chapter.title, volume.title);
        } else {
            log::info!("appended chapter '{}' to volume '{}'", chapter.title, volume.title);
        }
        volume.chapters.push(chapter);
    }

    /// Append a content line to the last chapter of the last volume.
    pub fn append_content_line(&mut self, line: impl Into<String>) {
        let volume = self.tail();
        if volume.chapters.is_empty() {
            log::warn!(
                "volume '{}' had no chapters when adding content; adding default chapter '{}'",
                volume.title,
                DEFAULT_CHAPTER_TITLE
            );
            volume.chapters.push(Chapter::placeholder());
        }
        if let Some(chapter) = volume.chapters.last_mut() {
            chapter.content.push(line.into());
        }
    }

    /// Drop the last volume's last chapter if it holds no content.
    ///
    /// Returns the removed chapter.
    pub fn remove_trailing_empty_chapter(&mut self) -> Option<Chapter> {
        let volume = self.volumes.last_mut()?;
        if volume.chapters.last()?.content.is_empty() {
            let removed = volume.chapters.pop();
            if let Some(ref chapter) = removed {
                log::info!("removed empty chapter '{}' before adding new volume", chapter.title);
            }
            return removed;
        }
        None
    }

    /// Remove a trailing vacant placeholder chapter, then the trailing
    /// placeholder volume if that left it empty and it is not the only one.
    pub fn prune_trailing_placeholders(&mut self) {
        let count = self.volumes.len();
        let Some(volume) = self.volumes.last_mut() else {
            return;
        };

        if volume.chapters.last().is_some_and(Chapter::is_vacant) {
            volume.chapters.pop();
            log::info!("removed trailing empty default chapter");
        }

        if volume.chapters.is_empty() && volume.is_placeholder() && count > 1 {
            self.volumes.pop();
            log::info!("removed trailing empty default volume");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(h: &Hierarchy) -> Vec<(&str, Vec<&str>)> {
        h.volumes()
            .iter()
            .map(|v| {
                (
                    v.title.as_str(),
                    v.chapters.iter().map(|c| c.title.as_str()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_new_is_seeded() {
        let h = Hierarchy::new();
        assert_eq!(titles(&h), vec![(DEFAULT_VOLUME_TITLE, vec![DEFAULT_CHAPTER_TITLE])]);
        assert!(h.volumes()[0].is_placeholder());
        assert!(h.volumes()[0].chapters[0].is_placeholder());
    }

    #[test]
    fn test_add_volume_renames_seed() {
        let mut h = Hierarchy::new();
        h.add_volume("第一卷");
        assert_eq!(h.volumes().len(), 1);
        assert_eq!(h.volumes()[0].title, "第一卷");
        assert_eq!(h.volumes()[0].origin(), Origin::Real);
        // The seed chapter is still there, waiting to be replaced.
        assert!(h.volumes()[0].chapters[0].is_placeholder());
    }

    #[test]
    fn test_add_volume_renames_seed_without_chapter() {
        let mut h = Hierarchy::new();
        h.remove_trailing_empty_chapter();
        h.add_volume("第一卷");
        assert_eq!(titles(&h), vec![("第一卷", vec![])]);
    }

    #[test]
    fn test_add_volume_appends_after_content() {
        let mut h = Hierarchy::new();
        h.append_content_line("楔子");
        h.add_volume("第一卷");
        assert_eq!(
            titles(&h),
            vec![(DEFAULT_VOLUME_TITLE, vec![DEFAULT_CHAPTER_TITLE]), ("第一卷", vec![])]
        );
    }

    #[test]
    fn test_add_volume_appends_after_real_volume() {
        let mut h = Hierarchy::new();
        h.add_volume("第一卷");
        h.add_volume("第二卷");
        assert_eq!(h.volumes().len(), 2);
        assert_eq!(h.volumes()[1].title, "第二卷");
        assert!(h.volumes()[1].chapters.is_empty());
    }

    #[test]
    fn test_add_chapter_replaces_vacant_placeholder() {
        let mut h = Hierarchy::new();
        h.add_chapter("第一章", None);
        assert_eq!(titles(&h), vec![(DEFAULT_VOLUME_TITLE, vec!["第一章"])]);
        assert!(!h.volumes()[0].chapters[0].is_placeholder());
    }

    #[test]
    fn test_add_chapter_keeps_placeholder_with_content() {
        let mut h = Hierarchy::new();
        h.append_content_line("前言");
        h.add_chapter("第一章", None);
        assert_eq!(
            titles(&h),
            vec![(DEFAULT_VOLUME_TITLE, vec![DEFAULT_CHAPTER_TITLE, "第一章"])]
        );
    }

    #[test]
    fn test_add_chapter_with_content() {
        let mut h = Hierarchy::new();
        h.add_chapter("第一章", Some(vec!["a".into(), "b".into()]));
        assert_eq!(h.volumes()[0].chapters[0].content, vec!["a", "b"]);
    }

    #[test]
    fn test_add_chapter_appends_after_real_chapter() {
        let mut h = Hierarchy::new();
        h.add_chapter("第一章", None);
        h.add_chapter("第二章", None);
        assert_eq!(titles(&h), vec![(DEFAULT_VOLUME_TITLE, vec!["第一章", "第二章"])]);
    }

    #[test]
    fn test_add_chapter_to_chapterless_volume() {
        let mut h = Hierarchy::new();
        h.append_content_line("x");
        h.add_volume("第一卷");
        h.add_chapter("第一章", None);
        assert_eq!(h.volumes()[1].chapters.len(), 1);
        assert_eq!(h.volumes()[1].chapters[0].title, "第一章");
    }

    #[test]
    fn test_append_content_synthesizes_chapter() {
        let mut h = Hierarchy::new();
        h.append_content_line("x");
        h.add_volume("第一卷");
        h.append_content_line("y");
        let volume = &h.volumes()[1];
        assert_eq!(volume.chapters.len(), 1);
        assert_eq!(volume.chapters[0].title, DEFAULT_CHAPTER_TITLE);
        assert!(volume.chapters[0].is_placeholder());
        assert_eq!(volume.chapters[0].content, vec!["y"]);
    }

    #[test]
    fn test_append_content_goes_to_last_chapter() {
        let mut h = Hierarchy::new();
        h.add_chapter("第一章", None);
        h.append_content_line("a");
        h.add_chapter("第二章", None);
        h.append_content_line("b");
        let chapters = &h.volumes()[0].chapters;
        assert_eq!(chapters[0].content, vec!["a"]);
        assert_eq!(chapters[1].content, vec!["b"]);
        assert_eq!(h.content_line_count(), 2);
        assert_eq!(h.chapter_count(), 2);
    }

    #[test]
    fn test_remove_trailing_empty_chapter() {
        let mut h = Hierarchy::new();
        h.add_chapter("第一章", None);
        let removed = h.remove_trailing_empty_chapter();
        assert_eq!(removed.map(|c| c.title), Some("第一章".to_string()));

        h.append_content_line("x");
        assert!(h.remove_trailing_empty_chapter().is_none());
    }

    #[test]
    fn test_prune_keeps_lone_placeholder_volume() {
        let mut h = Hierarchy::new();
        h.prune_trailing_placeholders();
        assert_eq!(titles(&h), vec![(DEFAULT_VOLUME_TITLE, vec![])]);
    }

    #[test]
    fn test_prune_removes_trailing_placeholder_volume() {
        let mut h = Hierarchy::new();
        h.add_chapter("第一章", Some(vec!["x".into()]));
        h.volumes.push(Volume::placeholder());
        h.prune_trailing_placeholders();
        assert_eq!(titles(&h), vec![(DEFAULT_VOLUME_TITLE, vec!["第一章"])]);
    }

    #[test]
    fn test_prune_keeps_real_empty_chapter() {
        let mut h = Hierarchy::new();
        h.add_chapter("第一章", None);
        h.prune_trailing_placeholders();
        assert_eq!(titles(&h), vec![(DEFAULT_VOLUME_TITLE, vec!["第一章"])]);
    }

    #[test]
    fn test_prune_ignores_real_chapter_with_default_title() {
        // Pruning keys off the origin tag, not the title text, so a real
        // chapter named like a placeholder is not mistaken for one.
        for title in [DEFAULT_CHAPTER_TITLE, DEFAULT_VOLUME_TITLE] {
            let mut h = Hierarchy::new();
            h.add_chapter("第一章", Some(vec!["x".into()]));
            h.add_chapter(title, None);
            h.prune_trailing_placeholders();
            assert_eq!(h.volumes()[0].chapters.len(), 2, "title {title}");
        }
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut h = Hierarchy::new();
        h.add_volume("第一卷");
        h.prune_trailing_placeholders();
        let once = h.clone();
        h.prune_trailing_placeholders();
        assert_eq!(h, once);
    }

    #[test]
    fn test_chapters_iterates_in_order() {
        let mut h = Hierarchy::new();
        h.add_volume("卷一");
        h.add_chapter("第一章", None);
        h.add_chapter("第二章", None);
        h.add_volume("卷二");
        h.add_chapter("第三章", None);
        let order: Vec<_> = h
            .chapters()
            .map(|(v, c)| format!("{}/{}", v.title, c.title))
            .collect();
        assert_eq!(order, vec!["卷一/第一章", "卷一/第二章", "卷二/第三章"]);
    }
}
