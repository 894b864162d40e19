use chrono::{DateTime, Utc};
use std::fmt;

/// Default distance between the page body and the screen edge, in px.
pub const DEFAULT_MARGIN_WIDTH: u32 = 15;
pub const DEFAULT_MARGIN_HEIGHT: u32 = 28;
/// Title font is the body font plus this many px.
pub const EXTRA_TITLE_SIZE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Waiting for the catalog or for chapter data to arrive.
    Loading,
    /// A structured source is being parsed (reserved, never entered).
    Parsing,
    /// The current chapter is laid out and displayable.
    Finished,
    /// A user-requested layout failed; the host may retry.
    Error,
    /// The chapter produced zero pages; a blank page is displayed.
    Empty,
    /// Structured-source parse failure (reserved, never entered).
    ParseError,
    /// The catalog holds no chapters at all.
    CategoryEmpty,
}

impl Default for PageStatus {
    fn default() -> Self {
        PageStatus::Loading
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub index: usize,
    pub title: String,
    /// Locator the chapter source understands (file name, id, url).
    pub key: String,
    /// Content may not have been downloaded yet.
    pub has_data: bool,
}

impl Chapter {
    pub fn new(index: usize, title: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            key: key.into(),
            has_data: true,
        }
    }
}

/// One screen's worth of laid-out lines, or a single embedded image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Position within the chapter, assigned at layout time.
    pub ordinal: usize,
    pub title: String,
    /// Pre-wrapped, normalized lines. Paragraph-final lines keep their
    /// trailing `\n` so renderers can apply paragraph spacing.
    pub lines: Vec<String>,
    /// Leading lines that belong to the title block.
    pub title_lines: usize,
    /// Image pages carry a src reference and no lines.
    pub image: Option<String>,
}

impl Page {
    pub fn blank(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_image(&self) -> bool {
        self.image.is_some()
    }
}

/// The visible rectangle and font spacing the layout works against.
///
/// Derived values follow the original reader conventions: line interval
/// is half the font size, paragraph spacing equals the font size, and
/// the title font is slightly larger than the body font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutMetrics {
    pub display_width: u32,
    pub display_height: u32,
    pub margin_width: u32,
    pub margin_height: u32,
    pub visible_width: u32,
    pub visible_height: u32,
    pub text_size: u32,
    pub title_size: u32,
    pub text_interval: u32,
    pub title_interval: u32,
    pub text_para: u32,
    pub title_para: u32,
}

impl LayoutMetrics {
    pub fn new(text_size: u32, margin_width: u32, margin_height: u32) -> Self {
        let mut metrics = Self {
            display_width: 0,
            display_height: 0,
            margin_width,
            margin_height,
            visible_width: 0,
            visible_height: 0,
            text_size: 0,
            title_size: 0,
            text_interval: 0,
            title_interval: 0,
            text_para: 0,
            title_para: 0,
        };
        metrics.set_text_size(text_size);
        metrics
    }

    /// Update the body font size and every value derived from it.
    pub fn set_text_size(&mut self, text_size: u32) {
        self.text_size = text_size;
        self.title_size = text_size + EXTRA_TITLE_SIZE;
        self.text_interval = self.text_size / 2;
        self.title_interval = self.title_size / 2;
        self.text_para = self.text_size;
        self.title_para = self.title_size;
    }

    pub fn set_margin(&mut self, margin_width: u32, margin_height: u32) {
        self.margin_width = margin_width;
        self.margin_height = margin_height;
        self.update_visible();
    }

    /// Record the drawable area reported by the host.
    pub fn prepare_display(&mut self, width: u32, height: u32) {
        self.display_width = width;
        self.display_height = height;
        self.update_visible();
    }

    fn update_visible(&mut self) {
        self.visible_width = self.display_width.saturating_sub(self.margin_width * 2);
        self.visible_height = self.display_height.saturating_sub(self.margin_height * 2);
    }
}

/// Persisted reading position for one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadRecord {
    pub chapter: usize,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryItem {
    pub last_read: DateTime<Utc>,
    pub book_id: String,
    pub title: Option<String>,
    pub progress: Option<f32>,
}

/// Notifications fired synchronously from within the operation that
/// caused them.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    ChapterChanged(usize),
    PageCountChanged(usize),
    PageChanged(usize),
    CatalogReady(Vec<Chapter>),
    /// The catalog references chapters with no local data; the host
    /// should fetch them and refresh.
    RequestMissingChapters(Vec<usize>),
}

#[derive(Debug)]
pub enum LoadError {
    /// The catalog holds no chapters.
    CatalogEmpty,
    /// The catalog has not been loaded yet.
    CategoryUnavailable,
    /// The data source has no content for this chapter index.
    ChapterMissing(usize),
    /// The chapter stream could not be opened or read.
    ReadFailure(String),
    /// Structured-source parse failure (reserved).
    ParseFailure,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::CatalogEmpty => write!(f, "chapter catalog is empty"),
            LoadError::CategoryUnavailable => write!(f, "chapter catalog is not loaded yet"),
            LoadError::ChapterMissing(index) => {
                write!(f, "no data for chapter {}", index)
            }
            LoadError::ReadFailure(msg) => write!(f, "chapter read failed: {}", msg),
            LoadError::ParseFailure => write!(f, "chapter parse failed"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::ReadFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_status_default() {
        assert_eq!(PageStatus::default(), PageStatus::Loading);
    }

    #[test]
    fn test_chapter_new() {
        let chapter = Chapter::new(3, "Chapter Four", "004.txt");
        assert_eq!(chapter.index, 3);
        assert_eq!(chapter.title, "Chapter Four");
        assert_eq!(chapter.key, "004.txt");
        assert!(chapter.has_data);
    }

    #[test]
    fn test_page_blank() {
        let page = Page::blank("Prologue");
        assert_eq!(page.ordinal, 0);
        assert_eq!(page.title, "Prologue");
        assert!(page.lines.is_empty());
        assert_eq!(page.title_lines, 0);
        assert!(!page.is_image());
    }

    #[test]
    fn test_page_image() {
        let page = Page {
            image: Some("cover.jpg".to_string()),
            ..Default::default()
        };
        assert!(page.is_image());
    }

    #[test]
    fn test_metrics_derived_values() {
        let metrics = LayoutMetrics::new(16, 15, 28);
        assert_eq!(metrics.text_size, 16);
        assert_eq!(metrics.title_size, 20);
        assert_eq!(metrics.text_interval, 8);
        assert_eq!(metrics.title_interval, 10);
        assert_eq!(metrics.text_para, 16);
        assert_eq!(metrics.title_para, 20);
    }

    #[test]
    fn test_metrics_prepare_display() {
        let mut metrics = LayoutMetrics::new(16, 15, 28);
        metrics.prepare_display(480, 800);
        assert_eq!(metrics.visible_width, 480 - 30);
        assert_eq!(metrics.visible_height, 800 - 56);
    }

    #[test]
    fn test_metrics_margin_change_updates_visible() {
        let mut metrics = LayoutMetrics::new(16, 15, 28);
        metrics.prepare_display(480, 800);
        metrics.set_margin(40, 40);
        assert_eq!(metrics.visible_width, 480 - 80);
        assert_eq!(metrics.visible_height, 800 - 80);
    }

    #[test]
    fn test_metrics_visible_saturates() {
        let mut metrics = LayoutMetrics::new(16, 300, 500);
        metrics.prepare_display(100, 100);
        assert_eq!(metrics.visible_width, 0);
        assert_eq!(metrics.visible_height, 0);
    }

    #[test]
    fn test_metrics_set_text_size_rederives() {
        let mut metrics = LayoutMetrics::new(16, 15, 28);
        metrics.set_text_size(24);
        assert_eq!(metrics.title_size, 28);
        assert_eq!(metrics.text_interval, 12);
        assert_eq!(metrics.text_para, 24);
    }

    #[test]
    fn test_read_record_default() {
        let record = ReadRecord::default();
        assert_eq!(record.chapter, 0);
        assert_eq!(record.page, 0);
    }

    #[test]
    fn test_load_error_display() {
        assert_eq!(
            LoadError::ChapterMissing(7).to_string(),
            "no data for chapter 7"
        );
        assert_eq!(
            LoadError::CatalogEmpty.to_string(),
            "chapter catalog is empty"
        );
        let err: LoadError = std::io::Error::other("boom").into();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_page_event_equality() {
        assert_eq!(PageEvent::PageChanged(2), PageEvent::PageChanged(2));
        assert_ne!(PageEvent::PageChanged(2), PageEvent::PageCountChanged(2));
    }
}
