//! Shared fixtures for the integration tests: an in-memory chapter
//! source that counts stream opens, and a fixed-width measurer that
//! makes page arithmetic predictable.
#![allow(dead_code)]

use eyre::Result;
use folio::loader::PageLoader;
use folio::measure::{FontKind, TextMeasurer};
use folio::models::Chapter;
use folio::settings::Settings;
use folio::source::ChapterSource;
use std::io::{BufRead, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub enum ChapterData {
    Text(String),
    /// `has_data` reports false; the host is expected to fetch it.
    Missing,
    /// `has_data` reports true but the stream fails to open.
    Broken,
}

pub struct MockSource {
    chapters: Mutex<Vec<ChapterData>>,
    opens: AtomicUsize,
}

impl MockSource {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            chapters: Mutex::new(
                texts
                    .iter()
                    .map(|text| ChapterData::Text(text.to_string()))
                    .collect(),
            ),
            opens: AtomicUsize::new(0),
        }
    }

    pub fn with(data: Vec<ChapterData>) -> Self {
        Self {
            chapters: Mutex::new(data),
            opens: AtomicUsize::new(0),
        }
    }

    /// Chapter catalog matching this source, titled "Chapter N".
    pub fn catalog(&self) -> Vec<Chapter> {
        let chapters = self.chapters.lock().unwrap();
        (0..chapters.len())
            .map(|index| Chapter::new(index, format!("Chapter {}", index), index.to_string()))
            .collect()
    }

    /// How many times a chapter stream was opened (layout call count).
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Replace a chapter's data, e.g. after the host "fetched" it.
    pub fn set_text(&self, index: usize, text: &str) {
        self.chapters.lock().unwrap()[index] = ChapterData::Text(text.to_string());
    }
}

impl ChapterSource for MockSource {
    fn has_data(&self, chapter: &Chapter) -> bool {
        if !chapter.has_data {
            return false;
        }
        let chapters = self.chapters.lock().unwrap();
        !matches!(chapters.get(chapter.index), Some(ChapterData::Missing) | None)
    }

    fn open_reader(&self, chapter: &Chapter) -> Result<Box<dyn BufRead + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let chapters = self.chapters.lock().unwrap();
        match chapters.get(chapter.index) {
            Some(ChapterData::Text(text)) => {
                Ok(Box::new(Cursor::new(text.clone().into_bytes())))
            }
            Some(ChapterData::Broken) => Err(eyre::eyre!("stream open failed")),
            _ => Err(eyre::eyre!("no data")),
        }
    }
}

/// Every char is `width` px wide; the `\n` marker is free.
pub struct FixedMeasurer {
    pub width: u32,
}

impl TextMeasurer for FixedMeasurer {
    fn fit(&self, text: &str, _font: FontKind, _size: u32, max_width: u32) -> usize {
        let mut used = 0;
        let mut count = 0;
        for c in text.chars() {
            let w = if c == '\n' { 0 } else { self.width };
            if used + w > max_width {
                break;
            }
            used += w;
            count += 1;
        }
        count
    }
}

/// Settings with zero margins so the display size is the visible size.
pub fn bare_settings() -> Settings {
    Settings {
        text_size: 10,
        margin_width: 0,
        margin_height: 0,
        ..Settings::default()
    }
}

/// A loader over `source`, catalog refreshed and chapter 0 opened on a
/// 100x200 display.
pub fn open_loader(source: Arc<MockSource>) -> PageLoader {
    let catalog = source.catalog();
    let mut loader = PageLoader::new(
        "/books/test",
        source,
        Arc::new(FixedMeasurer { width: 10 }),
        &bare_settings(),
    );
    loader.refresh_catalog(catalog);
    loader.prepare_display(100, 200);
    loader.open_chapter();
    loader
}

/// Block until the prefetched next chapter has merged.
pub fn wait_next_ready(loader: &mut PageLoader) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        loader.poll_background();
        if loader.is_next_ready() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("prefetch never completed");
}

/// A body paragraph long enough to wrap across several pages at the
/// fixture geometry (10 px chars, 100 px wide, 200 px tall).
pub fn long_chapter() -> String {
    "the quick brown fox jumps over the lazy dog again and again\n".repeat(12)
}

pub fn short_chapter() -> String {
    "just a line\n".to_string()
}
