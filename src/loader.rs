//! The page loader façade: owns the catalog, the three-slot window, the
//! prefetcher and the layout metrics, and exposes the navigation
//! operations and queries the host UI drives. All state mutation
//! happens on the caller's thread; the background worker only ever
//! hands results back through the prefetcher's channel.

use crate::layout;
use crate::logging;
use crate::measure::TextMeasurer;
use crate::models::{
    Chapter, LayoutMetrics, LoadError, Page, PageEvent, PageStatus, ReadRecord,
};
use crate::prefetch::Prefetcher;
use crate::settings::{PageMode, Settings};
use crate::source::ChapterSource;
use crate::state::State;
use crate::window::ChapterWindow;
use eyre::Result;
use std::sync::Arc;

pub type EventHandler = Box<dyn FnMut(PageEvent)>;

pub struct PageLoader {
    book_id: String,
    source: Arc<dyn ChapterSource>,
    measurer: Arc<dyn TextMeasurer>,
    chapters: Vec<Chapter>,
    window: ChapterWindow,
    prefetcher: Prefetcher,
    metrics: LayoutMetrics,
    settings: Settings,
    record: ReadRecord,
    catalog_ready: bool,
    display_ready: bool,
    chapter_open: bool,
    first_open: bool,
    closed: bool,
    on_event: Option<EventHandler>,
}

impl PageLoader {
    pub fn new(
        book_id: impl Into<String>,
        source: Arc<dyn ChapterSource>,
        measurer: Arc<dyn TextMeasurer>,
        settings: &Settings,
    ) -> Self {
        let metrics = LayoutMetrics::new(
            settings.text_size,
            settings.margin_width,
            settings.margin_height,
        );
        Self {
            book_id: book_id.into(),
            source,
            measurer,
            chapters: Vec::new(),
            window: ChapterWindow::new(),
            prefetcher: Prefetcher::new(),
            metrics,
            settings: settings.clone(),
            record: ReadRecord::default(),
            catalog_ready: false,
            display_ready: false,
            chapter_open: false,
            first_open: true,
            closed: false,
            on_event: None,
        }
    }

    /// Install the host's event sink. Events fire synchronously from
    /// within the operation that caused them.
    pub fn set_event_handler(&mut self, handler: EventHandler) {
        self.on_event = Some(handler);
    }

    fn emit(&mut self, event: PageEvent) {
        if let Some(handler) = self.on_event.as_mut() {
            handler(event);
        }
    }

    fn chapter_changed(&mut self) {
        let index = self.window.chapter_index();
        let count = self.window.page_count();
        self.emit(PageEvent::ChapterChanged(index));
        self.emit(PageEvent::PageCountChanged(count));
    }

    /*************************** book lifecycle ***************************/

    /// Load the stored reading position before the first open.
    pub fn prepare_book(&mut self, state: &State) -> Result<()> {
        self.record = state.load_record(&self.book_id)?;
        self.window.jump_to(self.record.chapter);
        Ok(())
    }

    /// Persist the displayed position.
    pub fn save_record(&self, state: &State) -> Result<()> {
        if self.chapters.is_empty() {
            return Ok(());
        }
        let record = ReadRecord {
            chapter: self.window.chapter_index(),
            page: self.window.pos(),
        };
        state.save_record(&self.book_id, &record)
    }

    /// Replace the chapter catalog wholesale.
    pub fn refresh_catalog(&mut self, chapters: Vec<Chapter>) {
        if self.closed {
            return;
        }
        self.chapters = chapters;
        self.catalog_ready = true;
        self.emit(PageEvent::CatalogReady(self.chapters.clone()));

        let missing: Vec<usize> = self
            .chapters
            .iter()
            .filter(|chapter| !self.source.has_data(chapter))
            .map(|chapter| chapter.index)
            .collect();
        if !missing.is_empty() {
            self.emit(PageEvent::RequestMissingChapters(missing));
        }
    }

    /// Tear the window down; every later operation is a no-op.
    pub fn close(&mut self) {
        self.prefetcher.cancel();
        self.window.clear_all();
        self.window.set_status(PageStatus::Loading);
        self.chapters.clear();
        self.catalog_ready = false;
        self.chapter_open = false;
        self.closed = true;
    }

    /*************************** queries ***************************/

    pub fn status(&self) -> PageStatus {
        self.window.status()
    }

    pub fn chapter_pos(&self) -> usize {
        self.window.chapter_index()
    }

    pub fn page_pos(&self) -> usize {
        self.window.pos()
    }

    pub fn page_count(&self) -> usize {
        self.window.page_count()
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.window.page()
    }

    pub fn current_pages(&self) -> Option<&[Page]> {
        self.window.current()
    }

    pub fn catalog(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn is_close(&self) -> bool {
        self.closed
    }

    pub fn is_chapter_open(&self) -> bool {
        self.chapter_open
    }

    /// Whether the following chapter's page list is already cached, so
    /// a forward transition will not lay out synchronously.
    pub fn is_next_ready(&self) -> bool {
        self.window.next_cached()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    /*************************** display & settings ***************************/

    /// The host reports its drawable size. Until this runs, nothing can
    /// be laid out; afterwards a pending open is replayed, or the
    /// current chapter reflows.
    pub fn prepare_display(&mut self, width: u32, height: u32) {
        if self.closed {
            return;
        }
        self.metrics.prepare_display(width, height);
        self.display_ready = true;
        self.invalidate_cached_layouts();

        if !self.chapter_open {
            if !self.first_open {
                self.open_chapter();
            }
        } else if self.window.status() == PageStatus::Finished {
            self.reflow_current();
        }
    }

    /// Change the body font size; all cached page lists are invalid.
    pub fn set_text_size(&mut self, text_size: u32) {
        if self.closed {
            return;
        }
        self.settings.text_size = text_size;
        self.metrics.set_text_size(text_size);
        self.invalidate_cached_layouts();

        if self.catalog_ready && self.window.status() == PageStatus::Finished {
            self.reflow_current();
        }
    }

    /// Change the page margins; same invalidation as a font change.
    pub fn set_margin(&mut self, margin_width: u32, margin_height: u32) {
        if self.closed {
            return;
        }
        self.settings.margin_width = margin_width;
        self.settings.margin_height = margin_height;
        self.metrics.set_margin(margin_width, margin_height);
        self.invalidate_cached_layouts();

        if self.catalog_ready && self.window.status() == PageStatus::Finished {
            self.reflow_current();
        }
    }

    pub fn set_page_mode(&mut self, page_mode: PageMode) {
        self.settings.page_mode = page_mode;
    }

    pub fn set_night_mode(&mut self, night_mode: bool) {
        self.settings.night_mode = night_mode;
    }

    /// Page boundaries moved under the reader: drop the side caches,
    /// discard any in-flight prefetch and lay the current chapter out
    /// again, keeping the displayed ordinal in range.
    fn invalidate_cached_layouts(&mut self) {
        self.window.clear_sides();
        self.prefetcher.cancel();
    }

    fn reflow_current(&mut self) {
        let pos = self.window.pos();
        self.load_current(self.window.chapter_index());
        let landed = self.window.set_pos(pos);
        self.window.mark_cancel_point();
        self.emit(PageEvent::PageChanged(landed));
    }

    /*************************** opening ***************************/

    /// Open the current chapter, landing on the stored position the
    /// first time and on page 0 afterwards.
    pub fn open_chapter(&mut self) {
        if self.closed {
            return;
        }
        self.first_open = false;
        if !self.display_ready {
            return;
        }
        if !self.catalog_ready {
            self.window.set_status(PageStatus::Loading);
            return;
        }
        if self.chapters.is_empty() {
            self.window.set_status(PageStatus::CategoryEmpty);
            return;
        }

        if self.parse_cur_chapter() {
            let pos = if self.chapter_open {
                0
            } else {
                self.chapter_open = true;
                self.record.page
            };
            let landed = self.window.set_pos(pos);
            self.window.mark_cancel_point();
            self.emit(PageEvent::PageChanged(landed));
        }
    }

    /// Jump straight to a chapter: side caches cannot be trusted and
    /// the prefetch is stale by definition.
    pub fn skip_to_chapter(&mut self, index: usize) {
        if self.closed {
            return;
        }
        self.window.jump_to(index);
        self.window.clear_sides();
        self.prefetcher.cancel();
        self.open_chapter();
    }

    /// Move the pointer within the current chapter.
    pub fn skip_to_page(&mut self, pos: usize) -> bool {
        if self.closed || !self.catalog_ready || !self.window.has_current() {
            return false;
        }
        let landed = self.window.set_pos(pos);
        self.window.mark_cancel_point();
        self.emit(PageEvent::PageChanged(landed));
        true
    }

    /*************************** page turning ***************************/

    /// Turn to the next page, crossing into the next chapter at the
    /// boundary. Returns false when there is nowhere to go.
    pub fn next_page(&mut self) -> bool {
        if self.closed || !self.can_turn_page() {
            return false;
        }
        self.poll_background();

        if self.window.status() == PageStatus::Finished {
            let pos = self.window.pos();
            if pos + 1 < self.window.page_count() {
                self.window.mark_cancel_point();
                let landed = self.window.set_pos(pos + 1);
                self.emit(PageEvent::PageChanged(landed));
                return true;
            }
        }

        if !self.has_next_chapter() {
            return false;
        }

        self.window.mark_cancel_point();
        if self.parse_next_chapter() {
            let landed = self.window.set_pos(0);
            self.emit(PageEvent::PageChanged(landed));
        }
        true
    }

    /// Turn to the previous page, crossing into the previous chapter at
    /// the boundary, landing on its last page.
    pub fn prev_page(&mut self) -> bool {
        if self.closed || !self.can_turn_page() {
            return false;
        }
        self.poll_background();

        if self.window.status() == PageStatus::Finished {
            let pos = self.window.pos();
            if pos > 0 {
                self.window.mark_cancel_point();
                let landed = self.window.set_pos(pos - 1);
                self.emit(PageEvent::PageChanged(landed));
                return true;
            }
        }

        if !self.has_prev_chapter() {
            return false;
        }

        self.window.mark_cancel_point();
        if self.parse_prev_chapter() {
            let last = self.window.page_count().saturating_sub(1);
            let landed = self.window.set_pos(last);
            self.emit(PageEvent::PageChanged(landed));
        }
        true
    }

    /// Jump to the next chapter's first page.
    pub fn skip_next_chapter(&mut self) -> bool {
        if self.closed || !self.has_next_chapter() {
            return false;
        }
        self.poll_background();
        if self.parse_next_chapter() {
            let landed = self.window.set_pos(0);
            self.window.mark_cancel_point();
            self.emit(PageEvent::PageChanged(landed));
        }
        true
    }

    /// Jump to the previous chapter's first page.
    pub fn skip_prev_chapter(&mut self) -> bool {
        if self.closed || !self.has_prev_chapter() {
            return false;
        }
        self.poll_background();
        if self.parse_prev_chapter() {
            let landed = self.window.set_pos(0);
            self.window.mark_cancel_point();
            self.emit(PageEvent::PageChanged(landed));
        }
        true
    }

    /// The host aborted a page turn that was already applied
    /// speculatively. Which of the three undo shapes applies is decided
    /// by the displayed ordinal and the two chapter indices.
    pub fn page_cancel(&mut self) {
        if self.closed {
            return;
        }
        self.poll_background();

        let pos = self.window.pos();
        let count = self.window.page_count();
        let advanced = self.window.chapter_index() > self.window.last_chapter_index();
        let receded = self.window.chapter_index() < self.window.last_chapter_index();

        if pos == 0 && advanced {
            // A forward chapter transition is being abandoned.
            if self.window.prev_cached() {
                let landed = self.window.undo_forward();
                self.chapter_changed();
                self.emit(PageEvent::PageChanged(landed));
            } else if self.parse_prev_chapter() {
                let last = self.window.page_count().saturating_sub(1);
                let landed = self.window.set_pos(last);
                self.emit(PageEvent::PageChanged(landed));
            }
        } else if !self.window.has_current() || (count > 0 && pos == count - 1 && receded) {
            // A backward chapter transition is being abandoned.
            if self.window.next_cached() {
                let landed = self.window.undo_backward();
                self.chapter_changed();
                self.emit(PageEvent::PageChanged(landed));
            } else if self.parse_next_chapter() {
                let landed = self.window.set_pos(0);
                self.emit(PageEvent::PageChanged(landed));
            }
        } else {
            // A plain page turn: put the cancel point back.
            let landed = self.window.restore_cancel_point();
            self.emit(PageEvent::PageChanged(landed));
        }
    }

    /// Merge any finished background layout into the next slot. Safe to
    /// call from an idle tick; navigation operations call it themselves.
    pub fn poll_background(&mut self) {
        if self.closed {
            return;
        }
        let expected = self.window.chapter_index() + 1;
        if let Some(pages) = self.prefetcher.poll(expected)
            && !self.window.next_cached()
        {
            self.window.set_next(pages);
        }
    }

    /*************************** transitions ***************************/

    fn has_next_chapter(&self) -> bool {
        self.window.chapter_index() + 1 < self.chapters.len()
    }

    fn has_prev_chapter(&self) -> bool {
        self.window.chapter_index() > 0
    }

    /// Turning is refused mid-parse; a failed chapter drops back to
    /// `Loading` so the host's repeat acts as the retry.
    fn can_turn_page(&mut self) -> bool {
        if !self.catalog_ready {
            return false;
        }
        match self.window.status() {
            PageStatus::Parsing | PageStatus::ParseError => false,
            PageStatus::Error => {
                self.window.set_status(PageStatus::Loading);
                true
            }
            _ => true,
        }
    }

    fn parse_cur_chapter(&mut self) -> bool {
        self.load_current(self.window.chapter_index());
        self.preload_next_chapter();
        self.window.has_current()
    }

    fn parse_next_chapter(&mut self) -> bool {
        let hit = self.window.shift_forward();
        if hit {
            self.window.set_status(PageStatus::Finished);
            self.chapter_changed();
        } else {
            self.load_current(self.window.chapter_index());
        }
        self.preload_next_chapter();
        self.window.has_current()
    }

    fn parse_prev_chapter(&mut self) -> bool {
        let hit = self.window.shift_backward();
        if hit {
            self.window.set_status(PageStatus::Finished);
            self.chapter_changed();
        } else {
            self.load_current(self.window.chapter_index());
        }
        self.window.has_current()
    }

    /// Lay out `index` into the current slot and settle the status.
    fn load_current(&mut self, index: usize) {
        match self.chapters.get(index) {
            Some(chapter) => {
                let chapter = chapter.clone();
                match layout::layout_chapter(
                    self.source.as_ref(),
                    self.measurer.as_ref(),
                    &self.metrics,
                    &chapter,
                ) {
                    Ok(pages) if pages.is_empty() => {
                        // Keep something displayable on screen.
                        self.window.set_status(PageStatus::Empty);
                        self.window.set_current(Some(vec![Page::blank(&chapter.title)]));
                    }
                    Ok(pages) => {
                        self.window.set_status(PageStatus::Finished);
                        self.window.set_current(Some(pages));
                    }
                    Err(LoadError::ChapterMissing(missing)) => {
                        // Not an error: the host fetches and re-opens.
                        self.window.set_current(None);
                        self.window.set_status(PageStatus::Loading);
                        self.emit(PageEvent::RequestMissingChapters(vec![missing]));
                    }
                    Err(err) => {
                        logging::error(format!("chapter {} layout failed: {}", index, err));
                        self.window.set_current(None);
                        self.window.set_status(PageStatus::Error);
                    }
                }
            }
            None => {
                self.window.set_current(None);
                self.window.set_status(PageStatus::Error);
            }
        }
        self.chapter_changed();
    }

    /// Kick off the background layout of the chapter after the current
    /// one, superseding whatever was scheduled before.
    fn preload_next_chapter(&mut self) {
        let next = self.window.chapter_index() + 1;
        let Some(chapter) = self.chapters.get(next) else {
            return;
        };
        if !self.source.has_data(chapter) {
            return;
        }
        if self.window.next_cached() {
            return;
        }
        self.prefetcher.schedule(
            Arc::clone(&self.source),
            Arc::clone(&self.measurer),
            self.metrics.clone(),
            chapter.clone(),
        );
    }
}
