//! Speculative background layout of the chapter after the one being
//! read. Single-flight: scheduling a new run invalidates the previous
//! one, and a stale completion is dropped by generation and index
//! comparison rather than best-effort flags. Background failures never
//! surface as a visible error; they are logged and the slot stays
//! empty.

use crate::layout;
use crate::logging;
use crate::measure::TextMeasurer;
use crate::models::{Chapter, LayoutMetrics, LoadError, Page};
use crate::source::ChapterSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError, channel};

struct PrefetchResult {
    generation: u64,
    chapter_index: usize,
    pages: Result<Vec<Page>, LoadError>,
}

pub struct Prefetcher {
    generation: Arc<AtomicU64>,
    rx: Option<Receiver<PrefetchResult>>,
    inflight: Option<usize>,
}

impl Prefetcher {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            rx: None,
            inflight: None,
        }
    }

    /// Chapter index of the outstanding run, if any.
    pub fn inflight(&self) -> Option<usize> {
        self.inflight
    }

    /// Launch a background layout of `chapter`, cancelling whatever was
    /// outstanding. Does not block on the previous worker.
    pub fn schedule(
        &mut self,
        source: Arc<dyn ChapterSource>,
        measurer: Arc<dyn TextMeasurer>,
        metrics: LayoutMetrics,
        chapter: Chapter,
    ) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = channel();
        self.rx = Some(rx);
        self.inflight = Some(chapter.index);

        let guard = Arc::clone(&self.generation);
        std::thread::spawn(move || {
            // Cooperative cancellation: bail before the expensive part
            // and again before handing the result back.
            if guard.load(Ordering::SeqCst) != generation {
                return;
            }
            let pages = layout::layout_chapter(
                source.as_ref(),
                measurer.as_ref(),
                &metrics,
                &chapter,
            );
            if guard.load(Ordering::SeqCst) != generation {
                return;
            }
            let _ = tx.send(PrefetchResult {
                generation,
                chapter_index: chapter.index,
                pages,
            });
        });
    }

    /// Discard the outstanding run, if any. The worker is not
    /// interrupted; its result simply can never merge.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.rx = None;
        self.inflight = None;
    }

    /// Drain completed runs. A result merges only when its generation
    /// is still live and it laid out `expected_index`; everything else
    /// is dropped, errors with a log line.
    pub fn poll(&mut self, expected_index: usize) -> Option<Vec<Page>> {
        let rx = self.rx.as_ref()?;
        let live = self.generation.load(Ordering::SeqCst);
        let mut merged = None;
        let mut finished = false;
        loop {
            match rx.try_recv() {
                Ok(result) => {
                    if result.generation != live || result.chapter_index != expected_index {
                        continue;
                    }
                    match result.pages {
                        Ok(pages) => merged = Some(pages),
                        Err(err) => logging::warn(format!(
                            "background layout of chapter {} failed: {}",
                            result.chapter_index, err
                        )),
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Worker gone and channel drained: nothing further
                    // can arrive on this run.
                    finished = true;
                    break;
                }
            }
        }
        if merged.is_some() || finished {
            self.rx = None;
            self.inflight = None;
        }
        merged
    }
}

impl Default for Prefetcher {
    fn default() -> Self {
        Self::new()
    }
}
