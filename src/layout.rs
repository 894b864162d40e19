//! The layout engine: one chapter's text stream in, an ordered list of
//! fixed-size pages out. Greedy single pass over the text with a running
//! vertical budget, so pagination is deterministic and restartable for
//! unchanged text and metrics, which is what makes the window cache
//! valid.

use crate::measure::{FontKind, TextMeasurer};
use crate::models::{Chapter, LayoutMetrics, LoadError, Page};
use crate::parser;
use crate::source::ChapterSource;
use std::io::BufRead;

/// Lay out a chapter from its source. Missing data and stream errors
/// surface as [`LoadError`]; the pagination itself cannot fail.
pub fn layout_chapter(
    source: &dyn ChapterSource,
    measurer: &dyn TextMeasurer,
    metrics: &LayoutMetrics,
    chapter: &Chapter,
) -> Result<Vec<Page>, LoadError> {
    if !source.has_data(chapter) {
        return Err(LoadError::ChapterMissing(chapter.index));
    }
    let reader = source
        .open_reader(chapter)
        .map_err(|err| LoadError::ReadFailure(err.to_string()))?;
    paginate(chapter, reader, metrics, measurer)
}

/// Paginate a chapter's stream against the visible rectangle.
///
/// The chapter title is the first paragraph, laid out with title
/// metrics; every following line of the stream is one body paragraph.
/// Whitespace-only paragraphs vanish. Embedded image references are
/// collected from the raw text and appended as image-only pages, one
/// per distinct reference in discovery order.
pub fn paginate(
    chapter: &Chapter,
    reader: Box<dyn BufRead + Send>,
    metrics: &LayoutMetrics,
    measurer: &dyn TextMeasurer,
) -> Result<Vec<Page>, LoadError> {
    let title = chapter.title.clone();
    let mut pages: Vec<Page> = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut images: Vec<String> = Vec::new();
    let mut budget = metrics.visible_height as i64;
    let mut title_line_count = 0usize;
    let mut show_title = true;

    let mut source_lines = reader.lines();
    // The title plays the role of the first paragraph.
    let mut pending = Some(chapter.title.clone());

    loop {
        let raw = match pending.take() {
            Some(first) => first,
            None => match source_lines.next() {
                Some(line) => line.map_err(|err| LoadError::ReadFailure(err.to_string()))?,
                None => break,
            },
        };

        let mut paragraph = if show_title {
            // The title block carries its own top padding.
            budget -= metrics.title_para as i64;
            raw.clone()
        } else {
            match parser::normalize_paragraph(&raw) {
                Some(normalized) => normalized,
                None => continue,
            }
        };

        while !paragraph.is_empty() {
            let (size, interval, font) = if show_title {
                (metrics.title_size, metrics.title_interval, FontKind::Title)
            } else {
                (metrics.text_size, metrics.text_interval, FontKind::Body)
            };

            if budget <= 0 && !lines.is_empty() {
                // Page is full; flush without consuming input.
                pages.push(make_page(pages.len(), &title, &mut lines, title_line_count));
                budget = metrics.visible_height as i64;
                title_line_count = 0;
                continue;
            }
            budget -= size as i64;

            let count = measurer
                .fit(&paragraph, font, size, metrics.visible_width)
                .max(1);
            let split = paragraph
                .char_indices()
                .nth(count)
                .map(|(at, _)| at)
                .unwrap_or(paragraph.len());
            let rest = paragraph.split_off(split);
            let line = std::mem::replace(&mut paragraph, rest);

            // A bare line-break marker occupies no line.
            if line != "\n" {
                lines.push(line);
                if show_title {
                    title_line_count += 1;
                }
                budget -= interval as i64;
            }
        }

        // Paragraphs earn extra trailing space: swap the last line's
        // interval for the paragraph spacing.
        if !show_title && !lines.is_empty() {
            budget = budget - metrics.text_para as i64 + metrics.text_interval as i64;
        }
        if show_title {
            budget = budget - metrics.title_para as i64 + metrics.title_interval as i64;
            show_title = false;
        }

        for src in parser::extract_image_srcs(&raw) {
            if !images.contains(&src) {
                images.push(src);
            }
        }
    }

    if !lines.is_empty() {
        pages.push(make_page(pages.len(), &title, &mut lines, title_line_count));
    }

    for src in images {
        pages.push(Page {
            ordinal: pages.len(),
            title: title.clone(),
            lines: Vec::new(),
            title_lines: 0,
            image: Some(src),
        });
    }

    Ok(pages)
}

fn make_page(ordinal: usize, title: &str, lines: &mut Vec<String>, title_lines: usize) -> Page {
    Page {
        ordinal,
        title: title.to_string(),
        lines: std::mem::take(lines),
        title_lines,
        image: None,
    }
}
