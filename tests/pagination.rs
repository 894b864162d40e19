//! End-to-end pagination over a real directory source: catalog scan,
//! stream open, layout, image extraction.

mod common;

use common::FixedMeasurer;
use folio::layout;
use folio::models::LayoutMetrics;
use folio::source::DirSource;
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

fn write_chapter(dir: &TempDir, name: &str, content: &str) {
    let mut file = File::create(dir.path().join(name)).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn metrics() -> LayoutMetrics {
    let mut metrics = LayoutMetrics::new(10, 0, 0);
    metrics.prepare_display(100, 200);
    metrics
}

#[test]
fn dir_chapter_lays_out_deterministically() {
    let dir = TempDir::new().unwrap();
    write_chapter(
        &dir,
        "01 Opening.txt",
        "A first paragraph with enough words to wrap.\n\nA second one.\n",
    );

    let source = DirSource::new(dir.path());
    let catalog = source.catalog().unwrap();
    let measurer = FixedMeasurer { width: 10 };

    let first = layout::layout_chapter(&source, &measurer, &metrics(), &catalog[0]).unwrap();
    let second = layout::layout_chapter(&source, &measurer, &metrics(), &catalog[0]).unwrap();
    assert_eq!(first, second);
    assert!(!first.is_empty());
    assert_eq!(first[0].title, "01 Opening");
    assert!(first[0].title_lines >= 1);
}

#[test]
fn dir_chapter_with_images_appends_image_pages() {
    let dir = TempDir::new().unwrap();
    write_chapter(
        &dir,
        "01.txt",
        "Some text.\n<img src=\"plate-1.png\">\nMore text.\n",
    );

    let source = DirSource::new(dir.path());
    let catalog = source.catalog().unwrap();
    let measurer = FixedMeasurer { width: 10 };

    let pages = layout::layout_chapter(&source, &measurer, &metrics(), &catalog[0]).unwrap();
    let last = pages.last().unwrap();
    assert_eq!(last.image.as_deref(), Some("plate-1.png"));
    assert!(last.lines.is_empty());
}

#[test]
fn chapter_files_paginate_independently() {
    let dir = TempDir::new().unwrap();
    write_chapter(&dir, "01.txt", &"one paragraph of words here\n".repeat(10));
    write_chapter(&dir, "02.txt", "short\n");

    let source = DirSource::new(dir.path());
    let catalog = source.catalog().unwrap();
    let measurer = FixedMeasurer { width: 10 };

    let long = layout::layout_chapter(&source, &measurer, &metrics(), &catalog[0]).unwrap();
    let short = layout::layout_chapter(&source, &measurer, &metrics(), &catalog[1]).unwrap();
    assert!(long.len() > short.len());
    assert_eq!(short.len(), 1);
}
