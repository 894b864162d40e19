use folio::{
    cli::Cli,
    config::Config,
    loader::PageLoader,
    logging::{self, LogLevel},
    measure::CellMeasurer,
    source::DirSource,
    state::State,
};

use clap::Parser;
use eyre::Result;
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(LogLevel::from_verbosity(cli.verbose));

    // Load configuration
    let config = match cli.config.clone() {
        Some(path) => Config::load_from(path),
        None => Config::new(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Warning: Could not load configuration: {}", err);
            eprintln!("Starting with default settings");
            return Ok(());
        }
    };

    if cli.history {
        return print_history();
    }

    let Some(book) = cli.book.as_deref() else {
        eprintln!("No book directory given; see --help");
        return Ok(());
    };

    if cli.dump {
        dump_book(book, &config, cli.width, cli.height)
    } else {
        summarize_book(book, &config, cli.width, cli.height)
    }
}

fn print_history() -> Result<()> {
    let state = State::new()?;
    for item in state.get_from_history()? {
        let title = item.title.unwrap_or_else(|| "(untitled)".to_string());
        let progress = item
            .progress
            .map(|p| format!("{:.0}%", p * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {}  {}", item.last_read, title, progress);
    }
    Ok(())
}

fn open_loader(book: &Path, config: &Config, width: u32, height: u32) -> Result<PageLoader> {
    let source = DirSource::new(book);
    let catalog = source.catalog()?;
    let book_id = book.to_string_lossy().to_string();

    let mut loader = PageLoader::new(
        book_id,
        Arc::new(source),
        Arc::new(CellMeasurer::new()),
        &config.settings,
    );
    loader.refresh_catalog(catalog);
    loader.prepare_display(width, height);
    loader.open_chapter();
    Ok(loader)
}

/// Print every page of every chapter, separated by page rules.
fn dump_book(book: &Path, config: &Config, width: u32, height: u32) -> Result<()> {
    let mut loader = open_loader(book, config, width, height)?;
    let chapter_count = loader.catalog().len();

    for index in 0..chapter_count {
        loader.skip_to_chapter(index);
        let Some(pages) = loader.current_pages() else {
            eprintln!("chapter {} unavailable ({:?})", index, loader.status());
            continue;
        };
        for page in pages {
            println!("--- {} · page {} ---", page.title, page.ordinal + 1);
            match &page.image {
                Some(src) => println!("[image: {}]", src),
                None => {
                    for line in &page.lines {
                        println!("{}", line.trim_end_matches('\n'));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Print the chapter catalog and page counts without page content.
fn summarize_book(book: &Path, config: &Config, width: u32, height: u32) -> Result<()> {
    let mut loader = open_loader(book, config, width, height)?;
    let chapter_count = loader.catalog().len();
    println!("{} chapters", chapter_count);

    for index in 0..chapter_count {
        loader.skip_to_chapter(index);
        let title = loader
            .catalog()
            .get(index)
            .map(|c| c.title.clone())
            .unwrap_or_default();
        println!("{:>4}  {}  ({} pages)", index, title, loader.page_count());
    }

    let state = State::new()?;
    loader.save_record(&state)?;
    state.update_library(
        &book.to_string_lossy(),
        book.file_name().and_then(|n| n.to_str()),
        None,
    )?;
    Ok(())
}
