use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "folio",
    version,
    about = "Paginate a book directory into fixed-size reader pages.",
    long_about = None
)]
pub struct Cli {
    /// Print reading history
    #[clap(short = 'r', long)]
    pub history: bool,

    /// Dump every page of the book to stdout
    #[clap(short, long)]
    pub dump: bool,

    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Display width in px used for pagination
    #[clap(long, default_value_t = 600)]
    pub width: u32,

    /// Display height in px used for pagination
    #[clap(long, default_value_t = 800)]
    pub height: u32,

    /// Book directory, one text file per chapter
    #[clap(name = "BOOK")]
    pub book: Option<PathBuf>,
}
