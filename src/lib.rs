//! folio: a page-loader core for one-screen-at-a-time book readers.
//!
//! One [`loader::PageLoader`] manages one book: it paginates chapter
//! text streams into fixed-size pages against the host's layout
//! metrics, keeps a previous/current/next window of laid-out chapters
//! so page turns are instant, and prefetches the following chapter in
//! the background. Rendering, fetching and UI dispatch stay on the
//! host's side of the [`source::ChapterSource`] and
//! [`measure::TextMeasurer`] seams.

pub mod cli;
pub mod config;
pub mod layout;
pub mod loader;
pub mod logging;
pub mod measure;
pub mod models;
pub mod parser;
pub mod prefetch;
pub mod settings;
pub mod source;
pub mod state;
pub mod window;
