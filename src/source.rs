use crate::models::Chapter;
use eyre::Result;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Where chapter content comes from. The core never fetches; it only
/// checks for data and opens a line-oriented stream.
///
/// Implementations are shared with the background layout worker, so
/// methods take `&self` and the trait is `Send + Sync`.
pub trait ChapterSource: Send + Sync {
    /// Whether the chapter's content is locally available.
    fn has_data(&self, chapter: &Chapter) -> bool;

    /// Open the chapter's text stream. Fails when the content is absent
    /// or unreadable.
    fn open_reader(&self, chapter: &Chapter) -> Result<Box<dyn BufRead + Send>>;
}

/// A book stored as a directory of text files, one chapter per file.
/// The catalog is the sorted file listing; chapter titles are the file
/// stems.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the directory and build the chapter catalog.
    pub fn catalog(&self) -> Result<Vec<Chapter>> {
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("txt")
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                names.push(name.to_string());
            }
        }
        names.sort();

        let chapters = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let title = name.trim_end_matches(".txt").to_string();
                Chapter::new(index, title, name)
            })
            .collect();
        Ok(chapters)
    }

    fn chapter_path(&self, chapter: &Chapter) -> PathBuf {
        self.root.join(&chapter.key)
    }
}

impl ChapterSource for DirSource {
    fn has_data(&self, chapter: &Chapter) -> bool {
        chapter.has_data && self.chapter_path(chapter).is_file()
    }

    fn open_reader(&self, chapter: &Chapter) -> Result<Box<dyn BufRead + Send>> {
        let file = File::open(self.chapter_path(chapter))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
