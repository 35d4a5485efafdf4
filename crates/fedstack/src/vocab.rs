//! # Vocabulary Loading
//!
//! Vocabulary files are line-oriented word counts, most frequent first:
//! ```terminaloutput
//! {WORD} {COUNT}
//! ```
//! The separator may be any whitespace (usually a space or a tab).
//! The position of a word in the file is its id.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

#[cfg(feature = "download")]
use crate::disk_cache::FedstackDiskCache;
use crate::errors::{FSResult, FedstackError};

/// The default StackOverflow word count file.
pub const DEFAULT_VOCAB_URL: &str =
    "https://storage.googleapis.com/gresearch/fedjax/stackoverflow/stackoverflow.word_count";

/// Disk cache context for downloaded vocabularies.
pub const VOCAB_CACHE_CONTEXT: &str = "stackoverflow";

/// Where the default vocabulary is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabSource {
    /// The word count file url.
    pub url: String,
}

impl Default for VocabSource {
    fn default() -> Self {
        Self {
            url: DEFAULT_VOCAB_URL.to_string(),
        }
    }
}

impl VocabSource {
    /// Construct a source for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Load the first `vocab_size` words (all words if `None`).
    ///
    /// Downloads and caches the file using `disk_cache`.
    #[cfg(feature = "download")]
    pub fn load(
        &self,
        vocab_size: Option<usize>,
        disk_cache: &mut FedstackDiskCache,
    ) -> FSResult<Vec<String>> {
        let path = disk_cache
            .maybe_download(&[VOCAB_CACHE_CONTEXT], &self.url)
            .map_err(|e| FedstackError::Download(format!("{e:#}")))?;
        load_vocab_path(path, vocab_size)
    }
}

/// Load the first `vocab_size` words of the default StackOverflow vocabulary.
#[cfg(feature = "download")]
pub fn default_vocab(
    vocab_size: usize,
    disk_cache: &mut FedstackDiskCache,
) -> FSResult<Vec<String>> {
    VocabSource::default().load(Some(vocab_size), disk_cache)
}

/// Load the first `vocab_size` words (all words if `None`) from a local file.
pub fn load_vocab_path<P: AsRef<Path>>(
    path: P,
    vocab_size: Option<usize>,
) -> FSResult<Vec<String>> {
    let path = path.as_ref();
    log::debug!("loading vocab: {}", path.display());
    read_vocab(BufReader::new(File::open(path)?), vocab_size)
}

/// Read the first `vocab_size` words (all words if `None`) from a line reader.
///
/// No deduplication is performed; the file order is trusted.
///
/// ## Errors
/// * [`FedstackError::Parse`] if a line is not exactly `{WORD} {COUNT}`.
/// * [`FedstackError::Io`] on read failure.
pub fn read_vocab<R: BufRead>(
    reader: R,
    vocab_size: Option<usize>,
) -> FSResult<Vec<String>> {
    let limit = vocab_size.unwrap_or(usize::MAX);
    let mut vocab = Vec::with_capacity(vocab_size.unwrap_or(0).min(1 << 16));

    for (idx, line) in reader.lines().take(limit).enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(word), Some(_count), None) => vocab.push(word.to_string()),
            _ => {
                return Err(FedstackError::Parse(format!(
                    "vocab line {}: expected `word count`, found {line:?}",
                    idx + 1
                )));
            }
        }
    }

    Ok(vocab)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const WORD_COUNTS: &str = "the 100\nto\t90\ni 80\na 70\n";

    #[test]
    fn test_read_vocab_truncates() {
        let vocab = read_vocab(Cursor::new(WORD_COUNTS), Some(2)).unwrap();
        assert_eq!(vocab, vec!["the", "to"]);

        let vocab = read_vocab(Cursor::new(WORD_COUNTS), Some(10)).unwrap();
        assert_eq!(vocab, vec!["the", "to", "i", "a"]);

        let vocab = read_vocab(Cursor::new(WORD_COUNTS), None).unwrap();
        assert_eq!(vocab.len(), 4);

        assert!(read_vocab(Cursor::new(WORD_COUNTS), Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_read_vocab_rejects_malformed_lines() {
        assert!(matches!(
            read_vocab(Cursor::new("the 1\nbroken\n"), None),
            Err(FedstackError::Parse(_))
        ));
        assert!(matches!(
            read_vocab(Cursor::new("a b c\n"), None),
            Err(FedstackError::Parse(_))
        ));

        // Lines past the limit are never inspected.
        assert_eq!(
            read_vocab(Cursor::new("the 1\nbroken\n"), Some(1)).unwrap(),
            vec!["the"]
        );
    }

    #[test]
    fn test_load_vocab_path() -> anyhow::Result<()> {
        let dir = tempdir::TempDir::new("fedstack-vocab")?;
        let path = dir.path().join("words.word_count");
        std::fs::write(&path, WORD_COUNTS)?;

        assert_eq!(load_vocab_path(&path, Some(3))?, vec!["the", "to", "i"]);
        assert!(matches!(
            load_vocab_path(dir.path().join("missing"), Some(3)),
            Err(FedstackError::Io(_))
        ));
        Ok(())
    }

    #[cfg(feature = "download")]
    #[test]
    fn test_vocab_source_uses_cache() -> anyhow::Result<()> {
        let dir = tempdir::TempDir::new("fedstack-vocab-cache")?;
        let mut disk_cache = FedstackDiskCache::with_cache_dir(Some(dir.path()))?;

        let source = VocabSource::new("https://invalid.example/vocab/test.word_count");
        let path = disk_cache.url_cache_path(&[VOCAB_CACHE_CONTEXT], &source.url)?;
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(&path, WORD_COUNTS)?;

        assert_eq!(source.load(Some(2), &mut disk_cache)?, vec!["the", "to"]);
        assert_eq!(VocabSource::default().url, DEFAULT_VOCAB_URL);
        Ok(())
    }
}
