#[cfg(feature = "download")]
use crate::disk_cache::FedstackDiskCache;
use crate::{errors::FSResult, tokenizer::StackoverflowTokenizer, vocab::VocabSource};

/// The default number of vocabulary words.
pub const DEFAULT_VOCAB_SIZE: usize = 10000;

/// The default number of out-of-vocabulary buckets.
pub const DEFAULT_NUM_OOV_BUCKETS: usize = 1;

/// Options for configuring a [`StackoverflowTokenizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Number of vocabulary words to keep; `None` keeps the whole vocabulary.
    pub vocab_size: Option<usize>,

    /// Number of out-of-vocabulary buckets.
    pub num_oov_buckets: usize,

    /// Where to fetch the vocabulary from when none is supplied.
    pub vocab_source: VocabSource,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            vocab_size: Some(DEFAULT_VOCAB_SIZE),
            num_oov_buckets: DEFAULT_NUM_OOV_BUCKETS,
            vocab_source: VocabSource::default(),
        }
    }
}

impl TokenizerOptions {
    /// Sets the vocabulary size.
    pub fn with_vocab_size(
        mut self,
        vocab_size: Option<usize>,
    ) -> Self {
        self.vocab_size = vocab_size;
        self
    }

    /// Sets the number of out-of-vocabulary buckets.
    pub fn with_num_oov_buckets(
        mut self,
        num_oov_buckets: usize,
    ) -> Self {
        self.num_oov_buckets = num_oov_buckets;
        self
    }

    /// Sets the default vocabulary source.
    pub fn with_vocab_source(
        mut self,
        vocab_source: VocabSource,
    ) -> Self {
        self.vocab_source = vocab_source;
        self
    }

    /// Build a tokenizer for an explicit vocabulary.
    ///
    /// The vocabulary is truncated to `vocab_size`, when set.
    pub fn build<S: AsRef<str>>(
        &self,
        vocab: &[S],
    ) -> FSResult<StackoverflowTokenizer> {
        let vocab = match self.vocab_size {
            Some(size) if size < vocab.len() => &vocab[..size],
            _ => vocab,
        };
        StackoverflowTokenizer::new(vocab, self.num_oov_buckets)
    }

    /// Build a tokenizer over the vocabulary from `self.vocab_source`.
    ///
    /// Downloads and caches the vocabulary using `disk_cache`.
    #[cfg(feature = "download")]
    pub fn load(
        &self,
        disk_cache: &mut FedstackDiskCache,
    ) -> FSResult<StackoverflowTokenizer> {
        let vocab = self.vocab_source.load(self.vocab_size, disk_cache)?;
        StackoverflowTokenizer::new(&vocab, self.num_oov_buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TokenizerOptions::default();
        assert_eq!(options.vocab_size, Some(10000));
        assert_eq!(options.num_oov_buckets, 1);
        assert_eq!(options.vocab_source, VocabSource::default());
    }

    #[test]
    fn test_build_truncates() {
        let vocab = ["a", "b", "c", "d"];

        let tokenizer = TokenizerOptions::default()
            .with_vocab_size(Some(2))
            .with_num_oov_buckets(3)
            .build(&vocab)
            .unwrap();
        assert_eq!(tokenizer.vocab_size(), 2);
        assert_eq!(tokenizer.num_oov_buckets(), 3);
        assert_eq!(tokenizer.total_size(), 2 + 3 + 3);

        let tokenizer = TokenizerOptions::default()
            .with_vocab_size(None)
            .build(&vocab)
            .unwrap();
        assert_eq!(tokenizer.vocab_size(), 4);
    }
}
