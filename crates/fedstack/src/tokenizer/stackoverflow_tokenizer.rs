use std::sync::Arc;

use crate::{
    errors::FSResult,
    tokenizer::{PreprocessBatch, VocabTable},
};

/// Tokenizer for the `tokens` feature of StackOverflow records.
///
/// Ids:
/// * `0` - [`PAD`](Self::PAD)
/// * `1` - [`BOS`](Self::BOS)
/// * `2` - [`EOS`](Self::EOS)
/// * `3..3 + vocab_size` - vocabulary words, in vocabulary order.
/// * `3 + vocab_size..` - `num_oov_buckets` out-of-vocabulary ids.
///
/// Cloning is cheap; the lookup table is shared.
#[derive(Debug, Clone)]
pub struct StackoverflowTokenizer {
    table: Arc<VocabTable>,
}

impl StackoverflowTokenizer {
    /// Padding id.
    pub const PAD: i32 = 0;

    /// Begin-of-sequence id.
    pub const BOS: i32 = 1;

    /// End-of-sequence id.
    pub const EOS: i32 = 2;

    /// Number of reserved special ids; table ids are shifted by this.
    pub const NUM_SPECIAL: usize = 3;

    /// Build a tokenizer over `vocab` (not truncated).
    ///
    /// See [`TokenizerOptions`](crate::tokenizer::TokenizerOptions) for truncation
    /// and default vocabulary loading.
    pub fn new<S: AsRef<str>>(
        vocab: &[S],
        num_oov_buckets: usize,
    ) -> FSResult<Self> {
        let table = VocabTable::new(vocab, num_oov_buckets, Self::NUM_SPECIAL)?;
        log::debug!(
            "tokenizer: vocab_size={}, num_oov_buckets={}",
            table.vocab_size(),
            table.num_oov_buckets()
        );
        Ok(Self {
            table: Arc::new(table),
        })
    }

    /// The underlying lookup table.
    pub fn table(&self) -> &Arc<VocabTable> {
        &self.table
    }

    /// The number of vocabulary words.
    pub fn vocab_size(&self) -> usize {
        self.table.vocab_size()
    }

    /// The number of out-of-vocabulary buckets.
    pub fn num_oov_buckets(&self) -> usize {
        self.table.num_oov_buckets()
    }

    /// The total number of ids: `vocab_size + 3 + num_oov_buckets`.
    pub fn total_size(&self) -> usize {
        self.table.num_ids() + Self::NUM_SPECIAL
    }

    /// The id of a single word.
    pub fn word_id(
        &self,
        word: &[u8],
    ) -> i32 {
        (self.table.lookup(word) as usize + Self::NUM_SPECIAL) as i32
    }

    /// The full id sequence of a space separated token string.
    ///
    /// Words are split on single spaces, so consecutive spaces produce
    /// empty words. The empty string has no words: `[BOS, EOS]`.
    pub fn token_ids(
        &self,
        text: &[u8],
    ) -> Vec<i32> {
        let mut ids = Vec::with_capacity(2 + text.len() / 2);
        ids.push(Self::BOS);
        if !text.is_empty() {
            ids.extend(text.split(|&b| b == b' ').map(|w| self.word_id(w)));
        }
        ids.push(Self::EOS);
        ids
    }

    /// Create a batch transform producing `[N, max_length]` `x`/`y` features.
    pub fn as_preprocess_batch(
        &self,
        max_length: usize,
    ) -> PreprocessBatch {
        PreprocessBatch::new(self.table.clone(), max_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{check_is_send, check_is_sync};

    #[test]
    fn test_token_ids() {
        let tokenizer = StackoverflowTokenizer::new(&["a", "b"], 1).unwrap();
        check_is_send(&tokenizer);
        check_is_sync(&tokenizer);

        assert_eq!(tokenizer.total_size(), 6);
        assert_eq!(tokenizer.token_ids(b"a b"), vec![1, 3, 4, 2]);
        assert_eq!(tokenizer.token_ids(b""), vec![1, 2]);
        assert_eq!(tokenizer.token_ids(b"a c"), vec![1, 3, 5, 2]);
        // Consecutive spaces delimit an (out-of-vocabulary) empty word.
        assert_eq!(tokenizer.token_ids(b"a  b"), vec![1, 3, 5, 4, 2]);
    }

    #[test]
    fn test_ids_in_range() {
        let vocab = ["the", "to", "a"];
        let tokenizer = StackoverflowTokenizer::new(&vocab, 4).unwrap();
        let text = b"the quick brown fox jumps over a lazy dog";
        for id in tokenizer.token_ids(text) {
            assert!(id >= 0 && (id as usize) < tokenizer.total_size());
        }
        for word in text.split(|&b| b == b' ') {
            let id = tokenizer.word_id(word);
            assert!(id >= 3, "special ids are never produced by lookup");
            assert_eq!(id, tokenizer.word_id(word));
        }
    }
}
