//! # Vocabulary Lookup Table

use crate::{
    errors::{FSResult, FedstackError},
    hashing::fingerprint_bucket,
    types::{FSHashMap, hash_map_with_capacity},
};

/// Static word to id table with out-of-vocabulary buckets.
///
/// Vocabulary words map to their position in `[0, vocab_size)`;
/// any other word maps to `vocab_size + fingerprint64(word) % num_oov_buckets`.
///
/// Ids here are table ids; the tokenizer shifts them past the special ids.
#[derive(Debug, Clone)]
pub struct VocabTable {
    words: FSHashMap<Vec<u8>, u32>,
    vocab_size: usize,
    num_oov_buckets: usize,
}

impl VocabTable {
    /// Build a table from an ordered vocabulary.
    ///
    /// A repeated word keeps the id of its first occurrence.
    ///
    /// ## Errors
    /// [`FedstackError::InvalidArgument`] if `num_oov_buckets` is zero,
    /// or if the table would not fit `reserved` extra ids in an `i32`.
    pub fn new<S: AsRef<str>>(
        vocab: &[S],
        num_oov_buckets: usize,
        reserved: usize,
    ) -> FSResult<Self> {
        if num_oov_buckets == 0 {
            return Err(FedstackError::InvalidArgument(
                "num_oov_buckets must be > 0".to_string(),
            ));
        }
        let vocab_size = vocab.len();
        match vocab_size
            .checked_add(num_oov_buckets)
            .and_then(|n| n.checked_add(reserved))
        {
            Some(total) if total <= i32::MAX as usize => (),
            _ => {
                return Err(FedstackError::InvalidArgument(format!(
                    "vocab_size ({vocab_size}) + num_oov_buckets ({num_oov_buckets}) overflows i32 ids"
                )));
            }
        }

        let mut words = hash_map_with_capacity(vocab_size);
        for (id, word) in vocab.iter().enumerate() {
            words
                .entry(word.as_ref().as_bytes().to_vec())
                .or_insert(id as u32);
        }

        Ok(Self {
            words,
            vocab_size,
            num_oov_buckets,
        })
    }

    /// The number of vocabulary ids.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// The number of out-of-vocabulary ids.
    pub fn num_oov_buckets(&self) -> usize {
        self.num_oov_buckets
    }

    /// The number of table ids: `vocab_size + num_oov_buckets`.
    pub fn num_ids(&self) -> usize {
        self.vocab_size + self.num_oov_buckets
    }

    /// Is `word` in the vocabulary?
    pub fn contains(
        &self,
        word: &[u8],
    ) -> bool {
        self.words.contains_key(word)
    }

    /// Look up the table id of `word`.
    pub fn lookup(
        &self,
        word: &[u8],
    ) -> u32 {
        match self.words.get(word) {
            Some(&id) => id,
            None => {
                let bucket = fingerprint_bucket(word, self.num_oov_buckets as u64);
                (self.vocab_size as u64 + bucket) as u32
            }
        }
    }
}
