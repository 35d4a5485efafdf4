use std::sync::Arc;

use crate::{
    errors::FSResult,
    examples::{Examples, Feature},
    federated::{BatchFn, BatchTransform},
    tokenizer::{StackoverflowTokenizer, VocabTable},
};

/// Input feature: space separated token strings.
pub const TOKENS_FEATURE: &str = "tokens";
/// Output feature: input ids.
pub const X_FEATURE: &str = "x";
/// Output feature: target ids.
pub const Y_FEATURE: &str = "y";
/// Pass-through feature: domain labels.
pub const DOMAIN_ID_FEATURE: &str = "domain_id";

/// Batch transform from token strings to next-token `x`/`y` pairs.
///
/// For each token string, the id sequence `[BOS, w.., EOS]` becomes
/// `x = ids[..len - 1]` and `y = ids[1..]`; both are truncated to
/// `max_length` and right padded with `PAD`.
///
/// Output features:
/// * `x`: `[N, max_length]` int32.
/// * `y`: `[N, max_length]` int32.
/// * `domain_id`: unchanged from the input, if present.
#[derive(Debug, Clone)]
pub struct PreprocessBatch {
    table: Arc<VocabTable>,
    max_length: usize,
    parallel: bool,
}

impl PreprocessBatch {
    /// Create a transform over a shared table.
    pub fn new(
        table: Arc<VocabTable>,
        max_length: usize,
    ) -> Self {
        Self {
            table,
            max_length,
            parallel: false,
        }
    }

    /// The padded sequence length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Is row-parallel tokenization requested?
    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Request row-parallel tokenization.
    ///
    /// Without the `rayon` feature this is ignored; output is identical either way.
    pub fn with_parallel(
        mut self,
        parallel: bool,
    ) -> Self {
        self.parallel = parallel;
        self
    }

    fn word_id(
        &self,
        word: &[u8],
    ) -> i32 {
        (self.table.lookup(word) as usize + StackoverflowTokenizer::NUM_SPECIAL) as i32
    }

    /// Write the `x` and `y` rows for one token string.
    ///
    /// Rows must be pre-filled with `PAD`.
    fn fill_row(
        &self,
        text: &[u8],
        x_row: &mut [i32],
        y_row: &mut [i32],
    ) {
        let words = (!text.is_empty())
            .then(|| text.split(|&b| b == b' ').map(|w| self.word_id(w)))
            .into_iter()
            .flatten();
        let ids = std::iter::once(StackoverflowTokenizer::BOS)
            .chain(words)
            .chain(std::iter::once(StackoverflowTokenizer::EOS));

        // Each adjacent (ids[i - 1], ids[i]) pair is column i - 1 of (x, y).
        let mut prev: Option<i32> = None;
        for (i, id) in ids.enumerate().take(self.max_length + 1) {
            if let Some(prev_id) = prev {
                x_row[i - 1] = prev_id;
                y_row[i - 1] = id;
            }
            prev = Some(id);
        }
    }

    /// Apply the transform to a batch.
    ///
    /// ## Errors
    /// * [`MissingFeature`](crate::errors::FedstackError::MissingFeature) if `tokens` is absent.
    /// * [`FeatureType`](crate::errors::FedstackError::FeatureType) if `tokens` is not bytes.
    pub fn apply(
        &self,
        examples: &Examples,
    ) -> FSResult<Examples> {
        let tokens = examples.bytes(TOKENS_FEATURE)?;
        let rows = tokens.len();
        let cols = self.max_length;

        let mut x = vec![StackoverflowTokenizer::PAD; rows * cols];
        let mut y = vec![StackoverflowTokenizer::PAD; rows * cols];

        if cols > 0 {
            self.fill(tokens, &mut x, &mut y);
        }

        let mut result = Examples::new()
            .with_feature(
                X_FEATURE,
                Feature::Int32Matrix {
                    rows,
                    cols,
                    values: x,
                },
            )
            .with_feature(
                Y_FEATURE,
                Feature::Int32Matrix {
                    rows,
                    cols,
                    values: y,
                },
            );
        if let Some(domain_id) = examples.get(DOMAIN_ID_FEATURE) {
            result.insert(DOMAIN_ID_FEATURE, domain_id.clone());
        }
        Ok(result)
    }

    fn fill(
        &self,
        tokens: &[Vec<u8>],
        x: &mut [i32],
        y: &mut [i32],
    ) {
        if self.parallel {
            self.fill_parallel(tokens, x, y);
        } else {
            self.fill_serial(tokens, x, y);
        }
    }

    fn fill_serial(
        &self,
        tokens: &[Vec<u8>],
        x: &mut [i32],
        y: &mut [i32],
    ) {
        let cols = self.max_length;
        for ((x_row, y_row), text) in x
            .chunks_mut(cols)
            .zip(y.chunks_mut(cols))
            .zip(tokens.iter())
        {
            self.fill_row(text, x_row, y_row);
        }
    }

    #[cfg(feature = "rayon")]
    fn fill_parallel(
        &self,
        tokens: &[Vec<u8>],
        x: &mut [i32],
        y: &mut [i32],
    ) {
        use rayon::prelude::*;

        let cols = self.max_length;
        x.par_chunks_mut(cols)
            .zip(y.par_chunks_mut(cols))
            .zip(tokens.par_iter())
            .for_each(|((x_row, y_row), text)| self.fill_row(text, x_row, y_row));
    }

    #[cfg(not(feature = "rayon"))]
    fn fill_parallel(
        &self,
        tokens: &[Vec<u8>],
        x: &mut [i32],
        y: &mut [i32],
    ) {
        self.fill_serial(tokens, x, y)
    }

    /// Convert into a shared transform.
    pub fn into_batch_fn(self) -> BatchFn {
        Arc::new(self)
    }
}

impl BatchTransform for PreprocessBatch {
    fn transform(
        &self,
        examples: Examples,
    ) -> FSResult<Examples> {
        self.apply(&examples)
    }
}
