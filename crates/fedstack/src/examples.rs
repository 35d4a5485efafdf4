//! # Client Examples
//!
//! A client's local data is a set of named feature columns, each holding
//! one entry per example.
//!
//! ```rust
//! use fedstack::examples::{Examples, Feature};
//!
//! let mut examples = Examples::new();
//! examples.insert("tokens", Feature::bytes_from(["a b", "c"]));
//! examples.insert("score", Feature::Int64(vec![3, -1]));
//! assert_eq!(examples.num_examples().unwrap(), 2);
//! ```

use std::{
    collections::{BTreeMap, btree_map},
    ops::Range,
};

use serde::{Deserialize, Serialize};

use crate::errors::{FSResult, FedstackError};

/// A single feature column of a client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// `[N]` byte strings.
    Bytes(#[serde(with = "base64_rows")] Vec<Vec<u8>>),

    /// `[N]` 32-bit integers.
    Int32(Vec<i32>),

    /// `[N]` 64-bit integers.
    Int64(Vec<i64>),

    /// `[N, cols]` row-major 32-bit integers.
    Int32Matrix {
        /// Number of rows (examples).
        rows: usize,
        /// Number of columns.
        cols: usize,
        /// `rows * cols` values, row-major.
        values: Vec<i32>,
    },
}

impl Feature {
    /// Build a [`Feature::Bytes`] column from anything byte-like.
    pub fn bytes_from<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Feature::Bytes(items.into_iter().map(|s| s.as_ref().to_vec()).collect())
    }

    /// The column kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Feature::Bytes(_) => "bytes",
            Feature::Int32(_) => "int32",
            Feature::Int64(_) => "int64",
            Feature::Int32Matrix { .. } => "int32_matrix",
        }
    }

    /// The number of examples in this column.
    pub fn len(&self) -> usize {
        match self {
            Feature::Bytes(v) => v.len(),
            Feature::Int32(v) => v.len(),
            Feature::Int64(v) => v.len(),
            Feature::Int32Matrix { rows, .. } => *rows,
        }
    }

    /// Is this column empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get row `index` of a matrix column.
    pub fn row(
        &self,
        index: usize,
    ) -> Option<&[i32]> {
        match self {
            Feature::Int32Matrix { rows, cols, values } if index < *rows => {
                Some(&values[index * cols..(index + 1) * cols])
            }
            _ => None,
        }
    }

    /// Copy the examples in `range`.
    ///
    /// ## Panics
    /// If `range` is out of bounds.
    pub fn slice(
        &self,
        range: Range<usize>,
    ) -> Feature {
        match self {
            Feature::Bytes(v) => Feature::Bytes(v[range].to_vec()),
            Feature::Int32(v) => Feature::Int32(v[range].to_vec()),
            Feature::Int64(v) => Feature::Int64(v[range].to_vec()),
            Feature::Int32Matrix { rows, cols, values } => {
                assert!(range.end <= *rows, "row range out of bounds");
                Feature::Int32Matrix {
                    rows: range.len(),
                    cols: *cols,
                    values: values[range.start * cols..range.end * cols].to_vec(),
                }
            }
        }
    }
}

/// A client record: feature name to column.
///
/// All columns of a well-formed record share the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Examples {
    features: BTreeMap<String, Feature>,
}

impl Examples {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a feature.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        feature: Feature,
    ) -> Option<Feature> {
        self.features.insert(name.into(), feature)
    }

    /// Add a feature, builder style.
    pub fn with_feature(
        mut self,
        name: impl Into<String>,
        feature: Feature,
    ) -> Self {
        self.insert(name, feature);
        self
    }

    /// Get a feature by name.
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Feature> {
        self.features.get(name)
    }

    /// Remove a feature by name.
    pub fn remove(
        &mut self,
        name: &str,
    ) -> Option<Feature> {
        self.features.remove(name)
    }

    /// Does the record contain `name`?
    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.features.contains_key(name)
    }

    /// Feature names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// The number of features.
    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// Iterate over `(name, feature)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Feature> {
        self.features.iter()
    }

    /// The number of examples, N.
    ///
    /// An empty record has zero examples.
    ///
    /// ## Errors
    /// [`FedstackError::LengthMismatch`] if the features disagree.
    pub fn num_examples(&self) -> FSResult<usize> {
        let mut iter = self.features.iter();
        let Some((_, first)) = iter.next() else {
            return Ok(0);
        };
        let expected = first.len();
        for (name, feature) in iter {
            if feature.len() != expected {
                return Err(FedstackError::LengthMismatch {
                    name: name.clone(),
                    expected,
                    found: feature.len(),
                });
            }
        }
        Ok(expected)
    }

    /// Get a required feature.
    pub fn require(
        &self,
        name: &str,
    ) -> FSResult<&Feature> {
        self.get(name)
            .ok_or_else(|| FedstackError::MissingFeature(name.to_string()))
    }

    /// Get a required [`Feature::Bytes`] column.
    pub fn bytes(
        &self,
        name: &str,
    ) -> FSResult<&[Vec<u8>]> {
        match self.require(name)? {
            Feature::Bytes(v) => Ok(v),
            other => Err(type_error(name, "bytes", other)),
        }
    }

    /// Get a required [`Feature::Int32`] column.
    pub fn int32(
        &self,
        name: &str,
    ) -> FSResult<&[i32]> {
        match self.require(name)? {
            Feature::Int32(v) => Ok(v),
            other => Err(type_error(name, "int32", other)),
        }
    }

    /// Copy the examples in `range` of every feature.
    ///
    /// ## Panics
    /// If `range` is out of bounds for any feature.
    pub fn slice(
        &self,
        range: Range<usize>,
    ) -> Examples {
        self.features
            .iter()
            .map(|(name, feature)| (name.clone(), feature.slice(range.clone())))
            .collect()
    }

    /// Split into consecutive batches of at most `batch_size` examples.
    ///
    /// The final batch may be smaller; an empty record yields no batches.
    pub fn batches(
        &self,
        batch_size: usize,
    ) -> FSResult<Vec<Examples>> {
        if batch_size == 0 {
            return Err(FedstackError::InvalidArgument(
                "batch_size must be > 0".to_string(),
            ));
        }
        let n = self.num_examples()?;
        Ok((0..n)
            .step_by(batch_size)
            .map(|start| self.slice(start..(start + batch_size).min(n)))
            .collect())
    }
}

fn type_error(
    name: &str,
    expected: &'static str,
    found: &Feature,
) -> FedstackError {
    FedstackError::FeatureType {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

impl FromIterator<(String, Feature)> for Examples {
    fn from_iter<I: IntoIterator<Item = (String, Feature)>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, Feature>> for Examples {
    fn from(features: BTreeMap<String, Feature>) -> Self {
        Self { features }
    }
}

impl IntoIterator for Examples {
    type Item = (String, Feature);
    type IntoIter = btree_map::IntoIter<String, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

/// Byte strings as base64 text, so records stay readable JSON.
mod base64_rows {
    use base64::{Engine, prelude::BASE64_STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error, ser::SerializeSeq};

    pub fn serialize<S: Serializer>(
        rows: &[Vec<u8>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(rows.len()))?;
        for row in rows {
            seq.serialize_element(&BASE64_STANDARD.encode(row))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| BASE64_STANDARD.decode(s).map_err(D::Error::custom))
            .collect()
    }
}
