//! # Federated StackOverflow
//!
//! Each client is a StackOverflow user; each example is one post.
//!
//! Raw features (all `[N]`):
//! * `creation_date`: bytes, e.g. `2018-02-28 19:06:18.34 UTC`.
//! * `title`: bytes.
//! * `score`: int64.
//! * `tags`: bytes, `|` separated, e.g. `mysql|join`.
//! * `tokens`: bytes, space separated tokens.
//! * `type`: bytes, `question` or `answer`.
//!
//! [`load_data`] keeps only `tokens` and adds `domain_id` (int32;
//! question = 0, answer = 1). Tokenize during batching with a
//! [`StackoverflowTokenizer`](crate::tokenizer::StackoverflowTokenizer):
//!
//! ```rust,no_run
//! use fedstack::{stackoverflow, tokenizer::TokenizerOptions, disk_cache::FedstackDiskCache};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let (train, held_out, _test) = stackoverflow::load_data("sqlite", None)?;
//!
//!     let mut disk_cache = FedstackDiskCache::with_cache_dir(None::<&str>)?;
//!     let tokenizer = TokenizerOptions::default().load(&mut disk_cache)?;
//!
//!     let train = train.preprocess_batch(tokenizer.as_preprocess_batch(20));
//!     let held_out = held_out.preprocess_batch(tokenizer.as_preprocess_batch(30));
//!
//!     let client_id = &train.client_ids()?[0];
//!     for batch in train.client_batches(client_id, 16)? {
//!         let _x = batch.get("x");
//!     }
//!     # let _ = held_out;
//!     Ok(())
//! }
//! ```

use std::str::FromStr;
#[cfg(feature = "download")]
use std::path::{Path, PathBuf};

#[cfg(feature = "download")]
use crate::{disk_cache::FedstackDiskCache, federated::FederatedData};
use crate::{
    errors::{FSResult, FedstackError},
    examples::{Examples, Feature},
    tokenizer::{DOMAIN_ID_FEATURE, TOKENS_FEATURE},
};

/// The default location of the split files.
pub const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com/gresearch/fedjax/stackoverflow";

/// Disk cache context for downloaded splits.
pub const SPLIT_CACHE_CONTEXT: &str = "stackoverflow";

/// The post type feature.
pub const TYPE_FEATURE: &str = "type";

/// A named partition of the dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::EnumIter,
    strum::Display,
    strum::IntoStaticStr,
)]
pub enum Split {
    /// Training clients.
    #[strum(serialize = "train")]
    Train,

    /// Held-out clients.
    #[strum(serialize = "held_out")]
    HeldOut,

    /// Test clients.
    #[strum(serialize = "test")]
    Test,
}

/// All splits, in `(train, held_out, test)` order.
pub const SPLITS: [Split; 3] = [Split::Train, Split::HeldOut, Split::Test];

impl Split {
    /// Parse a split name.
    ///
    /// ## Errors
    /// [`FedstackError::InvalidSplit`] for anything but `train`, `held_out`, `test`.
    pub fn parse(name: &str) -> FSResult<Self> {
        Self::from_str(name).map_err(|_| FedstackError::InvalidSplit(name.to_string()))
    }

    /// The split name.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// The split file name, `stackoverflow_{split}.sqlite`.
    pub fn file_name(&self) -> String {
        format!("stackoverflow_{self}.sqlite")
    }

    /// The split file url under `base_url`.
    pub fn url(
        &self,
        base_url: &str,
    ) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.file_name())
    }
}

/// Storage modes for loading splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
pub enum LoadMode {
    /// Download the split's `SQLite` file and read clients from it.
    #[strum(serialize = "sqlite")]
    Sqlite,
}

impl LoadMode {
    /// Validate a mode name against an optional cache directory.
    ///
    /// ## Errors
    /// * [`FedstackError::InvalidArgument`] if a cache directory is given for a mode
    ///   other than `sqlite`.
    /// * [`FedstackError::UnsupportedMode`] for an unknown mode.
    pub fn parse(
        mode: &str,
        has_cache_dir: bool,
    ) -> FSResult<Self> {
        let parsed = Self::from_str(mode).ok();
        if has_cache_dir && parsed != Some(LoadMode::Sqlite) {
            return Err(FedstackError::InvalidArgument(
                "caching locally is only supported in sqlite mode".to_string(),
            ));
        }
        parsed.ok_or_else(|| FedstackError::UnsupportedMode(mode.to_string()))
    }
}

/// Where split files are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    /// Directory url holding `stackoverflow_{split}.sqlite` files.
    pub base_url: String,
}

impl Default for DatasetSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl DatasetSource {
    /// Construct a source for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// The url of a split file.
    pub fn split_url(
        &self,
        split: Split,
    ) -> String {
        split.url(&self.base_url)
    }
}

/// Attach `domain_id` and drop all features other than `tokens`.
///
/// `domain_id` is `1` where `type == "answer"`, else `0`.
pub fn preprocess_client(
    _client_id: &[u8],
    mut examples: Examples,
) -> FSResult<Examples> {
    let domain_id: Vec<i32> = examples
        .bytes(TYPE_FEATURE)?
        .iter()
        .map(|t| i32::from(t.as_slice() == b"answer"))
        .collect();
    examples.bytes(TOKENS_FEATURE)?;
    let tokens = examples
        .remove(TOKENS_FEATURE)
        .ok_or_else(|| FedstackError::MissingFeature(TOKENS_FEATURE.to_string()))?;

    Ok(Examples::new()
        .with_feature(DOMAIN_ID_FEATURE, Feature::Int32(domain_id))
        .with_feature(TOKENS_FEATURE, tokens))
}

/// Loads StackOverflow splits through a disk cache.
#[cfg(feature = "download")]
pub struct StackoverflowLoader {
    source: DatasetSource,
    disk_cache: FedstackDiskCache,
}

#[cfg(feature = "download")]
impl StackoverflowLoader {
    /// Create a loader.
    pub fn new(
        source: DatasetSource,
        disk_cache: FedstackDiskCache,
    ) -> Self {
        Self { source, disk_cache }
    }

    /// Create a loader for the default source, caching under `cache_dir`
    /// (or the resolved default cache directory).
    pub fn with_cache_dir<P: AsRef<Path>>(cache_dir: Option<P>) -> FSResult<Self> {
        let disk_cache = FedstackDiskCache::with_cache_dir(cache_dir)
            .map_err(|e| FedstackError::Download(format!("{e:#}")))?;
        Ok(Self::new(DatasetSource::default(), disk_cache))
    }

    /// The dataset source.
    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    /// The disk cache.
    pub fn disk_cache(&mut self) -> &mut FedstackDiskCache {
        &mut self.disk_cache
    }

    /// The local path of a split file, downloading it if needed.
    pub fn split_path(
        &mut self,
        split: Split,
    ) -> FSResult<PathBuf> {
        let url = self.source.split_url(split);
        self.disk_cache
            .maybe_download(&[SPLIT_CACHE_CONTEXT], &url)
            .map_err(|e| FedstackError::Download(format!("{e:#}")))
    }

    /// Load a raw split.
    pub fn load_split(
        &mut self,
        split: Split,
    ) -> FSResult<FederatedData> {
        let path = self.split_path(split)?;
        log::debug!("loading split {split}: {}", path.display());
        FederatedData::from_sqlite(path)
    }

    /// Load all splits with [`preprocess_client`] applied.
    ///
    /// Returns `(train, held_out, test)`.
    pub fn load_data(&mut self) -> FSResult<(FederatedData, FederatedData, FederatedData)> {
        let [train, held_out, test] = SPLITS.map(|split| {
            self.load_split(split)
                .map(|data| data.preprocess_client(preprocess_client))
        });
        Ok((train?, held_out?, test?))
    }
}

/// Load a raw split.
///
/// ## Arguments
/// * `split` - one of `train`, `held_out`, `test`.
/// * `mode` - `sqlite`.
/// * `cache_dir` - directory to cache files in; only valid in `sqlite` mode.
///
/// ## Errors
/// * [`FedstackError::InvalidSplit`] for an unknown split.
/// * [`FedstackError::InvalidArgument`] for a cache dir with a non-`sqlite` mode.
/// * [`FedstackError::UnsupportedMode`] for an unknown mode.
/// * [`FedstackError::Download`] if the split cannot be fetched.
#[cfg(feature = "download")]
pub fn load_split(
    split: &str,
    mode: &str,
    cache_dir: Option<&Path>,
) -> FSResult<FederatedData> {
    let split = Split::parse(split)?;
    match LoadMode::parse(mode, cache_dir.is_some())? {
        LoadMode::Sqlite => StackoverflowLoader::with_cache_dir(cache_dir)?.load_split(split),
    }
}

/// Load `(train, held_out, test)` with [`preprocess_client`] applied.
///
/// See [`load_split`] for arguments and errors.
#[cfg(feature = "download")]
pub fn load_data(
    mode: &str,
    cache_dir: Option<&Path>,
) -> FSResult<(FederatedData, FederatedData, FederatedData)> {
    match LoadMode::parse(mode, cache_dir.is_some())? {
        LoadMode::Sqlite => StackoverflowLoader::with_cache_dir(cache_dir)?.load_data(),
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_split_names() {
        assert_eq!(Split::iter().collect::<Vec<_>>(), SPLITS.to_vec());
        for (split, name) in SPLITS.iter().zip(["train", "held_out", "test"]) {
            assert_eq!(split.as_str(), name);
            assert_eq!(Split::parse(name).unwrap(), *split);
        }
        for bad in ["", "Train", "validation", "held-out"] {
            assert!(matches!(
                Split::parse(bad),
                Err(FedstackError::InvalidSplit(name)) if name == bad
            ));
        }
    }

    #[test]
    fn test_split_urls() {
        assert_eq!(
            DatasetSource::default().split_url(Split::HeldOut),
            "https://storage.googleapis.com/gresearch/fedjax/stackoverflow/stackoverflow_held_out.sqlite"
        );
        assert_eq!(
            DatasetSource::new("http://mirror/so/").split_url(Split::Test),
            "http://mirror/so/stackoverflow_test.sqlite"
        );
    }

    #[test]
    fn test_load_mode() {
        assert_eq!(LoadMode::parse("sqlite", false).unwrap(), LoadMode::Sqlite);
        assert_eq!(LoadMode::parse("sqlite", true).unwrap(), LoadMode::Sqlite);
        assert!(matches!(
            LoadMode::parse("tff", false),
            Err(FedstackError::UnsupportedMode(mode)) if mode == "tff"
        ));
        assert!(matches!(
            LoadMode::parse("tff", true),
            Err(FedstackError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_preprocess_client() {
        let examples = Examples::new()
            .with_feature("creation_date", Feature::bytes_from(["d1", "d2"]))
            .with_feature("title", Feature::bytes_from(["t1", "t2"]))
            .with_feature("score", Feature::Int64(vec![1, 2]))
            .with_feature("tags", Feature::bytes_from(["a|b", "c"]))
            .with_feature("tokens", Feature::bytes_from(["hello world", "hi"]))
            .with_feature(TYPE_FEATURE, Feature::bytes_from(["question", "answer"]));

        let out = preprocess_client(b"client", examples).unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["domain_id", "tokens"]);
        assert_eq!(out.int32("domain_id").unwrap(), &[0, 1]);
        assert_eq!(
            out.get("tokens"),
            Some(&Feature::bytes_from(["hello world", "hi"]))
        );
    }

    #[test]
    fn test_preprocess_client_requires_features() {
        let no_type = Examples::new().with_feature("tokens", Feature::bytes_from(["a"]));
        assert!(matches!(
            preprocess_client(b"c", no_type),
            Err(FedstackError::MissingFeature(name)) if name == "type"
        ));

        let no_tokens = Examples::new().with_feature(TYPE_FEATURE, Feature::bytes_from(["answer"]));
        assert!(matches!(
            preprocess_client(b"c", no_tokens),
            Err(FedstackError::MissingFeature(name)) if name == "tokens"
        ));
    }
}
