//! # `fedstack` Federated StackOverflow
//!
//! Loading of the federated StackOverflow dataset, and the next-token
//! tokenizer used to train language models on it.
//!
//! See:
//! * [`stackoverflow`] to load the `train`, `held_out` and `test` splits.
//! * [`federated`] for client stores and lazily preprocessed [`federated::FederatedData`].
//! * [`tokenizer`] to turn space separated token strings into padded id sequences.
//! * [`vocab`] to fetch and read word-count vocabularies.
//!
//! ## Crate Features
//!
//! #### feature: ``default``
//!
//! * ``ahash``
//! * ``download``
//! * ``rayon``
//!
//! #### feature: ``download``
//!
//! * ``fedstack-disk-cache``
//!
//! The download feature enables fetching splits and the default vocabulary.
//! Without it, data can still be read from local `SQLite` files and vocab files.
//!
//! #### feature: ``ahash``
//!
//! This swaps all HashMap/HashSet implementations for ``ahash``.
//!
//! This is done by the ``types::FSHash{*}`` type alias machinery.
//!
//! #### feature: ``rayon``
//!
//! This enables row-parallel batch tokenization using the ``rayon`` crate.
//!
//! ## Loading and Tokenizing
//!
//! ```rust,no_run
//! use fedstack::disk_cache::FedstackDiskCache;
//! use fedstack::stackoverflow;
//! use fedstack::tokenizer::TokenizerOptions;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let (train, _held_out, _test) = stackoverflow::load_data("sqlite", None)?;
//!
//!     let mut disk_cache = FedstackDiskCache::with_cache_dir(None::<&str>)?;
//!     let tokenizer = TokenizerOptions::default()
//!         .with_vocab_size(Some(10000))
//!         .with_num_oov_buckets(1)
//!         .load(&mut disk_cache)?;
//!
//!     let train = train.preprocess_batch(tokenizer.as_preprocess_batch(20));
//!     for client in train.client_ids()?.iter().take(2) {
//!         for batch in train.client_batches(client, 8)? {
//!             log::info!("{:?}", batch.get("x"));
//!         }
//!     }
//!     Ok(())
//! }
//! ```
#![warn(missing_docs, unused)]

#[cfg(feature = "download")]
#[doc(inline)]
pub use fedstack_disk_cache as disk_cache;

pub mod errors;
pub mod examples;
pub mod federated;
pub mod hashing;
pub mod stackoverflow;
pub mod tokenizer;
pub mod types;
pub mod vocab;

#[doc(inline)]
pub use errors::{FSResult, FedstackError};
#[doc(inline)]
pub use examples::{Examples, Feature};
#[doc(inline)]
pub use federated::FederatedData;
#[doc(inline)]
pub use tokenizer::StackoverflowTokenizer;
