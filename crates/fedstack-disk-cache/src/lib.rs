//! # fedstack-disk-cache
//!
//! Resolves the per-user cache directory and keeps a local copy of
//! remote dataset and vocabulary files.
#![warn(missing_docs)]

use crate::path_resolver::PathResolver;

pub mod disk_cache;
pub mod path_resolver;
pub mod path_utils;

pub use disk_cache::{FedstackDiskCache, FedstackDiskCacheOptions};

/// Environment variable key to override the default cache directory.
pub const FEDSTACK_CACHE_DIR: &str = "FEDSTACK_CACHE_DIR";

/// Default [`PathResolver`] for fedstack.
pub const FEDSTACK_CACHE_CONFIG: PathResolver = PathResolver {
    qualifier: "io.crates.fedstack",
    organization: "",
    application: "fedstack",
    cache_env_vars: &[FEDSTACK_CACHE_DIR],
};
