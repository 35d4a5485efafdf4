//! # Fedstack Disk Cache

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use downloader::{Download, Downloader};

use crate::{FEDSTACK_CACHE_CONFIG, path_utils};

/// Options for [`FedstackDiskCache`].
#[derive(Clone, Default, Debug)]
pub struct FedstackDiskCacheOptions {
    /// Optional path to the cache directory.
    pub cache_dir: Option<PathBuf>,

    /// Optional [`Downloader`] builder.
    pub downloader: Option<fn() -> Downloader>,
}

impl FedstackDiskCacheOptions {
    /// Set the cache directory.
    pub fn with_cache_dir<P: AsRef<Path>>(
        mut self,
        cache_dir: Option<P>,
    ) -> Self {
        self.cache_dir = cache_dir.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Set the downloader builder.
    pub fn with_downloader(
        mut self,
        downloader: Option<fn() -> Downloader>,
    ) -> Self {
        self.downloader = downloader;
        self
    }
}

/// Disk cache for downloaded files.
///
/// Files are written once, on first request, and read from disk afterwards.
/// Leverages [`Downloader`] for downloading files,
/// and [`PathResolver`](`crate::path_resolver::PathResolver`) for resolving
/// a cache path appropriate for a user/system combo, and any
/// environment overrides.
pub struct FedstackDiskCache {
    cache_dir: PathBuf,

    /// Built on first download.
    downloader: Option<Downloader>,
    downloader_builder: Option<fn() -> Downloader>,
}

impl FedstackDiskCache {
    /// Construct a new [`FedstackDiskCache`].
    pub fn new(options: FedstackDiskCacheOptions) -> anyhow::Result<Self> {
        let cache_dir = FEDSTACK_CACHE_CONFIG
            .resolve_cache_dir(options.cache_dir)
            .context("failed to resolve cache directory")?;

        Ok(Self {
            cache_dir,
            downloader: None,
            downloader_builder: options.downloader,
        })
    }

    /// Construct a cache rooted at `cache_dir`, or the resolved default.
    pub fn with_cache_dir<P: AsRef<Path>>(cache_dir: Option<P>) -> anyhow::Result<Self> {
        Self::new(FedstackDiskCacheOptions::default().with_cache_dir(cache_dir))
    }

    /// Get the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn downloader(&mut self) -> anyhow::Result<&mut Downloader> {
        if self.downloader.is_none() {
            let downloader = match self.downloader_builder {
                Some(builder) => builder(),
                None => Downloader::builder()
                    .build()
                    .context("failed to build downloader")?,
            };
            self.downloader = Some(downloader);
        }
        self.downloader
            .as_mut()
            .context("downloader was not initialized")
    }

    /// Get the cache path for the given key.
    ///
    /// * Does not check that the path exists.
    /// * Does not initialize the containing directories.
    ///
    /// # Arguments
    /// * `context` - prefix dirs, inserted between `self.cache_dir` and `file`.
    /// * `file` - the final file name.
    pub fn cache_path<C, F>(
        &self,
        context: &[C],
        file: F,
    ) -> PathBuf
    where
        C: AsRef<Path>,
        F: AsRef<Path>,
    {
        path_utils::extend_path(&self.cache_dir, context, file)
    }

    /// Get the cache path a url would be stored at.
    ///
    /// The file name is the last path segment of `url`.
    pub fn url_cache_path<C: AsRef<Path>>(
        &self,
        context: &[C],
        url: &str,
    ) -> anyhow::Result<PathBuf> {
        let file_name = path_utils::url_file_name(url)
            .with_context(|| format!("url has no file name: {url}"))?;
        Ok(self.cache_path(context, file_name))
    }

    /// Returns the local path of `url`, downloading it first if it is not cached.
    ///
    /// # Arguments
    /// * `context` - prefix dirs under the cache directory.
    /// * `url` - the remote file.
    ///
    /// # Errors
    /// * The url has no file name.
    /// * The cache directory cannot be created.
    /// * The download fails; no partial file is left behind.
    pub fn maybe_download<C: AsRef<Path>>(
        &mut self,
        context: &[C],
        url: &str,
    ) -> anyhow::Result<PathBuf> {
        self.load_cached_path(context, url, true)
    }

    /// Loads a cached file, or downloads it if it does not exist.
    ///
    /// # Errors
    /// * Returns an error if the cached file does not exist and `download` is `false`.
    /// * Returns an error if the downloading process fails.
    pub fn load_cached_path<C: AsRef<Path>>(
        &mut self,
        context: &[C],
        url: &str,
        download: bool,
    ) -> anyhow::Result<PathBuf> {
        let path = self.url_cache_path(context, url)?;

        if path.exists() {
            log::debug!("cache hit: {}", path.display());
            return Ok(path);
        }

        if !download {
            anyhow::bail!("cached file not found: {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        log::info!("downloading {url} -> {}", path.display());
        let results = self
            .downloader()?
            .download(&[Download::new(url).file_name(&path)])
            .with_context(|| format!("download failed: {url}"))?;

        for result in results {
            if let Err(err) = result {
                let _ = fs::remove_file(&path);
                anyhow::bail!("download failed: {url}: {err:?}");
            }
        }

        if !path.exists() {
            anyhow::bail!("download produced no file: {url}");
        }

        Ok(path)
    }
}
