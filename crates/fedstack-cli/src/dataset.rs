use fedstack::stackoverflow::{DEFAULT_BASE_URL, DatasetSource, StackoverflowLoader};

use crate::disk_cache::DiskCacheArgs;

/// Dataset location argument group.
#[derive(clap::Args, Debug)]
pub struct DatasetArgs {
    /// Directory url holding the `stackoverflow_{split}.sqlite` files.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(flatten)]
    disk_cache: DiskCacheArgs,
}

impl DatasetArgs {
    /// Initialize a split loader.
    pub fn init_loader(&self) -> Result<StackoverflowLoader, Box<dyn std::error::Error>> {
        Ok(StackoverflowLoader::new(
            DatasetSource::new(self.base_url.clone()),
            self.disk_cache.init_disk_cache()?,
        ))
    }
}
