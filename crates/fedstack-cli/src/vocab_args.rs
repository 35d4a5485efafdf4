use fedstack::{
    tokenizer::DEFAULT_VOCAB_SIZE,
    vocab::{self, DEFAULT_VOCAB_URL, VocabSource},
};

use crate::disk_cache::DiskCacheArgs;

/// Vocabulary selection argument group.
#[derive(clap::Args, Debug)]
pub struct VocabArgs {
    /// Local word count file; when absent, `--vocab-url` is fetched through the cache.
    #[arg(long, default_value = None)]
    vocab_file: Option<String>,

    /// Word count file url.
    #[arg(long, default_value = DEFAULT_VOCAB_URL)]
    vocab_url: String,

    /// Number of leading words to keep.
    #[arg(long, default_value_t = DEFAULT_VOCAB_SIZE)]
    vocab_size: usize,

    #[command(flatten)]
    disk_cache: DiskCacheArgs,
}

impl VocabArgs {
    /// Load the selected vocabulary words, most frequent first.
    pub fn load_vocab(&self) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let words = match &self.vocab_file {
            Some(path) => {
                log::info!("vocab file: {path}");
                vocab::load_vocab_path(path, Some(self.vocab_size))?
            }
            None => {
                log::info!("vocab url: {}", self.vocab_url);
                let mut disk_cache = self.disk_cache.init_disk_cache()?;
                VocabSource::new(self.vocab_url.clone())
                    .load(Some(self.vocab_size), &mut disk_cache)?
            }
        };
        Ok(words)
    }
}
