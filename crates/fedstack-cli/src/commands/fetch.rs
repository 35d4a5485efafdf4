use fedstack::{
    stackoverflow::{SPLITS, Split},
    vocab::{DEFAULT_VOCAB_URL, VOCAB_CACHE_CONTEXT},
};

use crate::{dataset::DatasetArgs, logging::LogArgs};

/// Args for the fetch command.
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Splits to fetch (repeatable); all splits when omitted.
    #[arg(long = "split", value_parser = Split::parse)]
    splits: Vec<Split>,

    /// Also fetch the default vocabulary.
    #[arg(long)]
    vocab: bool,

    #[command(flatten)]
    dataset: DatasetArgs,
}

impl FetchArgs {
    /// Run the fetch command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let splits = if self.splits.is_empty() {
            SPLITS.to_vec()
        } else {
            self.splits.clone()
        };

        let mut loader = self.dataset.init_loader()?;
        for split in splits {
            let path = loader.split_path(split)?;
            println!("{split}\t{}", path.display());
        }

        if self.vocab {
            let path = loader
                .disk_cache()
                .maybe_download(&[VOCAB_CACHE_CONTEXT], DEFAULT_VOCAB_URL)?;
            println!("vocab\t{}", path.display());
        }

        Ok(())
    }
}
