use fedstack::{
    stackoverflow::{self, Split},
    tokenizer::DOMAIN_ID_FEATURE,
    types::client_id_display,
};

use crate::{dataset::DatasetArgs, logging::LogArgs};

/// Args for the inspect command.
#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Split to inspect.
    #[arg(long, value_parser = Split::parse)]
    split: Split,

    /// Max number of clients to list.
    #[arg(long, default_value = None)]
    limit: Option<usize>,

    #[command(flatten)]
    dataset: DatasetArgs,
}

impl InspectArgs {
    /// Run the inspect command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let mut loader = self.dataset.init_loader()?;
        let data = loader
            .load_split(self.split)?
            .preprocess_client(stackoverflow::preprocess_client);

        let client_ids = data.client_ids()?;
        log::info!("{}: {} clients", self.split, client_ids.len());

        println!("client_id\tnum_examples\tnum_answers");
        for client_id in client_ids.iter().take(self.limit.unwrap_or(usize::MAX)) {
            let examples = data.get_client(client_id)?;
            let num_answers: i32 = examples.int32(DOMAIN_ID_FEATURE)?.iter().sum();
            println!(
                "{}\t{}\t{num_answers}",
                client_id_display(client_id),
                examples.num_examples()?
            );
        }

        Ok(())
    }
}
