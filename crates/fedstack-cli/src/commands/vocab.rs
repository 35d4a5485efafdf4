use std::io::Write;

use fedstack::tokenizer::StackoverflowTokenizer;

use crate::{input_output::OutputArgs, logging::LogArgs, vocab_args::VocabArgs};

/// Args for the vocab command.
#[derive(clap::Args, Debug)]
pub struct VocabCommandArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    #[command(flatten)]
    vocab: VocabArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl VocabCommandArgs {
    /// Run the vocab command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let words = self.vocab.load_vocab()?;
        log::info!("{} words", words.len());

        let mut writer = self.output.open_writer()?;
        for (idx, word) in words.iter().enumerate() {
            writeln!(
                writer,
                "{}\t{word}",
                idx + StackoverflowTokenizer::NUM_SPECIAL
            )?;
        }
        writer.flush()?;

        Ok(())
    }
}
