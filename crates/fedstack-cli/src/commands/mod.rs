mod fetch;
mod inspect;
mod tokenize;
mod vocab;

/// Subcommands for fstack
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Download dataset splits into the cache.
    Fetch(fetch::FetchArgs),

    /// List the clients of a split.
    Inspect(inspect::InspectArgs),

    /// Tokenize lines of space separated tokens into `x`/`y` id rows.
    Tokenize(tokenize::TokenizeArgs),

    /// Print vocabulary words with their token ids.
    Vocab(vocab::VocabCommandArgs),
}

impl Commands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Fetch(cmd) => cmd.run(),
            Commands::Inspect(cmd) => cmd.run(),
            Commands::Tokenize(cmd) => cmd.run(),
            Commands::Vocab(cmd) => cmd.run(),
        }
    }
}
