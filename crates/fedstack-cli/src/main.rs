mod commands;
mod dataset;
mod disk_cache;
mod input_output;
mod logging;
mod vocab_args;

use clap::Parser;
use commands::Commands;

/// fstack: federated StackOverflow data tools.
#[derive(clap::Parser, Debug)]
pub struct Args {
    /// Subcommand to run.
    #[clap(subcommand)]
    pub command: Commands,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    args.command.run()
}
