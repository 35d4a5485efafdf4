use std::io::{BufRead, Write};

use fedstack::{
    examples::{Examples, Feature},
    tokenizer::{
        DEFAULT_NUM_OOV_BUCKETS,
        PreprocessBatch,
        StackoverflowTokenizer,
        TOKENS_FEATURE,
        X_FEATURE,
        Y_FEATURE,
    },
};

use crate::{
    input_output::{InputArgs, OutputArgs},
    logging::LogArgs,
    vocab_args::VocabArgs,
};

/// Args for the tokenize command.
///
/// Each input line is one token string; each output line is
/// `{x ids}\t{y ids}`, space separated.
#[derive(clap::Args, Debug)]
pub struct TokenizeArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Output sequence length.
    #[arg(long)]
    max_length: usize,

    /// Number of out-of-vocabulary buckets.
    #[arg(long, default_value_t = DEFAULT_NUM_OOV_BUCKETS)]
    num_oov_buckets: usize,

    /// Lines tokenized per batch.
    #[arg(long, default_value_t = 1024)]
    batch_size: usize,

    #[command(flatten)]
    vocab: VocabArgs,

    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,
}

impl TokenizeArgs {
    /// Run the tokenize command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let words = self.vocab.load_vocab()?;
        let tokenizer = StackoverflowTokenizer::new(&words, self.num_oov_buckets)?;
        log::info!(
            "vocab_size={} num_oov_buckets={} total_size={}",
            tokenizer.vocab_size(),
            tokenizer.num_oov_buckets(),
            tokenizer.total_size()
        );
        let preprocess = tokenizer.as_preprocess_batch(self.max_length);

        let reader = self.input.open_reader()?;
        let mut writer = self.output.open_writer()?;

        let mut lines = Vec::with_capacity(self.batch_size.max(1));
        for line in reader.lines() {
            lines.push(line?);
            if lines.len() >= self.batch_size {
                write_batch(&preprocess, &lines, &mut writer)?;
                lines.clear();
            }
        }
        if !lines.is_empty() {
            write_batch(&preprocess, &lines, &mut writer)?;
        }
        writer.flush()?;

        Ok(())
    }
}

fn write_batch(
    preprocess: &PreprocessBatch,
    lines: &[String],
    writer: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let batch = Examples::new().with_feature(TOKENS_FEATURE, Feature::bytes_from(lines));
    let out = preprocess.apply(&batch)?;

    for idx in 0..lines.len() {
        let x = out.get(X_FEATURE).and_then(|f| f.row(idx)).unwrap_or_default();
        let y = out.get(Y_FEATURE).and_then(|f| f.row(idx)).unwrap_or_default();
        writeln!(writer, "{}\t{}", format_ids(x), format_ids(y))?;
    }
    Ok(())
}

fn format_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_batch() {
        let tokenizer = StackoverflowTokenizer::new(&["a", "b"], 1).unwrap();
        let preprocess = tokenizer.as_preprocess_batch(4);

        let mut buf: Vec<u8> = Vec::new();
        write_batch(
            &preprocess,
            &["a b".to_string(), "".to_string()],
            &mut buf,
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "1 3 4 0\t3 4 2 0\n1 0 0 0\t2 0 0 0\n"
        );
    }
}
