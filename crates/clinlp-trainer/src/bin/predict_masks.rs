//! Fill the masks of sampled sentences and tally the predictions.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clinlp_core::sampler::read_sentences;
use clinlp_trainer::cli::{init_tracing, parse_or_usage};
use clinlp_trainer::mask::{MaskConfig, MaskPredictor, tally, write_tally};
use clinlp_trainer::mlm::DistilBertFiller;

#[derive(Parser)]
#[command(name = "predict-masks")]
#[command(about = "Count masked-LM predictions over a sentence sample")]
#[command(version)]
struct Cli {
    /// Directory with tokenizer.json, config.json and model.safetensors
    model_dir: PathBuf,

    /// `;`-delimited table with a `sentences` column
    sentences_csv: PathBuf,

    /// Output frequency table
    output_csv: PathBuf,

    #[arg(long, env = "CLINLP_TOP_K", default_value_t = 40)]
    top_k: usize,

    /// Mask token of the model's tokenizer, e.g. `[MASK]` for BERT vocabularies
    #[arg(long, env = "CLINLP_MASK_TOKEN", default_value = "<mask>")]
    mask_token: String,

    /// Placeholder the sample carries, as passed to `sample-persons --mask`
    #[arg(long, env = "CLINLP_PLACEHOLDER", default_value = "<mask>")]
    placeholder: String,
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = parse_or_usage();
    init_tracing();

    let config = MaskConfig::new()
        .with_top_k(cli.top_k)
        .with_mask_token(&cli.mask_token)
        .with_placeholder(&cli.placeholder);
    let filler = DistilBertFiller::load(&cli.model_dir, &config.mask_token)
        .with_context(|| format!("failed to load model from {}", cli.model_dir.display()))?;

    let sentences = read_sentences(&cli.sentences_csv)
        .with_context(|| format!("failed to read {}", cli.sentences_csv.display()))?;

    let records = MaskPredictor::new(filler, config).predict(&sentences)?;
    let counts = tally(&records);
    write_tally(&counts, &cli.output_csv)?;

    println!(
        "{} distinct predictions over {} sentences saved to {}",
        counts.len(),
        records.len(),
        cli.output_csv.display()
    );
    Ok(())
}
