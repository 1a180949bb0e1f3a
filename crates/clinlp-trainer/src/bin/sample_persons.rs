//! Sample masked person sentences from an anonymized corpus.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clinlp_core::sampler::{PersonSentenceSampler, SAMPLE_FILE_NAME, SamplerConfig, write_csv};
use clinlp_trainer::cli::{init_tracing, parse_or_usage};

#[derive(Parser)]
#[command(name = "sample-persons")]
#[command(about = "Build a masked person-sentence evaluation set")]
#[command(version)]
struct Cli {
    /// Anonymized text corpus
    source_txt: PathBuf,

    /// Directory receiving anonymized_sentences.csv
    output_dir: PathBuf,

    /// Seed for a reproducible sample
    #[arg(long, env = "CLINLP_SEED")]
    seed: Option<u64>,

    #[arg(long, env = "CLINLP_MARKER", default_value = "PERSON")]
    marker: String,

    #[arg(long, env = "CLINLP_MASK", default_value = "<mask>")]
    mask: String,

    #[arg(long, env = "CLINLP_SAMPLE_SIZE", default_value_t = 40)]
    sample_size: usize,
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = parse_or_usage();
    init_tracing();

    let mut config = SamplerConfig::new()
        .with_marker(&cli.marker)
        .with_mask(&cli.mask)
        .with_sample_size(cli.sample_size);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let records = PersonSentenceSampler::new(config)
        .build_dataset(&cli.source_txt)
        .with_context(|| format!("failed to sample {}", cli.source_txt.display()))?;

    std::fs::create_dir_all(&cli.output_dir)?;
    let output = cli.output_dir.join(SAMPLE_FILE_NAME);
    write_csv(&records, &output)?;

    println!("Wrote {} sentences to {}", records.len(), output.display());
    Ok(())
}
