//! Train and evaluate a tagger on the CoNLL-2002 Dutch NER task.

use std::path::PathBuf;

use clap::Parser;
use clinlp_trainer::cli::{init_tracing, parse_or_usage};
use clinlp_trainer::ner::{NerConfig, NerRunner};

#[derive(Parser)]
#[command(name = "run-ner")]
#[command(about = "Train on CoNLL data and report entity-level scores")]
#[command(version)]
struct Cli {
    /// Labeler to train: perceptron (alias crf)
    model_type: String,

    /// Weights to start from; used only if the file exists
    model_path: PathBuf,

    training_data: PathBuf,

    evaluation_data: PathBuf,

    #[arg(long, env = "CLINLP_EPOCHS", default_value_t = 5)]
    epochs: usize,

    /// Write the trained weights here
    #[arg(long, env = "CLINLP_SAVE")]
    save: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = parse_or_usage();
    init_tracing();

    let mut config = NerConfig::new().with_epochs(cli.epochs);
    if let Some(path) = cli.save {
        config = config.with_save_path(path);
    }

    let report = NerRunner::new(
        cli.model_type,
        cli.model_path,
        cli.training_data,
        cli.evaluation_data,
    )
    .with_config(config)
    .run()?;

    println!("{report}");
    println!("{}", serde_json::to_string(&report.summary())?);
    Ok(())
}
