//! Anonymize a table of clinical notes into a sentence-chunked text corpus.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clinlp_core::anonymize::NoteAnonymizer;
use clinlp_core::corpus::{ChunkConfig, ChunkWriter, CorpusBuilder, CorpusConfig};
use clinlp_core::pipeline::{
    EntityRecognizer, NeuralRecognizer, RuleRecognizer, RuleRecognizerConfig, RuleSegmenter,
};
use clinlp_trainer::cli::{init_tracing, parse_or_usage};

#[derive(Parser)]
#[command(name = "gather-corpus")]
#[command(about = "Anonymize clinical notes and append them to a chunked text corpus")]
#[command(version)]
struct Cli {
    /// Comma-separated table with a header row
    input_csv: PathBuf,

    /// Corpus file, opened for append
    output_txt: PathBuf,

    /// Header of the column holding the note text
    text_column: String,

    /// Extra place names, one per line
    #[arg(long, env = "CLINLP_PLACES")]
    places: Option<PathBuf>,

    /// Person names, one per line
    #[arg(long, env = "CLINLP_NAMES")]
    names: Option<PathBuf>,

    /// Token-classification model directory; replaces the rule recognizer
    #[arg(long, env = "CLINLP_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    #[arg(long, env = "CLINLP_SENTENCES_PER_CHUNK", default_value_t = 40)]
    sentences_per_chunk: usize,

    /// Chunk length reported as over the limit
    #[arg(long, env = "CLINLP_LENGTH_LIMIT", default_value_t = 512)]
    length_limit: usize,
}

fn recognizer(cli: &Cli) -> anyhow::Result<Box<dyn EntityRecognizer>> {
    if let Some(dir) = &cli.model_dir {
        return Ok(Box::new(NeuralRecognizer::load(dir)?));
    }

    let mut config = RuleRecognizerConfig::new();
    if let Some(path) = &cli.places {
        config = config
            .with_places_file(path)
            .with_context(|| format!("failed to read places from {}", path.display()))?;
    }
    if let Some(path) = &cli.names {
        config = config
            .with_names_file(path)
            .with_context(|| format!("failed to read names from {}", path.display()))?;
    }
    Ok(Box::new(RuleRecognizer::with_config(&config)?))
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = parse_or_usage();
    init_tracing();

    let builder = CorpusBuilder::new(
        NoteAnonymizer::new(recognizer(&cli)?),
        ChunkWriter::with_config(
            RuleSegmenter::new(),
            ChunkConfig::new().with_sentences_per_chunk(cli.sentences_per_chunk),
        ),
        CorpusConfig::new(&cli.text_column).with_length_limit(cli.length_limit),
    );

    let report = builder
        .process_data(&cli.input_csv, &cli.output_txt)
        .with_context(|| format!("failed to process {}", cli.input_csv.display()))?;

    println!("{}", report.stats()?);
    println!("Lines written: {}", report.lines_written());
    println!("Failed rows: {}", report.failed_rows());
    Ok(())
}
