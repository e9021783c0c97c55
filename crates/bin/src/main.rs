//! Quill CLI binary.
//!
//! Command-line interface for corpus extraction, book-aware splitting,
//! cross-validation, training and feature inspection.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use quill::LabelEncoder;
use quill::schema::{AUTHOR, BOOK};
use quill::traits::{Classifier, FeatureAssembly};
use quill_data::{
    CorpusOptions, LoadOptions, attach_book_counts, attach_class_weights, attach_count_features,
    load_author_segments, load_dataset,
};
use quill_features::TfidfParams;
use quill_model::{
    Averaging, CrossvalConfig, SoftmaxRegression, SplitConfig, TrainConfig, VectorizerSpec,
    books_cross_val, get_encoders, get_top_features, select_sample, train_crossval_twofold,
    train_test_split,
};

/// Stylometric count columns attachable alongside the TF-IDF features.
const COUNT_COLUMNS: [&str; 4] = ["word_count", "avg_word_len", "punct_density", "upper_ratio"];

/// Output format of the reporting subcommands.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Machine-readable JSON
    Json,
}

/// F1 averaging mode, mirrored from the engine for parse-time validation.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AveragingArg {
    Micro,
    Macro,
    Weighted,
}

impl From<AveragingArg> for Averaging {
    fn from(arg: AveragingArg) -> Self {
        match arg {
            AveragingArg::Micro => Self::Micro,
            AveragingArg::Macro => Self::Macro,
            AveragingArg::Weighted => Self::Weighted,
        }
    }
}

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Quill: book-aware authorship attribution", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a dataset CSV from a corpus of plain-text books
    Extract {
        /// Corpus root: one directory per author, one file per book
        corpus: PathBuf,

        /// Output CSV path
        #[arg(long, short)]
        output: PathBuf,

        /// Character budget per segment
        #[arg(long, default_value = "3000")]
        symbol_limit: usize,

        /// Trailing books per author reserved for held-out evaluation
        #[arg(long, default_value = "0")]
        reserved: usize,

        /// Attach stylometric count columns
        #[arg(long)]
        count_features: bool,
    },

    /// Show a book-aware train/test split of a dataset
    Split {
        /// Dataset CSV (author, book, text columns)
        dataset: PathBuf,

        /// Target train share
        #[arg(long, default_value = "0.5")]
        share: f64,

        /// Shuffle seed
        #[arg(long, default_value = "10")]
        seed: u64,

        /// Require at least two distinct books per author
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show leakage-free k-fold cross-validation folds
    Crossval {
        /// Dataset CSV
        dataset: PathBuf,

        /// Number of folds
        #[arg(long, short, default_value = "5")]
        k: usize,

        /// Shuffle seed
        #[arg(long, default_value = "10")]
        seed: u64,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Draw a class-balanced weighted sample from a dataset
    Sample {
        /// Dataset CSV
        dataset: PathBuf,

        /// Sample size as a fraction of the frame height (may exceed 1)
        #[arg(long, default_value = "1.0")]
        fraction: f64,

        /// Draw seed
        #[arg(long, default_value = "10")]
        seed: u64,

        /// Output CSV path
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Train and score a softmax classifier with two-fold cross-validation
    Train {
        /// Dataset CSV
        dataset: PathBuf,

        /// Train share of the underlying split
        #[arg(long, default_value = "0.5")]
        share: f64,

        /// Split seed
        #[arg(long, default_value = "10")]
        seed: u64,

        /// F1 averaging mode
        #[arg(long, value_enum, default_value = "micro")]
        averaging: AveragingArg,

        /// Include stylometric count columns as raw features
        #[arg(long)]
        count_features: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rank the highest-weighted features per author
    TopFeatures {
        /// Dataset CSV
        dataset: PathBuf,

        /// Features to rank per author
        #[arg(long, short, default_value = "10")]
        n: usize,

        /// Include stylometric count columns as raw features
        #[arg(long)]
        count_features: bool,

        /// Output CSV path (prints to stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            corpus,
            output,
            symbol_limit,
            reserved,
            count_features,
        } => extract(&corpus, &output, symbol_limit, reserved, count_features),
        Commands::Split {
            dataset,
            share,
            seed,
            strict,
            format,
        } => split(&dataset, share, seed, strict, format),
        Commands::Crossval {
            dataset,
            k,
            seed,
            format,
        } => crossval(&dataset, k, seed, format),
        Commands::Sample {
            dataset,
            fraction,
            seed,
            output,
        } => sample(&dataset, fraction, seed, &output),
        Commands::Train {
            dataset,
            share,
            seed,
            averaging,
            count_features,
            format,
        } => train(&dataset, share, seed, averaging, count_features, format),
        Commands::TopFeatures {
            dataset,
            n,
            count_features,
            output,
        } => top_features(&dataset, n, count_features, output.as_deref()),
    }
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

fn load(dataset: &Path, count_features: bool) -> Result<DataFrame, Box<dyn std::error::Error>> {
    let options = LoadOptions {
        with_weights: true,
        with_count_features: count_features,
    };
    Ok(load_dataset(dataset, &options)?)
}

fn distinct_books(df: &DataFrame) -> Result<usize, Box<dyn std::error::Error>> {
    let books = df.column(BOOK)?.str()?;
    let distinct: HashSet<&str> = books.into_iter().flatten().collect();
    Ok(distinct.len())
}

fn feature_columns(count_features: bool) -> Vec<&'static str> {
    if count_features {
        COUNT_COLUMNS.to_vec()
    } else {
        Vec::new()
    }
}

fn text_spec() -> VectorizerSpec {
    let mut spec = VectorizerSpec::new();
    spec.insert(quill::schema::TEXT.to_string(), TfidfParams::default());
    spec
}

fn extract(
    corpus: &Path,
    output: &Path,
    symbol_limit: usize,
    reserved: usize,
    count_features: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = CorpusOptions {
        symbol_limit,
        reserved_evaluation_books: reserved,
    };

    let mut author_names: Vec<String> = std::fs::read_dir(corpus)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    author_names.sort();

    let pb = ProgressBar::new(author_names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut authors = Vec::new();
    let mut books = Vec::new();
    let mut texts = Vec::new();
    for author in &author_names {
        pb.set_message(author.clone());
        for (book, segment) in load_author_segments(corpus, author, &options)? {
            authors.push(author.clone());
            books.push(book);
            texts.push(segment);
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!(
        "{} authors, {} segments",
        author_names.len(),
        authors.len()
    ));

    let mut df = DataFrame::new(vec![
        Column::new(AUTHOR.into(), authors),
        Column::new(BOOK.into(), books),
        Column::new(quill::schema::TEXT.into(), texts),
    ])?;
    attach_book_counts(&mut df)?;
    attach_class_weights(&mut df)?;
    if count_features {
        attach_count_features(&mut df)?;
    }

    write_csv(&mut df, output)?;
    println!("Wrote {} rows to {}", df.height(), output.display());
    Ok(())
}

fn split(
    dataset: &Path,
    share: f64,
    seed: u64,
    strict: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let df = load(dataset, false)?;
    let config = SplitConfig {
        share,
        seed,
        cross_val: strict,
    };
    let result = train_test_split(&df, &config)?;

    let train_share = result.train.height() as f64 / df.height() as f64;
    if matches!(format, OutputFormat::Json) {
        let output = json!({
            "share": share,
            "seed": seed,
            "rows": df.height(),
            "train_rows": result.train.height(),
            "test_rows": result.test.height(),
            "train_books": distinct_books(&result.train)?,
            "test_books": distinct_books(&result.test)?,
            "achieved_share": train_share,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Book-aware split of {}", dataset.display());
        println!("  Target share:    {:.3}", share);
        println!("  Achieved share:  {:.3}", train_share);
        println!(
            "  Train:           {} rows, {} books",
            result.train.height(),
            distinct_books(&result.train)?
        );
        println!(
            "  Test:            {} rows, {} books",
            result.test.height(),
            distinct_books(&result.test)?
        );
    }
    Ok(())
}

fn crossval(
    dataset: &Path,
    k: usize,
    seed: u64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let df = load(dataset, false)?;
    let config = CrossvalConfig { k, seed };

    let mut folds = Vec::new();
    for (i, fold) in books_cross_val(&df, &config)?.enumerate() {
        let fold = fold?;
        folds.push((i, fold.train_idx.len(), fold.test_idx.len()));
    }

    if matches!(format, OutputFormat::Json) {
        let entries: Vec<_> = folds
            .iter()
            .map(|(i, train, test)| {
                json!({ "fold": i, "train_rows": train, "test_rows": test })
            })
            .collect();
        let output = json!({
            "k": k,
            "seed": seed,
            "rows": df.height(),
            "folds": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}-fold cross-validation of {}", k, dataset.display());
        for (i, train, test) in &folds {
            println!("  Fold {}: {} train rows, {} held out", i, train, test);
        }
    }
    Ok(())
}

fn sample(
    dataset: &Path,
    fraction: f64,
    seed: u64,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let df = load(dataset, false)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sampled = select_sample(&df, fraction, &mut rng)?;
    write_csv(&mut sampled, output)?;
    println!(
        "Drew {} rows from {} into {}",
        sampled.height(),
        df.height(),
        output.display()
    );
    Ok(())
}

fn train(
    dataset: &Path,
    share: f64,
    seed: u64,
    averaging: AveragingArg,
    count_features: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let df = load(dataset, count_features)?;
    let config = TrainConfig {
        split: share,
        seed,
        averaging: averaging.into(),
    };

    let mut clf = SoftmaxRegression::default();
    let scores = train_crossval_twofold(
        &df,
        &mut clf,
        &feature_columns(count_features),
        Some(&text_spec()),
        &config,
    )?;
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;

    if matches!(format, OutputFormat::Json) {
        let output = json!({
            "averaging": config.averaging.to_string(),
            "share": share,
            "seed": seed,
            "fold_scores": scores,
            "mean_score": mean,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Two-fold training on {}", dataset.display());
        println!("  F1 averaging:  {}", config.averaging);
        for (i, score) in scores.iter().enumerate() {
            println!("  Fold {}:        {:.4}", i, score);
        }
        println!("  Mean:          {:.4}", mean);
    }
    Ok(())
}

fn top_features(
    dataset: &Path,
    n: usize,
    count_features: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let df = load(dataset, count_features)?;

    // Fitted on the full frame: importance ranking wants every author's
    // vocabulary represented, not a held-out estimate.
    let (assembly, encoder) = get_encoders(
        &df,
        &df,
        &feature_columns(count_features),
        Some(&text_spec()),
    )?;
    let x = assembly.transform(&df)?;
    let y = encode_labels(&df, &encoder)?;

    let mut clf = SoftmaxRegression::default();
    clf.fit(x.view(), &y)?;

    let mut ranked = get_top_features(&encoder, &assembly, &clf, n)?;
    match output {
        Some(path) => {
            write_csv(&mut ranked, path)?;
            println!("Wrote top {} features per author to {}", n, path.display());
        }
        None => println!("{}", ranked),
    }
    Ok(())
}

fn encode_labels(
    df: &DataFrame,
    encoder: &LabelEncoder,
) -> Result<Vec<usize>, Box<dyn std::error::Error>> {
    let authors = df.column(AUTHOR)?.str()?;
    let labels: Vec<&str> = authors.into_iter().flatten().collect();
    Ok(encoder.transform(labels)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_output_format_is_rejected_at_parse_time() {
        assert!(
            Cli::try_parse_from(["quill", "split", "data.csv", "--format", "yaml"]).is_err()
        );
    }

    #[test]
    fn unknown_averaging_mode_is_rejected_at_parse_time() {
        assert!(
            Cli::try_parse_from(["quill", "train", "data.csv", "--averaging", "median"]).is_err()
        );
    }

    #[test]
    fn averaging_flag_maps_onto_the_engine_mode() {
        let cli =
            Cli::try_parse_from(["quill", "train", "data.csv", "--averaging", "weighted"]).unwrap();
        let Commands::Train { averaging, .. } = cli.command else {
            panic!("expected the train subcommand");
        };
        assert_eq!(Averaging::from(averaging), Averaging::Weighted);
    }
}
