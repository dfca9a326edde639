//! `ncd`: compression-distance matrices from the command line.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::LevelFilter;

use ncd_matrix::bridge::{self, SourceOptions};
use ncd_matrix::observability::init_logging;
use ncd_matrix::{
    CompressionOracle, FailurePolicy, Item, MatrixBuilder, NcdCalculator, NcdConfig, NcdError,
    SimilaritySearch,
};

/// Normalized compression distance tool.
#[derive(Debug, Parser)]
#[command(name = "ncd", version)]
#[command(about = "Pairwise normalized compression distances between items")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file. Flags below override its fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Compressor: zlib, deflate, zstd or lz4.
    #[arg(long, global = true)]
    algorithm: Option<String>,
    /// Explicit compression level; overrides --profile.
    #[arg(long, global = true, allow_negative_numbers = true)]
    level: Option<i32>,
    /// fast, balanced or high_compression.
    #[arg(long, global = true)]
    profile: Option<String>,
    /// ncd or mcd.
    #[arg(long, global = true)]
    metric: Option<String>,
    /// utf8, ascii or latin1.
    #[arg(long, global = true)]
    encoding: Option<String>,
    /// Record failed cells and keep going instead of aborting.
    #[arg(long, global = true)]
    best_effort: bool,
    /// Compute with all cores.
    #[arg(long, global = true)]
    parallel: bool,
    /// -v for info, -vv for debug.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Append log output to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the full distance matrix.
    Matrix {
        /// Delimited file with one item per record.
        #[arg(long, conflicts_with = "files")]
        csv: Option<PathBuf>,
        /// The delimited file has no header line.
        #[arg(long)]
        no_header: bool,
        /// Files to compare, one item per file.
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        /// Decimal places for CSV output.
        #[arg(long)]
        precision: Option<usize>,
    },
    /// Distance between two literal strings.
    Pair { a: String, b: String },
    /// Items of a delimited file within the similarity threshold of a query.
    Similar {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        no_header: bool,
        #[arg(long)]
        query: String,
        #[arg(long)]
        threshold: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), NcdError> {
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    init_logging(level, cli.log_file.as_deref())?;

    let mut config = load_config(&cli)?;
    let oracle = CompressionOracle::from_config(&config)?;

    match cli.command {
        Command::Matrix {
            csv,
            no_header,
            files,
            format,
            precision,
        } => {
            let items = match csv {
                Some(path) => bridge::read_items_from_path(
                    path,
                    &SourceOptions {
                        has_header: !no_header,
                        encoding: config.encoding,
                    },
                )?,
                None if !files.is_empty() => bridge::read_items_from_files(&files)?,
                None => {
                    return Err(NcdError::Configuration(
                        "matrix needs --csv FILE or at least one input file".to_string(),
                    ))
                }
            };
            let builder = MatrixBuilder::from_config(&oracle, &config);
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            match format {
                OutputFormat::Csv => {
                    let mut failed = 0;
                    for row in builder.rows(&items)? {
                        let row = row?;
                        failed += row.failures.len();
                        bridge::write_csv_row(&mut out, &row.values, precision)?;
                    }
                    out.flush()?;
                    if failed > 0 {
                        eprintln!(
                            "{} {} cells could not be computed",
                            "warning:".yellow().bold(),
                            failed
                        );
                    }
                }
                OutputFormat::Json => {
                    let matrix = builder.build(&items)?;
                    writeln!(out, "{}", bridge::to_json(&matrix)?)?;
                    out.flush()?;
                }
            }
        }
        Command::Pair { a, b } => {
            let calc = NcdCalculator::new(&oracle).with_encoding(config.encoding);
            let breakdown = calc.breakdown(config.metric, &Item::Text(a), &Item::Text(b))?;
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
        }
        Command::Similar {
            csv,
            no_header,
            query,
            threshold,
        } => {
            if let Some(threshold) = threshold {
                config.similarity_threshold = threshold;
                config.validate()?;
            }
            let items = bridge::read_items_from_path(
                csv,
                &SourceOptions {
                    has_header: !no_header,
                    encoding: config.encoding,
                },
            )?;
            let hits = SimilaritySearch::from_config(&oracle, &config)
                .find_similar(&Item::Text(query), &items)?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
    }
    Ok(())
}

/// Starts from the config file (or defaults) and applies flag overrides.
fn load_config(cli: &Cli) -> Result<NcdConfig, NcdError> {
    let mut config = match &cli.config {
        Some(path) => NcdConfig::from_json_file(path)?,
        None => NcdConfig::default(),
    };
    if let Some(algorithm) = &cli.algorithm {
        config.algorithm = algorithm.parse()?;
    }
    if let Some(profile) = &cli.profile {
        config.profile = profile.parse()?;
    }
    if cli.level.is_some() {
        config.level = cli.level;
    }
    if let Some(metric) = &cli.metric {
        config.metric = metric.parse()?;
    }
    if let Some(encoding) = &cli.encoding {
        config.encoding = encoding.parse()?;
    }
    if cli.best_effort {
        config.failure_policy = FailurePolicy::BestEffort;
    }
    if cli.parallel {
        config.parallel = true;
    }
    config.validate()?;
    Ok(config)
}
