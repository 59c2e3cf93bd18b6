//! CLI entry point for the vector operations engine.
//!
//! Provides commands for probing the native library, scoring embeddings,
//! fingerprinting content and validating embedding blobs.

use anyhow::{Context, Result};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_vector_ops::display::{ERROR_THEME, THEME, create_probe_table, create_scores_table};
use tessera_vector_ops::{
    EmbeddingMatrix, NativeBridge, Settings, SimilarityResult, decode_embedding_blob,
};
use tracing_subscriber::EnvFilter;

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Input was read but rejected, e.g. a malformed blob (code 3)
    InvalidInput = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Vector similarity engine
#[derive(Parser)]
#[command(
    name = "tessera-vecops",
    version = env!("CARGO_PKG_VERSION"),
    about = "Vector similarity engine with native acceleration",
    long_about = "Score embeddings, fingerprint content and validate embedding blobs. Uses the native library when it can be loaded and the Rust reference implementation otherwise.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up .tessera directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Load the native library and report its status
    Probe {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Score a query against embeddings from a JSON file
    #[command(
        after_help = "Input format:\n  {\"query\": [1.0, 0.0], \"embeddings\": [[1.0, 0.0], [0.0, 1.0]]}"
    )]
    Similarity {
        /// JSON file with `query` and `embeddings`
        input: PathBuf,

        /// Keep only rows scoring strictly above this value
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Use native code only; print nothing if it is unavailable
        #[arg(long)]
        raw: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the content fingerprint of a file
    Hash {
        /// File to fingerprint
        file: PathBuf,
    },

    /// Check that a file is a well-formed embedding blob
    Validate {
        /// Blob file (native-endian f32 values)
        file: PathBuf,

        /// Print the decoded magnitude as well
        #[arg(long)]
        magnitude: bool,
    },
}

#[derive(Debug, Deserialize)]
struct SimilarityInput {
    query: Vec<f32>,
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct ScoreEntry {
    index: u32,
    score: f32,
}

#[derive(Debug, Serialize)]
struct SimilarityOutput {
    native: bool,
    threshold: Option<f32>,
    count: usize,
    results: Vec<ScoreEntry>,
}

#[derive(Debug, Serialize)]
struct ProbeOutput {
    state: String,
    loaded_path: Option<String>,
    native_version: Option<String>,
    native_simd: Option<bool>,
    reason: Option<String>,
    candidates: Vec<String>,
}

fn load_settings(config: Option<&Path>) -> Settings {
    let loaded = match config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration.");
        Settings::default()
    })
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn init_thread_pool(settings: &Settings) {
    let threads = settings.compute.parallel_threads.max(1);
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        tracing::debug!("rayon pool already configured: {e}");
    }
}

fn init_bridge(settings: &Settings) {
    if NativeBridge::install_global(NativeBridge::from_settings(settings)).is_err() {
        tracing::debug!("native bridge already installed");
    }
}

fn main() {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref());
    init_logging(&settings);
    init_thread_pool(&settings);
    init_bridge(&settings);

    let code = match run(cli.command, &settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", ERROR_THEME.error_with_icon(&format!("{e:#}")));
            ExitCode::GeneralError
        }
    };
    std::process::exit(code.into());
}

fn run(command: Commands, settings: &Settings) -> Result<ExitCode> {
    match command {
        Commands::Init { force } => {
            let current_dir = std::env::current_dir().context("cannot read current directory")?;
            let path = Settings::init_config_file(&current_dir, force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!(
                "{}",
                THEME.success_with_icon(&format!("Created configuration at: {}", path.display()))
            );
            Ok(ExitCode::Success)
        }

        Commands::Config => {
            let rendered = toml::to_string_pretty(settings).context("cannot render settings")?;
            println!("{rendered}");
            Ok(ExitCode::Success)
        }

        Commands::Probe { json } => {
            let bridge = NativeBridge::global();
            if json {
                // Probing loads the library before the state is read
                bridge.is_available();
                let output = ProbeOutput {
                    state: bridge.state().to_string(),
                    loaded_path: bridge.loaded_path().map(|p| p.display().to_string()),
                    native_version: bridge.native_version(),
                    native_simd: bridge.native_has_simd(),
                    reason: bridge.unavailable_reason().map(str::to_string),
                    candidates: bridge
                        .candidates()
                        .paths()
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", create_probe_table(bridge));
                if let Err(e) = bridge.ensure_available() {
                    for suggestion in e.recovery_suggestions() {
                        println!("{}", THEME.warning_with_icon(suggestion));
                    }
                }
            }
            Ok(ExitCode::Success)
        }

        Commands::Similarity {
            input,
            threshold,
            raw,
            json,
        } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            let parsed: SimilarityInput = serde_json::from_str(&content)
                .with_context(|| format!("invalid similarity input in {}", input.display()))?;
            let matrix = EmbeddingMatrix::from_rows(&parsed.embeddings)?;

            let bridge = NativeBridge::global();
            let results: Vec<SimilarityResult> = match (threshold, raw) {
                (Some(t), false) => bridge
                    .batch_similarity_with_threshold(&parsed.query, &matrix, t)
                    .iter()
                    .collect(),
                (Some(t), true) => bridge
                    .raw_batch_similarity_with_threshold(&parsed.query, &matrix, t)
                    .iter()
                    .collect(),
                (None, raw) => {
                    let scores = if raw {
                        bridge.raw_batch_cosine_similarity(&parsed.query, &matrix)
                    } else {
                        bridge.batch_cosine_similarity(&parsed.query, &matrix)
                    };
                    scores
                        .into_iter()
                        .enumerate()
                        .map(|(index, score)| SimilarityResult {
                            index: index as u32,
                            score,
                        })
                        .collect()
                }
            };

            if json {
                let output = SimilarityOutput {
                    native: bridge.is_available(),
                    threshold,
                    count: results.len(),
                    results: results
                        .iter()
                        .map(|r| ScoreEntry {
                            index: r.index,
                            score: r.score,
                        })
                        .collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", create_scores_table(&results));
                if !bridge.is_available() {
                    eprintln!(
                        "{}",
                        ERROR_THEME.warning_with_icon(if raw {
                            "native library unavailable, raw results are empty"
                        } else {
                            "native library unavailable, used Rust reference implementation"
                        })
                    );
                }
            }
            Ok(ExitCode::Success)
        }

        Commands::Hash { file } => {
            let content =
                std::fs::read(&file).with_context(|| format!("cannot read {}", file.display()))?;
            let bridge = NativeBridge::global();
            println!("{}  {}", bridge.hash_content(&content), file.display());
            Ok(ExitCode::Success)
        }

        Commands::Validate { file, magnitude } => {
            let content =
                std::fs::read(&file).with_context(|| format!("cannot read {}", file.display()))?;
            let bridge = NativeBridge::global();

            if !bridge.validate_embedding_blob(Some(&content)) {
                println!(
                    "{}",
                    THEME.error_with_icon(&format!(
                        "{}: {} bytes is not a whole number of f32 values",
                        file.display(),
                        content.len()
                    ))
                );
                return Ok(ExitCode::InvalidInput);
            }

            let values = decode_embedding_blob(&content)?;
            let mut message = format!("{}: {} dimensions", file.display(), values.len());
            if magnitude {
                message.push_str(&format!(", magnitude {:.6}", bridge.vector_magnitude(&values)));
            }
            println!("{}", THEME.success_with_icon(&message));
            Ok(ExitCode::Success)
        }
    }
}
