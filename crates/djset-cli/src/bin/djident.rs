//! djident - Identify the tracks of a DJ set recording
//!
//! Usage:
//!   djident <audio>                          # Uses config.toml if present
//!   djident --config <path> <audio>          # Uses custom config
//!   djident --fingerprints store.djfp --json <audio>

use anyhow::{Context, Result};
use clap::Parser;
use djset_cli::init_logging;
use djset_cli::output::{print_json_playlist, print_timeline};
use djset_core::{
    CancellationToken, DjSetConfig, DuplicatePolicy, FileDecoder, FingerprintStore, Pipeline,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "djident")]
#[command(about = "Segment a DJ set and identify its tracks", long_about = None)]
struct Args {
    /// Recording to analyse (wav, mp3, flac, ogg, mp4, mkv, ...)
    audio: PathBuf,

    /// Path to configuration file (TOML). If not provided, uses config.toml when it exists
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fingerprint store (.json or .djfp), overrides [store].database
    #[arg(short, long)]
    fingerprints: Option<PathBuf>,

    /// JSON store merged into the database before matching; existing tracks win
    #[arg(short, long)]
    bootstrap: Option<PathBuf>,

    /// Upper bound on the number of segments
    #[arg(long)]
    max_segments: Option<usize>,

    /// Minimum distance between detected transitions, in seconds
    #[arg(long)]
    min_segment_duration: Option<f64>,

    /// Print the playlist as JSON instead of a timeline
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;

    let mut store = FingerprintStore::load(&config.store.database)
        .with_context(|| format!("Failed to load store {}", config.store.database.display()))?;
    if let Some(bootstrap) = &config.store.bootstrap {
        let file = djset_fp::load_auto(bootstrap)
            .with_context(|| format!("Failed to read bootstrap file {}", bootstrap.display()))?;
        store.bootstrap(&file, DuplicatePolicy::Skip)?;
    }
    log::info!("Store holds {} tracks", store.len());

    if !args.audio.exists() {
        anyhow::bail!("Audio file not found: {}", args.audio.display());
    }

    let decoder = FileDecoder::new(config.sample_rate);
    let pipeline = Pipeline::new(config)?;
    let playlist = pipeline.run_file(&decoder, &args.audio, &store, &CancellationToken::new())?;

    if args.json {
        print_json_playlist(&args.audio.display().to_string(), &playlist);
    } else {
        print_timeline(&playlist);
    }

    Ok(())
}

/// Config file (explicit, or `config.toml` if present) with flag overrides applied
fn load_config(args: &Args) -> Result<DjSetConfig> {
    let mut config = match &args.config {
        Some(path) => DjSetConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new("config.toml").exists() => DjSetConfig::load(Path::new("config.toml"))
            .context("Failed to load config.toml")?,
        None => DjSetConfig::default(),
    };

    if let Some(path) = &args.fingerprints {
        config.store.database = path.clone();
    }
    if let Some(path) = &args.bootstrap {
        config.store.bootstrap = Some(path.clone());
    }
    if let Some(max_segments) = args.max_segments {
        config.boundaries.max_segments = Some(max_segments);
    }
    if let Some(seconds) = args.min_segment_duration {
        config.boundaries.min_segment_length_s = seconds;
    }

    config.validate()?;
    Ok(config)
}
