//! fpstore - Manage a fingerprint store
//!
//! Usage:
//!   fpstore <store> list
//!   fpstore <store> add <audio> --track-id <id> [--title ..] [--artist ..] [--overwrite]
//!   fpstore <store> remove <id>
//!   fpstore <store> import <file> [--on-duplicate reject|skip|overwrite]
//!   fpstore <store> convert <output>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use djset_cli::init_logging;
use djset_cli::output::print_store;
use djset_core::{
    ChromaFingerprinter, Decoder, DjSetConfig, DuplicatePolicy, FileDecoder, FingerprintRecord,
    FingerprintStore, Fingerprinter,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fpstore")]
#[command(about = "Inspect and edit a fingerprint store", long_about = None)]
struct Args {
    /// Store file (.json or .djfp); created on first write
    store: PathBuf,

    /// Configuration file (TOML) for decoding and fingerprinting
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored tracks
    List,

    /// Fingerprint a reference recording and add it
    Add {
        audio: PathBuf,

        #[arg(long)]
        track_id: String,

        /// Defaults to the track id
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        artist: Option<String>,

        /// Replace an existing track with the same id
        #[arg(long)]
        overwrite: bool,
    },

    /// Remove a track
    Remove { track_id: String },

    /// Merge another store file into this one
    Import {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OnDuplicate::Reject)]
        on_duplicate: OnDuplicate,
    },

    /// Write the store in the format named by the output extension
    Convert { output: PathBuf },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnDuplicate {
    Reject,
    Skip,
    Overwrite,
}

impl From<OnDuplicate> for DuplicatePolicy {
    fn from(value: OnDuplicate) -> Self {
        match value {
            OnDuplicate::Reject => DuplicatePolicy::Reject,
            OnDuplicate::Skip => DuplicatePolicy::Skip,
            OnDuplicate::Overwrite => DuplicatePolicy::Overwrite,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut store = FingerprintStore::load(&args.store)
        .with_context(|| format!("Failed to load store {}", args.store.display()))?;

    match args.command {
        Command::List => print_store(&store),
        Command::Add {
            audio,
            track_id,
            title,
            artist,
            overwrite,
        } => {
            let config = match &args.config {
                Some(path) => DjSetConfig::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => DjSetConfig::default(),
            };
            let stream = FileDecoder::new(config.sample_rate).decode(&audio)?;
            let fingerprinter = ChromaFingerprinter::new(config.features.clone());
            let hash = fingerprinter.fingerprint(stream.samples(), stream.sample_rate());
            log::info!("{} -> {}", audio.display(), hash);

            let title = title.unwrap_or_else(|| track_id.clone());
            let artist = artist.unwrap_or_else(|| djset_core::store::UNKNOWN_ARTIST.to_string());
            store.add(FingerprintRecord::new(track_id, title, artist, [hash]), overwrite)?;
            store.save(&args.store)?;
        }
        Command::Remove { track_id } => {
            if store.remove(&track_id).is_none() {
                anyhow::bail!("No track with id {}", track_id);
            }
            store.save(&args.store)?;
        }
        Command::Import { file, on_duplicate } => {
            let incoming = djset_fp::load_auto(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = store.bootstrap(&incoming, on_duplicate.into())?;
            println!(
                "{} added, {} overwritten, {} skipped",
                report.added, report.overwritten, report.skipped
            );
            store.save(&args.store)?;
        }
        Command::Convert { output } => {
            store.save(&output)?;
            println!("Wrote {} tracks to {}", store.len(), output.display());
        }
    }

    Ok(())
}
