use clap::{Parser, Subcommand};
use layerfw::{config, replay};
use layerfw::dataplane::{Dispatcher, StatsRecorder};
use layerfw::telemetry::{init_logging, StatsReport};
use layerfw::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "layerfw")]
#[command(about = "Inline L2-L4 blacklist classifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate config.toml and print diagnostics
    Check {
        /// Path to config.toml
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Classify hex-encoded frames and print per-action counters
    Replay {
        /// Path to config.toml
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// File with one hex-encoded frame per line
        #[arg(short, long)]
        frames: PathBuf,

        /// Worker threads, one counter shard each (default: classifier.shards)
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { config } => cmd_check(&config),
        Commands::Replay {
            config,
            frames,
            workers,
        } => cmd_replay(&config, &frames, workers),
    };

    if let Err(e) = result {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

fn cmd_check(config_path: &Path) -> Result<()> {
    init_logging(None);
    println!("[INFO] Validating {}...", config_path.display());

    let cfg = config::load(config_path)?;
    let validation = config::validate(&cfg);
    validation.print_diagnostics();

    if validation.has_errors() {
        return Err(Error::Config("validation failed".to_string()));
    }

    let store = cfg.build_store()?;
    println!(
        "[INFO] Configuration is valid ({} blacklist entries)",
        cfg.blacklist_keys()?.len()
    );
    if store.is_empty() {
        println!("[INFO] Blacklist is empty");
    }
    Ok(())
}

fn cmd_replay(config_path: &Path, frames_path: &Path, workers: Option<usize>) -> Result<()> {
    let cfg = config::load(config_path)?;
    init_logging(Some(&cfg.logging));

    let validation = config::validate(&cfg);
    validation.print_diagnostics();
    if validation.has_errors() {
        return Err(Error::Config("validation failed".to_string()));
    }

    let frames = replay::read_frames(frames_path)?;
    let workers = workers.unwrap_or_else(|| cfg.shard_count()).max(1);
    let stats = Arc::new(StatsRecorder::new(workers));
    let dispatcher = Dispatcher::new(Arc::new(cfg.build_store()?), stats.clone(), cfg.options());

    info!(
        frames = frames.len(),
        workers,
        strict_ipv4_header_len = cfg.classifier.strict_ipv4_header_len,
        "replaying {}",
        frames_path.display()
    );
    replay::replay(&dispatcher, &frames, workers);

    print!("{}", StatsReport::capture(&stats));
    Ok(())
}
