mod app;
mod config;
mod effects;
mod persistence;
mod render;
mod submission;

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{bail, Context};
use clap::Parser;
use filedrop_core::ItemState;
use filedrop_logging::{filedrop_info, parse_level, DEFAULT_LOG_FILE};

use crate::app::{spawn_stdin_reader, App};
use crate::config::DEFAULT_CONFIG_FILE;
use crate::effects::EffectRunner;
use crate::submission::{into_messages, Submission};

/// Upload local files and have the server fetch remote URLs.
#[derive(Debug, Parser)]
#[command(name = "filedrop", version)]
struct Cli {
    /// Local files to upload, in order.
    files: Vec<PathBuf>,
    /// URL for the server to fetch; may be repeated.
    #[arg(short, long = "url")]
    urls: Vec<String>,
    /// Server base URL; overrides the config file.
    #[arg(short, long)]
    server: Option<String>,
    /// Config file (RON). Defaults to ./filedrop.ron when present.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Also read file paths and URLs from stdin, one per line.
    #[arg(long)]
    stdin: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut settings = config::load(&config_path, cli.config.is_some())?;
    if let Some(server) = cli.server {
        settings.server_url = server;
    }

    filedrop_logging::initialize(
        settings.log_destination.into(),
        parse_level(&settings.log_level),
        Path::new(DEFAULT_LOG_FILE),
    );
    filedrop_info!("Using server {}", settings.server_url);

    let mut submissions: Vec<Submission> = cli.files.into_iter().map(Submission::File).collect();
    submissions.extend(cli.urls.into_iter().map(Submission::Url));
    let initial = into_messages(submissions);
    if initial.is_empty() && !cli.stdin {
        bail!("nothing to submit; pass files, --url, or --stdin");
    }

    let engine_settings = settings
        .engine_settings()
        .context("building engine settings")?;
    let (msg_tx, msg_rx) = mpsc::channel();
    for msg in initial {
        // The receiver is alive; it is owned below.
        let _ = msg_tx.send(msg);
    }
    if cli.stdin {
        spawn_stdin_reader(msg_tx);
    } else {
        drop(msg_tx);
    }

    let view = App::new(EffectRunner::new(engine_settings), msg_rx).run_until_settled();

    if let Some(dir) = &settings.history_dir {
        persistence::save_history(dir, &view);
    }

    let unfinished = view
        .items
        .iter()
        .filter(|row| row.state != ItemState::Succeeded)
        .count();
    if unfinished > 0 {
        bail!("{unfinished} of {} items did not succeed", view.item_count);
    }
    Ok(())
}
