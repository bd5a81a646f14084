//! CLI entry point for the webclient tool.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};
use webclient::{
    ClientOptions, DownloadError, Downloader, EventKind, HttpClient, TransferHandle, TransferOutcome,
};

mod cli;

use cli::Args;

/// How often `--background` checks the transfer handle.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let options = ClientOptions {
        connect_timeout: args.connect_timeout.map(Duration::from_secs),
        read_timeout: args.read_timeout.map(Duration::from_secs),
        ..ClientOptions::default()
    };
    let mut downloader = Downloader::new(&args.url)?
        .with_client(HttpClient::with_options(&options)?)
        .with_chunk_size(args.chunk_size);
    downloader.set_destination(args.output.clone());

    let bar = progress_bar(&args);
    attach_listeners(&mut downloader, &args, &bar);

    let result = run(&downloader, &args).await;
    bar.finish_and_clear();
    result
}

async fn run(downloader: &Downloader, args: &Args) -> Result<()> {
    if let Some(output) = &args.output {
        let transfer = if args.background {
            wait_in_background(downloader.spawn_file_download()).await?
        } else {
            downloader.download_file().await?
        };
        info!(
            path = %output.display(),
            bytes = transfer.bytes_written,
            "Download complete"
        );
    } else {
        let text = if args.background {
            wait_in_background(downloader.spawn_string_download()).await?
        } else {
            downloader.download_string().await?
        };
        if !args.json {
            print!("{text}");
        }
    }
    Ok(())
}

/// Polls a background transfer until it reports, then returns its result.
async fn wait_in_background<T>(mut handle: TransferHandle<T>) -> Result<T, DownloadError> {
    while !handle.is_finished() {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    if let Some(error) = handle.error() {
        debug!(%error, "background transfer captured an error");
    }
    handle.wait().await
}

fn progress_bar(args: &Args) -> ProgressBar {
    if args.quiet || args.json {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::no_length();
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {wide_bar} {bytes}/{total_bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

#[derive(Serialize)]
struct JsonLine<'a, E: Serialize> {
    event: EventKind,
    #[serde(flatten)]
    payload: &'a E,
}

fn print_json<E: Serialize>(event: EventKind, payload: &E) {
    match serde_json::to_string(&JsonLine { event, payload }) {
        Ok(line) => println!("{line}"),
        Err(error) => warn!(%error, "failed to serialize event"),
    }
}

fn attach_listeners(downloader: &mut Downloader, args: &Args, bar: &ProgressBar) {
    if args.json {
        downloader
            .on_progress(|event| print_json(EventKind::Progress, event))
            .on_file_completed(|event| print_json(EventKind::FileCompleted, event))
            .on_string_completed(|event| print_json(EventKind::StringCompleted, event));
        return;
    }

    let progress = bar.clone();
    downloader.on_progress(move |event| {
        if let Some(total) = event.total_bytes {
            progress.set_length(total);
        }
        progress.set_position(event.bytes_transferred);
    });

    downloader.on_file_completed(|event| {
        if let TransferOutcome::Failed { message } = &event.outcome {
            warn!(path = %event.destination.display(), %message, "file transfer failed");
        }
    });
    downloader.on_string_completed(|event| {
        if !event.outcome.is_success() {
            warn!(
                url = %event.source,
                partial_chars = event.text.chars().count(),
                "string transfer failed"
            );
        }
    });
}
