use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use satchel::config::{load_or_init_feed_list, load_settings, parse_feed_list, SectionConfig};
use satchel::feed::{build_sections, StatusEvent, SubscribeOptions};
use satchel::render::{output_filename, render_document};

/// satchel reads a feed list, downloads and cleans the feeds, and
/// generates a single HTML file optimized for offline reading on an
/// e-reader or other constrained device.
///
/// The first time satchel is run it generates a stub feed list in the
/// current directory. Edit that file to specify the feeds you want and
/// run satchel again.
#[derive(Parser, Debug)]
#[command(name = "satchel", version, about)]
struct Args {
    /// Path to the feed list file
    #[arg(short, long, default_value = "satchel_feeds.conf")]
    config: PathBuf,

    /// Path to the optional settings file
    #[arg(long, default_value = "satchel.toml")]
    settings: PathBuf,

    /// Directory the generated document is written to (overrides settings)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Per-fetch timeout in seconds (overrides settings)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Maximum concurrent fetches within a section (overrides settings)
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("satchel=info")),
        )
        .init();

    let args = Args::parse();
    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let mut settings = load_settings(&args.settings)
        .with_context(|| format!("failed to load settings from '{}'", args.settings.display()))?;
    if let Some(timeout_secs) = args.timeout_secs {
        settings.timeout_secs = timeout_secs;
    }
    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency;
    }
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }

    let feed_list = match load_or_init_feed_list(&args.config)
        .with_context(|| format!("failed to load feed list '{}'", args.config.display()))?
    {
        Some(text) => text,
        None => {
            println!(
                "Can't find {}. Generated a stub.",
                args.config.display()
            );
            println!(
                "Please edit {} before running satchel again.",
                args.config.display()
            );
            return Ok(());
        }
    };

    let sections = parse_feed_list(&feed_list);
    if sections.is_empty() {
        println!(
            "No sections found in {}; nothing to fetch.",
            args.config.display()
        );
        return Ok(());
    }
    print_plan(&sections);

    let opts = SubscribeOptions {
        timeout: Duration::from_secs(settings.timeout_secs),
        concurrency: settings.concurrency,
    };
    let client = reqwest::Client::new();

    // Status tokens travel over an explicit channel so the pipeline
    // stays decoupled from how (or whether) they are shown.
    let (events_tx, events_rx) = mpsc::channel::<StatusEvent>(64);
    let reporter = tokio::spawn(report_statuses(events_rx));

    let built = build_sections(&client, &sections, &opts, &events_tx).await;

    drop(events_tx);
    reporter.await.context("status reporter task failed")?;

    let date = Local::now().date_naive();
    let document = render_document(&built, date);
    let out_path = settings.output_dir.join(output_filename(date));
    std::fs::write(&out_path, document)
        .with_context(|| format!("failed to write '{}'", out_path.display()))?;

    println!("Output written to file:");
    println!("{}", out_path.display());
    Ok(())
}

fn print_plan(sections: &[SectionConfig]) {
    println!("Fetching feeds:");
    for section in sections {
        println!("- {}", section.title);
        for url in &section.urls {
            println!("  - {}", url);
        }
    }
    println!();
}

async fn report_statuses(mut events: mpsc::Receiver<StatusEvent>) {
    while let Some(event) = events.recv().await {
        tracing::info!(url = %event.url, status = %event.status, "feed status");
    }
}
