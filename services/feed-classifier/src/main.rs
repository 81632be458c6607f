use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use feed_classifier::ingest::ingest_file;
use feed_classifier::scheduler::FeedScheduler;

#[derive(Parser, Debug)]
#[command(name = "feed-classifier", version)]
struct Cli {
    /// JSON-lines market data feed to classify.
    #[arg(long, default_value = "data/input.json")]
    input: PathBuf,

    /// Directory receiving one <symbol>.txt file per instrument.
    #[arg(long, default_value = "data/output")]
    out_dir: PathBuf,

    /// Worker threads for the execution phase. Defaults to the
    /// available hardware parallelism.
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let threads = cli.threads.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    });

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("cannot create output directory {:?}", cli.out_dir))?;

    tracing::info!(input = %cli.input.display(), "parsing input and building task graph");
    let ingest_started = Instant::now();

    let mut scheduler = FeedScheduler::new(&cli.out_dir);
    let summary = ingest_file(&cli.input, &mut scheduler)?;

    tracing::info!(
        records = summary.records,
        symbols = scheduler.symbol_count(),
        tasks = scheduler.task_count(),
        elapsed_ms = ingest_started.elapsed().as_millis() as u64,
        "task graph built"
    );

    tracing::info!(threads, "running task graph");
    let stats = scheduler.execute(threads);

    tracing::info!(
        tasks = stats.tasks_executed,
        elapsed_ms = stats.duration.as_millis() as u64,
        tasks_per_sec = stats.throughput(),
        "execution complete"
    );

    Ok(())
}
