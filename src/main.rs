//! PrimePulse CLI entry point

use anyhow::{Context, Result};
use primepulse::config::cli::{Cli, ExecutionMode};
use primepulse::config::{toml as config_toml, validator, Config};
use primepulse::coordinator::Coordinator;
use primepulse::distributed::{self, HttpCoordinatorClient};
use primepulse::oracle::create_oracle;
use primepulse::output::{create_sink, StatusSink};
use primepulse::stats::{StatusReporter, WorkerSummary};
use primepulse::target::TargetNumber;
use primepulse::util::time::{calculate_rate, format_count, format_duration, format_rate};
use primepulse::worker::{WorkSource, WorkerPool};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    println!("PrimePulse v{}", env!("CARGO_PKG_VERSION"));
    println!("Distributed prime-divisor search");
    println!();

    let cli = Cli::parse_args();
    cli.validate()?;

    let config = build_config(&cli)?;
    validator::validate_config(&config, cli.mode).context("Configuration validation failed")?;

    init_logging(config.runtime.debug);

    let number = match cli.mode {
        ExecutionMode::Worker => None,
        _ => Some(config.coordinator.load_number()?),
    };
    print_configuration(&config, cli.mode, number.as_ref());

    if config.runtime.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    match (cli.mode, number) {
        (ExecutionMode::Worker, _) => runtime.block_on(run_worker(config)),
        (ExecutionMode::Standalone, Some(number)) => runtime.block_on(run_standalone(config, number)),
        (ExecutionMode::Coordinator, Some(number)) => runtime.block_on(run_coordinator(config, number)),
        (_, None) => anyhow::bail!("No number to factor: set --number or --number-file"),
    }
}

/// Load the config file (if any) and apply CLI overrides on top
fn build_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => config_toml::parse_toml_file(path)?,
        None => Config::default(),
    };

    config_toml::merge_cli_with_config(cli, base)
}

/// RUST_LOG wins; otherwise `debug` with `--debug` and `info` without
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_configuration(config: &Config, mode: ExecutionMode, number: Option<&TargetNumber>) {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());

    println!("Configuration:");
    println!("  Host: {}", host);
    println!("  Mode: {:?}", mode);

    if mode != ExecutionMode::Worker {
        println!("  Coordinator:");
        if let Some(path) = &config.coordinator.number_file {
            println!("    Number file: {}", path.display());
        }
        if let Some(number) = number {
            println!("    Number: {}", number);
            println!("    Digits: {}", number.digit_count());
        }
        println!("    Range size: {}", format_count(config.coordinator.range_size));
        println!("    Start floor: {}", config.coordinator.start_floor);
        println!("    Recent window: {}", config.coordinator.recent_window);
        println!("    Worker timeout: {}s", config.coordinator.worker_timeout_secs);
        if mode == ExecutionMode::Coordinator {
            println!("    Listen: {}", config.coordinator.listen_addr);
        }
    }

    if mode != ExecutionMode::Coordinator {
        println!("  Workers:");
        if mode == ExecutionMode::Worker {
            println!("    Coordinator: {}", config.worker.coordinator_url);
        }
        println!("    Count: {}", config.worker.resolved_workers());
        println!("    Batch size: {}", config.worker.batch_size);
        println!("    Work interval: {}ms", config.worker.work_interval_ms);
        println!("    Status interval: {}ms", config.worker.status_interval_ms);
        println!("    Oracle: {}", config.worker.oracle);
        if let Some(seed) = config.worker.oracle_seed {
            println!("    Seed: {}", seed);
        }
    }

    println!("  Output: {}", config.output.format);
    match config.runtime.duration() {
        Some(d) => println!("  Duration: {}", format_duration(d)),
        None => println!("  Duration: until interrupted"),
    }
}

/// In-process coordinator plus a local worker pool
async fn run_standalone(config: Config, number: TargetNumber) -> Result<()> {
    let coordinator = Arc::new(Coordinator::new(number, config.coordinator.settings()));
    let sink = create_sink(config.output.format, config.output.progress_horizon);

    println!();
    println!("Starting sweep...");
    println!();

    let start = Instant::now();
    let summary = run_pool(&config, coordinator.clone(), sink).await?;

    let reporter = StatusReporter::new(coordinator, config.output.progress_horizon);
    print_results(&summary, start.elapsed());
    println!();
    print!("{}", reporter.summary_text());

    Ok(())
}

/// Serve range leases over HTTP until interrupted
async fn run_coordinator(config: Config, number: TargetNumber) -> Result<()> {
    let coordinator = Arc::new(Coordinator::new(number, config.coordinator.settings()));

    let listener = tokio::net::TcpListener::bind(&config.coordinator.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.coordinator.listen_addr))?;

    let duration = config.runtime.duration();
    let shutdown = async move {
        shutdown_signal(duration).await;
        info!("Shutdown requested");
    };

    distributed::serve(listener, coordinator.clone(), config.output.progress_horizon, shutdown).await?;

    let reporter = StatusReporter::new(coordinator, config.output.progress_horizon);
    println!();
    print!("{}", reporter.summary_text());
    Ok(())
}

/// Worker pool against a remote coordinator
async fn run_worker(config: Config) -> Result<()> {
    let client = HttpCoordinatorClient::new(&config.worker.coordinator_url, config.worker.request_timeout())?;
    info!("Using coordinator at {}", client.base_url());

    let sink = create_sink(config.output.format, config.output.progress_horizon);

    let start = Instant::now();
    let summary = run_pool(&config, Arc::new(client), sink).await?;
    print_results(&summary, start.elapsed());

    Ok(())
}

/// Spawn the pool, wait for it to end or be interrupted, then collect totals
async fn run_pool(config: &Config, source: Arc<dyn WorkSource>, sink: Arc<dyn StatusSink>) -> Result<WorkerSummary> {
    let oracle = config.worker.oracle;
    let seed = config.worker.oracle_seed;

    // Worker i seeds with seed + i
    let pool = WorkerPool::spawn(
        config.worker.resolved_workers(),
        config.worker.worker_id.as_deref(),
        source,
        sink,
        &config.worker.settings(),
        |index| create_oracle(oracle, seed.map(|s| s.wrapping_add(index as u64))),
    );

    let stopper = pool.stopper();
    let join = pool.join();
    tokio::pin!(join);

    let report = tokio::select! {
        report = &mut join => report,
        _ = shutdown_signal(config.runtime.duration()) => {
            info!("Stopping workers");
            stopper.stop_all();
            (&mut join).await
        }
    };

    for (id, reason) in &report.failures {
        warn!("Worker {} ended with error: {}", id, reason);
    }

    if !report.failures.is_empty() && report.failures.len() == config.worker.resolved_workers() {
        anyhow::bail!("All workers failed; first error: {}", report.failures[0].1);
    }

    Ok(report.summary)
}

/// Resolves on Ctrl-C, or after `duration` when one is set
async fn shutdown_signal(duration: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match duration {
        Some(d) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = tokio::time::sleep(d) => info!("Duration of {} elapsed", format_duration(d)),
            }
        }
        None => ctrl_c.await,
    }
}

fn print_results(summary: &WorkerSummary, elapsed: Duration) {
    println!();
    println!("═══════════════════════════════════════════════════════════");
    println!("                    SWEEP RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Elapsed Time: {}", format_duration(elapsed));
    println!();
    println!("Work:");
    println!(
        "  Candidates: {} ({})",
        format_count(summary.candidates_tested),
        format_rate(calculate_rate(summary.candidates_tested, elapsed))
    );
    println!("  Batches:    {}", format_count(summary.batches_run));
    println!("  Ranges:     {}", format_count(summary.ranges_completed));
    println!("  Divisors:   {}", format_count(summary.divisors_found));
    if summary.submissions_lost > 0 {
        println!("  Lost submissions: {}", summary.submissions_lost);
    }
    println!();
    println!("═══════════════════════════════════════════════════════════");
}
