//! feedup - tag-aware package reference updater
//!
//! Finds package references in project files, `packages.config`, and
//! `Directory.*.props` files under a solution root, resolves the best version
//! from the configured feeds, and rewrites the references in place.

use chrono::Utc;
use clap::Parser;
use feedup::cli::CliArgs;
use feedup::config::UpdaterParameters;
use feedup::orchestrator::Orchestrator;
use feedup::output::{OutputConfig, ResultList, TextReporter};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level chosen by the flags
fn init_tracing(args: &CliArgs) {
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("feedup={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!args.no_color && io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let params = UpdaterParameters::from_args(&args)?;
    debug!(
        "feedup v{}: {} with {} feed(s), tags {:?}{}",
        env!("CARGO_PKG_VERSION"),
        params.root.display(),
        params.feeds.len(),
        params.tags,
        if params.dry_run { " (dry run)" } else { "" }
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping before any file is written");
            on_interrupt.cancel();
        }
    });

    let orchestrator =
        Orchestrator::new(params)?.with_progress(!args.quiet && io::stderr().is_terminal());
    let result = orchestrator.run(&cancel).await;

    let reporter = TextReporter::new(OutputConfig::from_cli(
        args.verbose,
        args.quiet,
        args.no_color,
    ));
    let mut stdout = io::stdout().lock();
    reporter.write_summary(&result.log, &mut stdout)?;
    stdout.flush()?;

    // Report files are best effort; the references are already updated
    if let Some(path) = &args.summary_file {
        if let Err(e) = reporter.save_extended(&result.log, Utc::now(), path) {
            warn!("failed to write {}: {}", path.display(), e);
        }
    }
    if let Some(path) = &args.results_file {
        if let Err(e) = ResultList::from_log(&result.log).save(path) {
            warn!("failed to write {}: {}", path.display(), e);
        }
    }

    Ok(ExitCode::SUCCESS)
}
