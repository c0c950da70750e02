// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qwatch: snapshot a batch queue and watch the selected jobs

mod args;
mod color;
mod env;
mod exit_error;
mod logging;
mod output;

use anyhow::{Context, Result};
use args::Cli;
use clap::Parser;
use exit_error::{ExitError, EXIT_INTERRUPTED, EXIT_SESSIONS_FAILED};
use qw_core::{SystemClock, Taxonomy};
use qw_engine::{run_batch, BatchError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(exit) = e.downcast_ref::<ExitError>() {
            if !exit.message.is_empty() {
                eprintln!("qwatch: {}", exit.message);
            }
            std::process::exit(exit.code);
        }
        eprintln!("qwatch: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let layout = cli.layout();

    if cli.clean {
        let moved = layout
            .clean()
            .with_context(|| format!("failed to clean {}", layout.dir.display()))?;
        let count = moved.len();
        println!("archived {count} file(s) in {}", layout.dir.display());
        return Ok(());
    }

    std::fs::create_dir_all(&layout.dir)
        .with_context(|| format!("failed to create {}", layout.dir.display()))?;
    let _log_guard = logging::init(&layout.log_path())?;

    let taxonomy = match cli.taxonomy_path() {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading taxonomy");
            Taxonomy::load(&path)?
        }
        None => Taxonomy::pbs(),
    };
    let taxonomy = Arc::new(taxonomy);
    let config = cli.watch_config(layout.clone());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; stopping watch sessions");
                cancel.cancel();
            }
        }
    });

    let source = config.source();
    let result = run_batch(&config, source, SystemClock, taxonomy, cancel.clone()).await;
    let outcome = match result {
        Err(BatchError::Cancelled) => return Err(ExitError::new(EXIT_INTERRUPTED, "").into()),
        other => other?,
    };
    print!("{}", output::render_summary(&outcome, cli.output));

    if cli.clean_after {
        layout
            .clean()
            .with_context(|| format!("failed to clean {}", layout.dir.display()))?;
    }

    if let Some(watch) = &outcome.watch {
        if !watch.is_success() {
            return Err(ExitError::new(
                EXIT_SESSIONS_FAILED,
                format!("{} watch session(s) failed", watch.failed.len()),
            )
            .into());
        }
    }
    if cancel.is_cancelled() {
        return Err(ExitError::new(EXIT_INTERRUPTED, "").into());
    }
    Ok(())
}
