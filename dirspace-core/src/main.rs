//! ``src/main.rs``
//! Thin shell around dirspace-core: opens one directory, waits for every
//! row to resolve, prints the table. The library is the product; this binary
//! is the reference collaborator for it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use dirspace_core::{
    Config, Logger, Navigator, Row, SizeState,
    util::humanize::human_readable_size,
};

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    Logger::init_tracing();

    let config: Config = Config::load().await.unwrap_or_else(|e| {
        info!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let start_dir: PathBuf = resolve_start_dir(&config).await?;

    let navigator = Navigator::new(config.show_hidden);
    let mut changes = navigator.subscribe();

    navigator
        .navigate_to(&start_dir)
        .await
        .with_context(|| format!("cannot open start directory {}", start_dir.display()))?;

    // coarse change signal: re-check after every applied delivery
    while navigator.has_pending().await {
        if changes.changed().await.is_err() {
            break;
        }
    }

    print_listing(&navigator).await;

    Ok(())
}

/// CLI argument first, then the configured start directory, then home.
async fn resolve_start_dir(config: &Config) -> Result<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return tokio::fs::canonicalize(&arg)
            .await
            .with_context(|| format!("cannot resolve {arg}"));
    }

    if let Some(dir) = &config.start_dir {
        return Ok(dir.clone());
    }

    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .context("could not determine a start directory")
}

async fn print_listing(navigator: &Navigator) {
    if let Some(dir) = navigator.current_dir().await {
        println!("{}", dir.display());
    }

    for row in navigator.rows().await {
        println!("{:>12}  {}", size_cell(&row), display_name(&row));
    }
}

fn size_cell(row: &Row) -> String {
    match row.size {
        SizeState::Value(bytes) => human_readable_size(bytes),
        SizeState::Pending => "--".to_string(),
        SizeState::Error => "ERROR".to_string(),
    }
}

fn display_name(row: &Row) -> String {
    if row.entry.is_dir() {
        format!("{}/", row.entry.name)
    } else {
        row.entry.name.to_string()
    }
}
