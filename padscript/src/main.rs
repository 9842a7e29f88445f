/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use padscript::actuation::{drive, TracingActuator};
use padscript::compiler::compile;
use padscript::config::CompilerConfig;
use padscript::script::{self, ScriptFormat};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Compile a controller macro script into an absolute-time schedule.
///
/// Example:
///   padscript combo.csv -c padscript.yaml -r 2 --button-ms 50 --dry-run
#[derive(Debug, Parser)]
#[command(
    name = "padscript",
    about = "Controller macro compiler",
    long_about = None,
)]
struct Cli {
    /// Path to the macro script (`.csv`, otherwise YAML).
    script: PathBuf,

    /// Path to the YAML compiler configuration.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Extra playbacks after the first (overrides the config file).
    #[arg(short = 'r', long = "repeats")]
    repeats: Option<u32>,

    /// Minimum release→press gap per button in ms (overrides the config file).
    #[arg(long = "button-ms")]
    button_ms: Option<u64>,

    /// Minimum start→start gap per stick in ms (overrides the config file).
    #[arg(long = "stick-ms")]
    stick_ms: Option<u64>,

    /// Absolute time of the first action, in nanoseconds.
    #[arg(short = 's', long = "start-ns", default_value_t = 0)]
    start_ns: u64,

    /// Walk the schedule and log every actuator call.
    #[arg(short = 'n', long = "dry-run", default_value_t = false)]
    dry_run: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    info!(
        script   = %cli.script.display(),
        format   = ?ScriptFormat::from_path(&cli.script),
        config   = ?cli.config,
        repeats  = ?cli.repeats,
        start_ns = cli.start_ns,
        dry_run  = cli.dry_run,
        "Configuration"
    );

    // ── Configuration ─────────────────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => CompilerConfig::load_from_file(path)?,
        None => CompilerConfig::default(),
    };
    if let Some(r) = cli.repeats {
        config.repeats = r;
    }
    if let Some(ms) = cli.button_ms {
        config.min_button_transition_ms = ms;
    }
    if let Some(ms) = cli.stick_ms {
        config.min_stick_transition_ms = ms;
    }

    // ── Compile & expand ──────────────────────────────────────────────────────
    let rows = script::load_from_file(&cli.script)?;
    let output = compile(&rows, &config)
        .with_context(|| format!("Failed to compile {}", cli.script.display()))?;
    let schedule = output
        .script
        .expand(cli.start_ns)
        .context("Failed to expand schedule")?;

    // ── Summary ───────────────────────────────────────────────────────────────
    for (button, edges) in schedule.buttons().iter().filter(|(_, e)| !e.is_empty()) {
        info!(
            "  [{button}]  presses={}  first={}ns  last={}ns",
            edges.len() / 2,
            edges.first().map(|e| e.time_ns).unwrap_or(0),
            edges.last().map(|e| e.time_ns).unwrap_or(0),
        );
    }
    for (stick, segs) in schedule.sticks().iter().filter(|(_, s)| !s.is_empty()) {
        info!(
            "  [{stick}]  movements={}  first={}ns  last={}ns",
            segs.len() / 2,
            segs.first().map(|s| s.time_ns).unwrap_or(0),
            segs.last().map(|s| s.time_ns).unwrap_or(0),
        );
    }
    info!(
        warnings = output.warnings.len(),
        end_time_ns = schedule.end_time_ns(),
        "Schedule ready"
    );

    if cli.dry_run {
        let calls = drive(&schedule.events(), &mut TracingActuator)?;
        info!(calls, "Dry run complete");
    }

    Ok(())
}
