//! # Rill Diagnostic Tool
//!
//! Drives one fault through a chosen delivery channel so the routing can
//! be observed end to end:
//!
//! - `callback` — a deferred read against a missing path reports ENOENT
//!   through the completion slot; the process keeps running.
//! - `event` — a long-lived resource dispatches `"error"` events to a
//!   subscriber; the process keeps running.
//! - `unhandled` — a turn raises with no consumer; the crash boundary
//!   surfaces the fault on stderr and the process exits 1.
//! - `assertion` — an assertion fault bypasses the installed boundary
//!   handler and the process exits 134.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing::{info, warn};

use rill_common::config::{ConfigLoader, LogLevel, SharedConfig};
use rill_common::fault::Fault;
use rill_core::boundary;
use rill_core::emitter::{ERROR_EVENT, Emitter};
use rill_core::turn::TurnLoop;

#[derive(Debug, Parser)]
#[command(name = "rill_diag", about = "Fault channel diagnostics for the rill runtime")]
struct Cli {
    /// Path to a TOML configuration file with a [shared] section.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delivery channel scenario to run.
    #[arg(long, value_enum, default_value = "callback")]
    scenario: Scenario,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    Callback,
    Event,
    Unhandled,
    Assertion,
}

#[derive(Debug, Deserialize)]
struct DiagConfig {
    shared: SharedConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let shared = match &cli.config {
        Some(path) => {
            let config = DiagConfig::load(path)?;
            config.shared.validate()?;
            config.shared
        }
        None => SharedConfig {
            log_level: LogLevel::Info,
            service_name: "rill-diag".to_string(),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(shared.log_level.filter_directive())
            }),
        )
        .compact()
        .init();

    info!(service = %shared.service_name, scenario = ?cli.scenario, "rill diagnostic starting");

    match cli.scenario {
        Scenario::Callback => run_callback(),
        Scenario::Event => run_event(),
        Scenario::Unhandled => run_unhandled(),
        Scenario::Assertion => run_assertion(),
    }

    info!("scenario complete; process still running");
    Ok(())
}

/// Print a fault snapshot as pretty JSON.
fn print_report(fault: &Fault) {
    match serde_json::to_string_pretty(&fault.report()) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!("could not serialize fault report: {e}"),
    }
}

/// Deferred read against a missing path; ENOENT arrives in the
/// completion slot, never at the scheduling call site.
fn run_callback() {
    let mut turn_loop = TurnLoop::new();

    turn_loop.defer(
        |_| -> Result<String, Fault> {
            Err(Fault::system("ENOENT", "open '/etc/rill/settings.toml'"))
        },
        |fault, value| match fault {
            Some(fault) => {
                warn!(fault = %fault, "deferred read failed");
                print_report(&fault);
            }
            None => info!(?value, "deferred read succeeded"),
        },
    );

    info!("deferred read scheduled; completion runs on a later turn");
    turn_loop.run();
}

/// A long-lived resource failing twice; the subscriber observes both
/// faults and the process keeps running.
fn run_event() {
    let mut turn_loop = TurnLoop::new();
    let mut emitter: Emitter<Fault> = Emitter::new();

    emitter.subscribe(ERROR_EVENT, |fault: &Fault| {
        warn!(fault = %fault, "resource error observed");
        print_report(fault);
        Ok(())
    });

    for detail in ["read from peer", "read from peer (retry)"] {
        emitter.raise(Fault::system("ECONNRESET", detail), |fault| {
            turn_loop.escalate(fault)
        });
    }
}

/// A raise with no consumer anywhere: the crash boundary terminates the
/// process with exit status 1 after surfacing the fault.
fn run_unhandled() {
    let mut turn_loop = TurnLoop::new();
    turn_loop.schedule(|_| Err(Fault::user("nothing consumes this fault")));
    turn_loop.run();
}

/// An assertion fault bypasses even an installed handler; exit 134.
fn run_assertion() {
    boundary::install(|fault| {
        // Never reached for FATAL faults.
        warn!(fault = %fault, "boundary handler invoked");
    });
    boundary::escalate(Fault::assertion("turn queue invariant violated"));
}
