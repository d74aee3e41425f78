//! polyfuse simulator.
//!
//! Drives synthetic traffic through the configured fuses so their limits can
//! be tuned before wiring them into real call sites.
//!
//! ```text
//!   tick ──▶ for each fuse ──▶ guard::call ──▶ get_state? ──▶ op (fails with p) ──▶ push_state
//!                                                  │
//!                                                  └── tripped: counted, op skipped
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use polyfuse::config::loader::load_config;
use polyfuse::config::{FuseSettings, PolyfuseConfig};
use polyfuse::observability::{logging, metrics};
use polyfuse::resilience::guard::{self, GuardError};
use polyfuse::resilience::registry::FuseRegistry;

/// One tick per microsecond is as fast as the ticker goes.
const MAX_RPS: i64 = 1_000_000;

#[derive(Parser)]
#[command(name = "polyfuse-sim")]
#[command(about = "Replay synthetic traffic through decaying fuses", long_about = None)]
struct Cli {
    /// TOML config file. Without one a single demo fuse is used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Calls per second per fuse.
    #[arg(short, long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=MAX_RPS))]
    rps: u32,

    /// Probability that a call fails, 0.0 to 1.0.
    #[arg(short, long, default_value_t = 0.05)]
    failure_rate: f64,

    /// How long to run, in seconds.
    #[arg(short, long, default_value_t = 30)]
    duration_secs: u64,
}

#[derive(Debug, Default, Serialize)]
struct FuseReport {
    allowed: u64,
    tripped: u64,
    failed: u64,
    store_errors: u64,
    final_request: f64,
    final_error: f64,
}

/// Interval between ticks, never shorter than 1µs.
fn tick_period(rps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rps.max(1))).max(Duration::from_micros(1))
}

/// Run traffic until `duration` elapses or `shutdown` completes.
async fn simulate(
    registry: &FuseRegistry,
    rps: u32,
    failure_rate: f64,
    duration: Duration,
    shutdown: impl Future<Output = ()>,
) -> BTreeMap<String, FuseReport> {
    let mut reports: BTreeMap<String, FuseReport> = registry
        .ids()
        .into_iter()
        .map(|id| (id.to_string(), FuseReport::default()))
        .collect();

    let mut ticker = tokio::time::interval(tick_period(rps));
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for (id, report) in reports.iter_mut() {
                    let Some(fuse) = registry.get(id) else { continue };
                    let outcome = guard::call(fuse.as_ref(), || {
                        if fastrand::f64() < failure_rate {
                            Err("injected failure")
                        } else {
                            Ok(())
                        }
                    });
                    match outcome {
                        Ok(()) => report.allowed += 1,
                        Err(GuardError::Inner(_)) => {
                            report.allowed += 1;
                            report.failed += 1;
                        }
                        Err(GuardError::Tripped { .. }) => report.tripped += 1,
                        Err(GuardError::Fuse(_)) => report.store_errors += 1,
                    }
                }
            }
            _ = &mut deadline => {
                tracing::info!("Simulation finished");
                break;
            }
            _ = &mut shutdown => break,
        }
    }

    for (id, report) in reports.iter_mut() {
        if let Some(snapshot) = registry.get(id).and_then(|f| f.snapshot().ok()) {
            report.final_request = snapshot.request_count;
            report.final_error = snapshot.error_count;
        }
    }
    reports
}

fn demo_config() -> PolyfuseConfig {
    PolyfuseConfig {
        fuses: vec![FuseSettings {
            timeframe_secs: 10,
            max_request: 500,
            max_error: 20,
            error_rate: 1_000,
            ramp_secs: 5,
            ..FuseSettings::new("demo")
        }],
        ..PolyfuseConfig::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => demo_config(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("polyfuse-sim v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let registry = FuseRegistry::from_config(&config)?;
    let failure_rate = cli.failure_rate.clamp(0.0, 1.0);

    tracing::info!(
        fuses = registry.len(),
        rps = cli.rps,
        failure_rate,
        duration_secs = cli.duration_secs,
        "Simulation configured"
    );

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Interrupted, stopping simulation"),
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl-C handler unavailable, running to the deadline");
                std::future::pending::<()>().await;
            }
        }
    };
    let reports = simulate(
        &registry,
        cli.rps,
        failure_rate,
        Duration::from_secs(cli.duration_secs),
        shutdown,
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
