//! Runs the turret core at its control period against simulated hardware.
//!
//! Usage: robot_loop [config.toml] [--cycles N]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};
use turret_core::behaviors::{OperatorInput, RobotState};
use turret_core::common::types::Pose2D;
use turret_core::config::RobotConfig;
use turret_core::subsystems::sim::{sim_hardware, SimState};
use turret_core::telemetry::TracingSink;
use turret_core::tuning::TunableRegistry;
use turret_core::RobotCore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Robot configuration file (TOML); defaults are used when omitted
    config: Option<PathBuf>,

    /// Stop after this many control cycles
    #[arg(long)]
    cycles: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("turret_core=info")),
        )
        .init();

    let args = Args::parse();
    let max_cycles = args.cycles;

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            RobotConfig::load(path).with_context(|| format!("failed to load {}", path.display()))?
        }
        None => {
            info!("Using default configuration");
            RobotConfig::default()
        }
    };

    let start = Pose2D::new(
        config.field.start_x,
        config.field.start_y,
        config.field.start_heading_deg.to_radians(),
    );
    let (hardware, sim) = sim_hardware(SimState {
        pose: start,
        ..SimState::default()
    });

    let tuning = TunableRegistry::new();
    let period = Duration::from_millis(config.control_loop.period_ms);
    let mut core = RobotCore::new(config, hardware, &tuning).context("invalid configuration")?;
    for e in core.init() {
        warn!("Continuing without {}: {}", e.subsystem, e.source);
    }

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    let mut sink = TracingSink;
    let mut cycle: u64 = 0;
    let mut operator = OperatorInput {
        enabled: true,
        ..OperatorInput::default()
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Control loop running every {:?}", period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }

        // Demo operator: start intaking, and load both balls after a second
        operator.intake = cycle == 1;
        if cycle == 50 {
            sim.set_balls(true, true);
        }

        let report = core.tick(started.elapsed(), &operator, &mut sink);
        if report.decision.state == RobotState::Shooting && report.commands.hopper_volts > 0.0 {
            // Simulated cargo leaves once the feeder runs
            sim.set_balls(false, false);
        }
        sim.step(period.as_secs_f64());

        cycle += 1;
        if max_cycles.is_some_and(|max| cycle >= max) {
            break;
        }
    }

    core.shutdown().context("shutdown failed")?;
    info!("Stopped after {} cycles", cycle);
    Ok(())
}
