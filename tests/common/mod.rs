#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use turret_core::behaviors::OperatorInput;
use turret_core::config::RobotConfig;
use turret_core::subsystems::sim::{sim_hardware, SimHandle, SimState};
use turret_core::telemetry::MemorySink;
use turret_core::tuning::TunableRegistry;
use turret_core::{CycleReport, RobotCore};

pub const VELOCITY_CSV: &str = "distance,velocity\n1.0,30.0\n3.0,40.0\n5.0,50.0\n";
pub const HOOD_CSV: &str = "distance,angle\n1.0,5.0\n3.0,15.0\n5.0,25.0\n";

pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

/// A configured core running on simulated hardware
pub struct Harness {
    pub core: RobotCore,
    pub sim: SimHandle,
    pub tuning: TunableRegistry,
    pub sink: MemorySink,
    pub now: Duration,
    pub input: OperatorInput,
    _dir: TempDir,
}

impl Harness {
    pub fn new(initial: SimState) -> Self {
        Harness::with_tables(initial, Some((VELOCITY_CSV, HOOD_CSV)))
    }

    /// `tables` of None points the config at files that do not exist
    pub fn with_tables(initial: SimState, tables: Option<(&str, &str)>) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = RobotConfig::default();
        match tables {
            Some((velocity, hood)) => {
                config.shooter.velocity_table = write_file(&dir, "velocity.csv", velocity);
                config.shooter.hood_table = write_file(&dir, "hood.csv", hood);
            }
            None => {
                config.shooter.velocity_table = dir.path().join("missing_velocity.csv");
                config.shooter.hood_table = dir.path().join("missing_hood.csv");
            }
        }

        let (hardware, sim) = sim_hardware(initial);
        let tuning = TunableRegistry::new();
        let mut core = RobotCore::new(config, hardware, &tuning).unwrap();
        core.init();
        Harness {
            core,
            sim,
            tuning,
            sink: MemorySink::new(),
            now: Duration::ZERO,
            input: OperatorInput {
                enabled: true,
                ..OperatorInput::default()
            },
            _dir: dir,
        }
    }

    /// Run one 20 ms cycle
    pub fn tick(&mut self) -> CycleReport {
        let report = self.core.tick(self.now, &self.input, &mut self.sink);
        self.now += Duration::from_millis(20);
        report
    }

    /// Let the ball sensors settle past their debounce window
    pub fn settle(&mut self) -> CycleReport {
        self.run(11)
    }

    pub fn run(&mut self, cycles: usize) -> CycleReport {
        let mut last = self.tick();
        for _ in 1..cycles {
            last = self.tick();
        }
        last
    }

    /// Hold a button for one cycle
    pub fn press(&mut self, button: Button) -> CycleReport {
        self.set(button, true);
        let report = self.tick();
        self.set(button, false);
        report
    }

    pub fn set(&mut self, button: Button, value: bool) {
        let field = match button {
            Button::Intake => &mut self.input.intake,
            Button::Shoot => &mut self.input.shoot,
            Button::Idle => &mut self.input.idle,
            Button::StaticShoot => &mut self.input.static_shoot,
        };
        *field = value;
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Button {
    Intake,
    Shoot,
    Idle,
    StaticShoot,
}
