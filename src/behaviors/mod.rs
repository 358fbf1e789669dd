//! Robot-level behavior state machine
pub mod actions;
pub mod triggers;

use self::actions::Action;
use self::triggers::{holds, known, FaultLatch, Predicate};
use crate::perception::{FallingEdge, Filter, Reading, RisingEdge};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Top-level robot state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotState {
    #[default]
    Idling,
    Intaking,
    Shooting,
    StaticShooting,
}

impl RobotState {
    pub fn name(&self) -> &'static str {
        match self {
            RobotState::Idling => "Idling",
            RobotState::Intaking => "Intaking",
            RobotState::Shooting => "Shooting",
            RobotState::StaticShooting => "StaticShooting",
        }
    }

    /// What the robot does on the cycle it is requested into this state
    fn entry_action(&self) -> Action {
        match self {
            RobotState::Idling => Action::StopAll,
            RobotState::Intaking => Action::StopShooting,
            RobotState::Shooting => Action::StopRollers,
            RobotState::StaticShooting => Action::StaticShot,
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operator and robot-mode inputs sampled once per cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorInput {
    /// Robot enabled by the field / driver station
    pub enabled: bool,
    pub intake: bool,
    pub shoot: bool,
    pub idle: bool,
    /// Held while static shooting
    pub static_shoot: bool,
    /// Keep shooting even when the sensors report no cargo
    pub force_shoot: bool,
    /// Start shooting with only the back ball loaded
    pub shoot_one_ball: bool,
}

/// Guard predicate values for one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Guards {
    pub disabled: bool,
    /// Debounced roller (front) ball sensor
    pub front_ball: Reading,
    /// Debounced hopper (back) ball sensor
    pub back_ball: Reading,
    pub force_shoot: bool,
    pub shoot_one_ball: bool,
    pub in_dead_zone: bool,
    pub turret_in_range: bool,
    /// Compensation enabled, so shots are taken while moving
    pub shoot_on_move: bool,
    /// Vision intake requested and a piece is visible
    pub vision_intake: bool,
}

impl Guards {
    /// Neither ball sensor sees cargo
    pub fn cargo_empty(&self) -> Reading {
        self.front_ball.clone().either(self.back_ball.clone()).negate()
    }
}

/// Outcome of one state machine step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: RobotState,
    pub action: Action,
    pub transitioned: bool,
    /// A guard could not be evaluated this cycle
    pub guard_faulted: bool,
}

/// Runs the state table once per cycle
pub struct BehaviorManager {
    state: RobotState,
    last_action: Action,
    intake_pressed: RisingEdge,
    shoot_pressed: RisingEdge,
    idle_pressed: RisingEdge,
    static_pressed: RisingEdge,
    static_released: FallingEdge,
    slow_back_window: Duration,
    slow_back_since: Option<Duration>,
    guard_latch: FaultLatch,
}

impl BehaviorManager {
    pub fn new(slow_back_window: Duration) -> Self {
        BehaviorManager {
            state: RobotState::Idling,
            last_action: Action::StopAll,
            intake_pressed: RisingEdge::new(),
            shoot_pressed: RisingEdge::new(),
            idle_pressed: RisingEdge::new(),
            static_pressed: RisingEdge::new(),
            static_released: FallingEdge::new(),
            slow_back_window,
            slow_back_since: None,
            guard_latch: FaultLatch::new("RobotState guards"),
        }
    }

    pub fn state(&self) -> RobotState {
        self.state
    }

    /// Evaluate one cycle: disabled guard, then operator requests, then the
    /// table for the current state.
    pub fn update(&mut self, now: Duration, input: &OperatorInput, guards: &Guards) -> Decision {
        let request = self.operator_request(now, input);

        let (next, action, faulted) = if guards.disabled {
            (RobotState::Idling, Action::StopAll, false)
        } else if let Some(requested) = request.filter(|r| *r != self.state) {
            debug!("Operator requested {requested}");
            (requested, requested.entry_action(), false)
        } else {
            self.evaluate(guards)
        };

        let guard_result = if faulted {
            // First failing sensor
            guards.front_ball.clone().and(guards.back_ball.clone()).map(|_| ())
        } else {
            Ok(())
        };
        self.guard_latch.observe(&guard_result);

        let action = self.time_slow_back(now, action);
        let transitioned = next != self.state;
        if transitioned {
            info!("RobotState {} -> {} ({})", self.state, next, action.name());
        }
        self.state = next;
        self.last_action = action;

        Decision {
            state: next,
            action,
            transitioned,
            guard_faulted: faulted,
        }
    }

    fn operator_request(&mut self, now: Duration, input: &OperatorInput) -> Option<RobotState> {
        // Every detector sees every cycle, so presses while disabled are consumed
        let idle = self.idle_pressed.filter(input.idle, now);
        let static_on = self.static_pressed.filter(input.static_shoot, now);
        let static_off = self.static_released.filter(input.static_shoot, now);
        let shoot = self.shoot_pressed.filter(input.shoot, now);
        let intake = self.intake_pressed.filter(input.intake, now);

        if idle {
            Some(RobotState::Idling)
        } else if static_on {
            Some(RobotState::StaticShooting)
        } else if static_off && self.state == RobotState::StaticShooting {
            Some(RobotState::Shooting)
        } else if shoot {
            Some(RobotState::Shooting)
        } else if intake {
            Some(RobotState::Intaking)
        } else {
            None
        }
    }

    fn evaluate(&self, guards: &Guards) -> (RobotState, Action, bool) {
        match self.state {
            RobotState::Idling => (RobotState::Idling, Action::StopAll, false),
            RobotState::StaticShooting => (RobotState::StaticShooting, Action::StaticShot, false),
            RobotState::Shooting => {
                let empty = guards.cargo_empty();
                if holds(&empty) && !guards.force_shoot {
                    return (RobotState::Intaking, Action::StopShooting, false);
                }
                let faulted = empty.is_err() && !guards.force_shoot;
                let action = if !guards.in_dead_zone && (guards.turret_in_range || guards.shoot_on_move) {
                    Action::RunShooter
                } else {
                    Action::AlignForShot
                };
                (RobotState::Shooting, action, faulted)
            }
            RobotState::Intaking => {
                let front = || guards.front_ball.clone();
                let back = || guards.back_ball.clone();
                let align_to_piece = guards.vision_intake && !guards.force_shoot;

                let loaded = back().both(front().either(known(guards.shoot_one_ball)));
                if holds(&loaded) {
                    return (RobotState::Shooting, Action::StopRollers, false);
                }
                if holds(&back().both(front().negate())) {
                    let action = Action::SlowFeedBack {
                        pulse_active: true,
                        align_to_piece,
                    };
                    return (RobotState::Intaking, action, false);
                }
                if holds(&front().both(back().negate())) {
                    return (RobotState::Intaking, Action::IntakeFrontOnly, false);
                }
                if holds(&guards.cargo_empty()) {
                    return (RobotState::Intaking, Action::RunIntake { align_to_piece }, false);
                }
                (RobotState::Intaking, Action::Hold, true)
            }
        }
    }

    /// The reverse pulse runs for a fixed window from the cycle it starts
    fn time_slow_back(&mut self, now: Duration, action: Action) -> Action {
        match action {
            Action::SlowFeedBack { align_to_piece, .. } => {
                if !matches!(self.last_action, Action::SlowFeedBack { .. }) {
                    self.slow_back_since = Some(now);
                }
                let since = *self.slow_back_since.get_or_insert(now);
                Action::SlowFeedBack {
                    pulse_active: now.saturating_sub(since) < self.slow_back_window,
                    align_to_piece,
                }
            }
            other => {
                self.slow_back_since = None;
                other
            }
        }
    }
}
