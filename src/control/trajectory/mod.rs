//! Trapezoidal motion profiles

/// Velocity and acceleration limits of a profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub max_velocity: f64,
    pub max_acceleration: f64,
}

impl Constraints {
    pub fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Constraints {
            max_velocity,
            max_acceleration,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.max_velocity.is_finite()
            && self.max_acceleration.is_finite()
            && self.max_velocity > 0.0
            && self.max_acceleration > 0.0
    }
}

/// Position and velocity along one axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfileState {
    pub position: f64,
    pub velocity: f64,
}

impl ProfileState {
    pub fn new(position: f64, velocity: f64) -> Self {
        ProfileState { position, velocity }
    }
}

/// A profile that accelerates, cruises and decelerates within its constraints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    constraints: Constraints,
}

impl TrapezoidProfile {
    pub fn new(constraints: Constraints) -> Self {
        TrapezoidProfile { constraints }
    }

    pub fn constraints(&self) -> Constraints {
        self.constraints
    }

    /// State `t` seconds along the profile from `current` toward `goal`
    pub fn calculate(&self, t: f64, current: ProfileState, goal: ProfileState) -> ProfileState {
        let max_v = self.constraints.max_velocity;
        let max_a = self.constraints.max_acceleration;

        // Solve every profile as if moving forward, then flip back
        let direction = if current.position > goal.position { -1.0 } else { 1.0 };
        let direct = |s: ProfileState| ProfileState::new(s.position * direction, s.velocity * direction);
        let mut current = direct(current);
        let goal = direct(goal);

        if current.velocity.abs() > max_v {
            current.velocity = current.velocity.signum() * max_v;
        }

        let cutoff_begin = current.velocity / max_a;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_a / 2.0;
        let cutoff_end = goal.velocity / max_a;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_a / 2.0;

        let full_trapezoid_dist = cutoff_dist_begin + (goal.position - current.position) + cutoff_dist_end;
        let mut acceleration_time = max_v / max_a;
        let mut full_speed_dist = full_trapezoid_dist - acceleration_time * acceleration_time * max_a;

        // Triangular profile: never reaches cruise velocity
        if full_speed_dist < 0.0 {
            acceleration_time = (full_trapezoid_dist / max_a).max(0.0).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = acceleration_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_v;
        let end_decel = end_full_speed + acceleration_time - cutoff_end;

        let mut result = current;
        if t < end_accel {
            result.velocity += t * max_a;
            result.position += (current.velocity + t * max_a / 2.0) * t;
        } else if t < end_full_speed {
            result.velocity = max_v;
            result.position += (current.velocity + end_accel * max_a / 2.0) * end_accel + max_v * (t - end_accel);
        } else if t <= end_decel {
            let time_left = end_decel - t;
            result.velocity = goal.velocity + time_left * max_a;
            result.position = goal.position - (goal.velocity + time_left * max_a / 2.0) * time_left;
        } else {
            result = goal;
        }

        direct(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn profile() -> TrapezoidProfile {
        TrapezoidProfile::new(Constraints::new(2.0, 1.0))
    }

    #[test]
    fn never_exceeds_constraints() {
        let p = profile();
        let goal = ProfileState::new(10.0, 0.0);
        let mut state = ProfileState::default();
        let dt = 0.02;
        for _ in 0..2000 {
            let next = p.calculate(dt, state, goal);
            assert!(next.velocity.abs() <= 2.0 + 1e-9);
            assert!((next.velocity - state.velocity).abs() <= 1.0 * dt + 1e-9);
            state = next;
        }
        assert_abs_diff_eq!(state.position, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.velocity, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn reverse_direction_is_mirrored() {
        let p = profile();
        let fwd = p.calculate(0.5, ProfileState::default(), ProfileState::new(3.0, 0.0));
        let rev = p.calculate(0.5, ProfileState::default(), ProfileState::new(-3.0, 0.0));
        assert_abs_diff_eq!(fwd.position, -rev.position, epsilon = 1e-12);
        assert_abs_diff_eq!(fwd.velocity, -rev.velocity, epsilon = 1e-12);
    }

    #[test]
    fn long_horizon_returns_goal() {
        let p = profile();
        let goal = ProfileState::new(1.0, 0.0);
        assert_eq!(p.calculate(100.0, ProfileState::default(), goal), goal);
    }

    #[test]
    fn first_step_accelerates_from_rest() {
        let p = profile();
        let s = p.calculate(0.1, ProfileState::default(), ProfileState::new(5.0, 0.0));
        assert_abs_diff_eq!(s.velocity, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(s.position, 0.005, epsilon = 1e-12);
    }
}
