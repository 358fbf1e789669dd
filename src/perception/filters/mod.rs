//! Filters for noisy boolean signals

use std::time::Duration;

/// A filter over a sampled signal
pub trait Filter<T> {
    /// Feed the sample taken at `now` and return the filtered value
    fn filter(&mut self, input: T, now: Duration) -> T;

    /// Forget all history
    fn reset(&mut self);
}

/// Rising-edge debouncer.
///
/// The output goes true only after the input has stayed true for the whole
/// window; it drops to false as soon as the input does.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    rising_since: Option<Duration>,
    output: bool,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            rising_since: None,
            output: false,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn output(&self) -> bool {
        self.output
    }
}

impl Filter<bool> for Debouncer {
    fn filter(&mut self, input: bool, now: Duration) -> bool {
        if input {
            let since = *self.rising_since.get_or_insert(now);
            self.output = now.saturating_sub(since) >= self.window;
        } else {
            self.rising_since = None;
            self.output = false;
        }
        self.output
    }

    fn reset(&mut self) {
        self.rising_since = None;
        self.output = false;
    }
}

/// True for exactly one sample when the input goes from false to true
#[derive(Debug, Clone, Default)]
pub struct RisingEdge {
    previous: bool,
}

impl RisingEdge {
    pub fn new() -> Self {
        RisingEdge::default()
    }
}

impl Filter<bool> for RisingEdge {
    fn filter(&mut self, input: bool, _now: Duration) -> bool {
        let edge = input && !self.previous;
        self.previous = input;
        edge
    }

    fn reset(&mut self) {
        self.previous = false;
    }
}

/// True for exactly one sample when the input goes from true to false
#[derive(Debug, Clone, Default)]
pub struct FallingEdge {
    previous: bool,
}

impl FallingEdge {
    pub fn new() -> Self {
        FallingEdge::default()
    }
}

impl Filter<bool> for FallingEdge {
    fn filter(&mut self, input: bool, _now: Duration) -> bool {
        let edge = !input && self.previous;
        self.previous = input;
        edge
    }

    fn reset(&mut self) {
        self.previous = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn debouncer_waits_for_window() {
        let mut d = Debouncer::new(ms(200));
        assert!(!d.filter(true, ms(0)));
        assert!(!d.filter(true, ms(180)));
        assert!(d.filter(true, ms(200)));
        assert!(d.filter(true, ms(500)));
    }

    #[test]
    fn short_pulse_never_passes() {
        let mut d = Debouncer::new(ms(200));
        let mut t = 0;
        for input in [true, true, true, false, true, true, false] {
            assert!(!d.filter(input, ms(t)));
            t += 40;
        }
    }

    #[test]
    fn falling_is_immediate() {
        let mut d = Debouncer::new(ms(100));
        d.filter(true, ms(0));
        assert!(d.filter(true, ms(100)));
        assert!(!d.filter(false, ms(120)));
    }

    #[test]
    fn zero_window_passes_through() {
        let mut d = Debouncer::new(Duration::ZERO);
        assert!(d.filter(true, ms(0)));
    }

    #[test]
    fn edges_fire_once() {
        let mut rising = RisingEdge::new();
        let mut falling = FallingEdge::new();
        let inputs = [false, true, true, false, false, true];
        let r: Vec<bool> = inputs.iter().map(|&i| rising.filter(i, ms(0))).collect();
        let f: Vec<bool> = inputs.iter().map(|&i| falling.filter(i, ms(0))).collect();
        assert_eq!(r, [false, true, false, false, false, true]);
        assert_eq!(f, [false, false, false, true, false, false]);
    }
}
