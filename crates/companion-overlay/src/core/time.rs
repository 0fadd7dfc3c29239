/// Fixed timestep accumulator for the overlay tick.
///
/// Frame deltas are clamped to `max_dt` first, so a long hitch (window drag,
/// debugger pause) turns into at most `max_dt` of simulated time instead of a
/// burst of catch-up steps that would tunnel items through the ground.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    dt: f32,
    max_dt: f32,
    accumulator: f32,
    /// Total simulated seconds.
    elapsed: f64,
}

impl FixedTimestep {
    pub fn new(dt: f32, max_dt: f32) -> Self {
        Self {
            dt,
            max_dt: max_dt.max(dt),
            accumulator: 0.0,
            elapsed: 0.0,
        }
    }

    /// Add frame time. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += clamp_dt(frame_dt, self.max_dt);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    /// Record that one fixed step ran. Returns the new simulated time.
    pub fn advance(&mut self) -> f64 {
        self.elapsed += self.dt as f64;
        self.elapsed
    }

    /// Interpolation alpha between ticks (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn now(&self) -> f64 {
        self.elapsed
    }
}

/// Clamp a frame delta into `[0, max_dt]`. NaN becomes zero.
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_nan() {
        0.0
    } else {
        dt.clamp(0.0, max_dt)
    }
}

/// Repeating timer on the simulated clock.
#[derive(Debug, Clone)]
pub struct Interval {
    period: f64,
    next_due: f64,
}

impl Interval {
    /// The first `poll` at or after `start` fires.
    pub fn new(period: f64, start: f64) -> Self {
        Self { period, next_due: start }
    }

    /// Returns true at most once per period. Missed periods are not replayed.
    pub fn poll(&mut self, now: f64) -> bool {
        if now + 1e-9 < self.next_due {
            return false;
        }
        self.next_due = now + self.period;
        true
    }

    /// Make the next `poll` fire regardless of the period.
    pub fn trigger(&mut self) {
        self.next_due = f64::NEG_INFINITY;
    }

    pub fn period(&self) -> f64 {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_step_exact() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.1);
        assert_eq!(ts.accumulate(1.0 / 60.0), 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut ts = FixedTimestep::new(1.0 / 60.0, 0.1);
        assert_eq!(ts.accumulate(0.008), 0);
        assert_eq!(ts.accumulate(0.010), 1);
    }

    #[test]
    fn hitch_is_clamped_to_max_dt() {
        let mut ts = FixedTimestep::new(0.0625, 0.25);
        // A full second of stall becomes a quarter second, i.e. 4 steps.
        assert_eq!(ts.accumulate(1.0), 4);
    }

    #[test]
    fn negative_and_nan_deltas_are_ignored() {
        assert_eq!(clamp_dt(-1.0, 0.1), 0.0);
        assert_eq!(clamp_dt(f32::NAN, 0.1), 0.0);
        assert_eq!(clamp_dt(0.05, 0.1), 0.05);
    }

    #[test]
    fn advance_tracks_simulated_time() {
        let mut ts = FixedTimestep::new(0.5, 1.0);
        ts.advance();
        assert!((ts.advance() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn interval_fires_once_per_period() {
        let mut timer = Interval::new(0.1, 0.0);
        assert!(timer.poll(0.0));
        assert!(!timer.poll(0.05));
        assert!(timer.poll(0.1));
        assert!(!timer.poll(0.15));
        timer.trigger();
        assert!(timer.poll(0.16));
    }
}
