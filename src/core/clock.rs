//! Frame clock and day cycle
//!
//! The render loop hands the simulation a delta-time every frame. The clock
//! sanitises that delta, accumulates simulated seconds, and derives the
//! day-cycle scalar (0.0 = midnight, 0.5 = noon) used for NPC schedules.

use serde::{Deserialize, Serialize};

/// Slack used when comparing accumulated frame time against a duration
pub const TIME_EPSILON: f32 = 1e-4;

/// True once `elapsed` seconds cover `duration` seconds
pub fn duration_reached(elapsed: f32, duration: f32) -> bool {
    elapsed + TIME_EPSILON >= duration
}

/// Time of day phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,  // 0.20-0.30
    Day,   // 0.30-0.70
    Dusk,  // 0.70-0.80
    Night, // 0.80-0.20
}

impl TimeOfDay {
    pub fn from_day_time(t: f32) -> Self {
        match t {
            t if (0.2..0.3).contains(&t) => TimeOfDay::Dawn,
            t if (0.3..0.7).contains(&t) => TimeOfDay::Day,
            t if (0.7..0.8).contains(&t) => TimeOfDay::Dusk,
            _ => TimeOfDay::Night,
        }
    }
}

/// Time information for a single frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Sanitised seconds since the previous frame
    pub delta: f32,
    /// Simulated seconds since the world started, including this frame
    pub now: f64,
}

/// Simulation clock tied to the render loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    elapsed: f64,
    frame: u64,
    day_length_seconds: f32,
    start_day_time: f32,
}

impl Clock {
    pub fn new(day_length_seconds: f32, start_day_time: f32) -> Self {
        Self {
            elapsed: 0.0,
            frame: 0,
            day_length_seconds: day_length_seconds.max(1.0),
            start_day_time: start_day_time.rem_euclid(1.0),
        }
    }

    /// Clamp a raw frame delta into something every subsystem can consume.
    /// Negative, NaN and infinite deltas become zero.
    pub fn sanitize_delta(delta: f32) -> f32 {
        if delta.is_finite() && delta > 0.0 {
            delta
        } else {
            0.0
        }
    }

    pub fn advance(&mut self, delta: f32) -> FrameTime {
        let delta = Self::sanitize_delta(delta);
        self.elapsed += delta as f64;
        self.frame += 1;
        FrameTime {
            delta,
            now: self.elapsed,
        }
    }

    pub fn now(&self) -> f64 {
        self.elapsed
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Day-cycle scalar in [0, 1)
    pub fn day_time(&self) -> f32 {
        let days = self.elapsed / self.day_length_seconds as f64;
        ((days.fract() as f32) + self.start_day_time).rem_euclid(1.0)
    }

    pub fn day_number(&self) -> u64 {
        ((self.elapsed / self.day_length_seconds as f64) + self.start_day_time as f64) as u64
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_day_time(self.day_time())
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.frame = 0;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(600.0, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day_from_scalar() {
        assert_eq!(TimeOfDay::from_day_time(0.0), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_day_time(0.25), TimeOfDay::Dawn);
        assert_eq!(TimeOfDay::from_day_time(0.5), TimeOfDay::Day);
        assert_eq!(TimeOfDay::from_day_time(0.75), TimeOfDay::Dusk);
        assert_eq!(TimeOfDay::from_day_time(0.95), TimeOfDay::Night);
    }

    #[test]
    fn test_duration_reached_tolerates_rounding() {
        let mut elapsed = 0.0f32;
        for _ in 0..30 {
            elapsed += 0.1;
        }
        assert!(duration_reached(elapsed, 3.0));
        assert!(!duration_reached(2.9, 3.0));
        assert!(duration_reached(0.0, 0.0));
    }

    #[test]
    fn test_clock_advances() {
        let mut clock = Clock::new(100.0, 0.0);
        let frame = clock.advance(0.5);
        assert_eq!(frame.delta, 0.5);
        assert!((frame.now - 0.5).abs() < 1e-9);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_clock_rejects_bad_deltas() {
        let mut clock = Clock::new(100.0, 0.0);
        assert_eq!(clock.advance(-1.0).delta, 0.0);
        assert_eq!(clock.advance(f32::NAN).delta, 0.0);
        assert_eq!(clock.advance(f32::INFINITY).delta, 0.0);
        assert_eq!(clock.now(), 0.0);
    }

    #[test]
    fn test_day_time_wraps() {
        let mut clock = Clock::new(100.0, 0.5);
        assert!((clock.day_time() - 0.5).abs() < 1e-6);

        clock.advance(25.0);
        assert!((clock.day_time() - 0.75).abs() < 1e-5);

        clock.advance(50.0);
        assert!((clock.day_time() - 0.25).abs() < 1e-5);
        assert_eq!(clock.day_number(), 1);
    }

    #[test]
    fn test_reset_keeps_day_settings() {
        let mut clock = Clock::new(100.0, 0.3);
        clock.advance(42.0);
        clock.reset();
        assert_eq!(clock.now(), 0.0);
        assert!((clock.day_time() - 0.3).abs() < 1e-6);
    }
}
