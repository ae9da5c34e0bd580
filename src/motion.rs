// Cyclometer - Motion Tracker
//
// Turns debounced wheel pulses into a step count, distance and speed.
// Pulses arriving faster than `min_step_duration_ms` after the previous
// accepted one are treated as reed switch bounce and dropped entirely.

use crate::config::{MotionConfig, MS_PER_HOUR};
use crate::history::HistoryBuffer;

/// Reference point for the next speed computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    /// No pulse seen since power-up.
    NoBaseline,
    /// Timestamp (ms) of the last accepted pulse.
    Baseline(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    Accepted,
    /// Too close to the previous pulse; nothing was updated.
    Rejected,
}

pub struct MotionTracker {
    config: MotionConfig,
    steps_total: u32,
    baseline: Baseline,
    speed_kmh: f32,
    speed_max_kmh: f32,
}

impl MotionTracker {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            steps_total: 0,
            baseline: Baseline::NoBaseline,
            speed_kmh: 0.0,
            speed_max_kmh: 0.0,
        }
    }

    /// Handle one sensor pulse observed at `now_ms`.
    pub fn on_rotation<const N: usize>(
        &mut self,
        now_ms: u64,
        history: &mut HistoryBuffer<N>,
    ) -> RotationOutcome {
        match self.baseline {
            Baseline::NoBaseline => {}
            Baseline::Baseline(last_ms) => {
                let elapsed_ms = now_ms.saturating_sub(last_ms);
                if elapsed_ms == 0 || elapsed_ms < self.config.min_step_duration_ms as u64 {
                    log::debug!("Bounce rejected ({} ms after last pulse)", elapsed_ms);
                    return RotationOutcome::Rejected;
                }
                self.speed_kmh = self.config.step_length_km * MS_PER_HOUR / elapsed_ms as f32;
                if self.speed_kmh > self.speed_max_kmh {
                    self.speed_max_kmh = self.speed_kmh;
                }
            }
        }

        self.baseline = Baseline::Baseline(now_ms);
        self.steps_total = self.steps_total.saturating_add(1);
        history.record_current();
        RotationOutcome::Accepted
    }

    pub fn steps_total(&self) -> u32 {
        self.steps_total
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    pub fn total_distance_km(&self) -> f32 {
        self.steps_total as f32 * self.config.step_length_km
    }

    pub fn current_speed_kmh(&self) -> f32 {
        self.speed_kmh
    }

    pub fn max_speed_kmh(&self) -> f32 {
        self.speed_max_kmh
    }

    /// Convert a step count (e.g. a history figure) into kilometres.
    pub fn steps_to_km(&self, steps: u32) -> f32 {
        steps as f32 * self.config.step_length_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_config() -> MotionConfig {
        MotionConfig {
            step_length_km: 314.159 / 1_000_000.0,
            min_step_duration_ms: 600,
        }
    }

    #[test]
    fn first_pulse_counts_without_speed() {
        let mut tracker = MotionTracker::new(scenario_config());
        let mut history = HistoryBuffer::<4>::new();

        assert_eq!(tracker.on_rotation(5_000, &mut history), RotationOutcome::Accepted);
        assert_eq!(tracker.steps_total(), 1);
        assert_eq!(tracker.baseline(), Baseline::Baseline(5_000));
        assert_eq!(tracker.current_speed_kmh(), 0.0);
        assert_eq!(history.buckets()[0], 1);
    }

    #[test]
    fn speed_from_two_pulses_then_bounce_rejected() {
        let mut tracker = MotionTracker::new(scenario_config());
        let mut history = HistoryBuffer::<4>::new();

        tracker.on_rotation(1_000, &mut history);
        assert_eq!(tracker.on_rotation(2_000, &mut history), RotationOutcome::Accepted);
        let speed = tracker.current_speed_kmh();
        assert!((speed - 1.131).abs() < 0.001, "speed was {}", speed);

        assert_eq!(tracker.on_rotation(2_500, &mut history), RotationOutcome::Rejected);
        assert_eq!(tracker.steps_total(), 2);
        assert_eq!(tracker.current_speed_kmh(), speed);
        assert_eq!(tracker.baseline(), Baseline::Baseline(2_000));
        assert_eq!(history.buckets()[0], 2);
    }

    #[test]
    fn rejected_pulse_does_not_move_baseline() {
        let mut tracker = MotionTracker::new(scenario_config());
        let mut history = HistoryBuffer::<4>::new();

        tracker.on_rotation(0, &mut history);
        tracker.on_rotation(400, &mut history);
        // 700 ms after the accepted pulse, even though only 300 ms after the bounce.
        assert_eq!(tracker.on_rotation(700, &mut history), RotationOutcome::Accepted);
        assert_eq!(tracker.steps_total(), 2);
    }

    #[test]
    fn zero_elapsed_is_rejected_even_without_debounce() {
        let mut tracker = MotionTracker::new(MotionConfig {
            step_length_km: 0.002,
            min_step_duration_ms: 0,
        });
        let mut history = HistoryBuffer::<4>::new();

        tracker.on_rotation(100, &mut history);
        assert_eq!(tracker.on_rotation(100, &mut history), RotationOutcome::Rejected);
        assert!(tracker.current_speed_kmh().is_finite());
    }

    #[test]
    fn max_speed_tracks_fastest_accepted_pulse() {
        let mut tracker = MotionTracker::new(scenario_config());
        let mut history = HistoryBuffer::<4>::new();

        let mut now = 0;
        tracker.on_rotation(now, &mut history);
        let mut fastest: f32 = 0.0;
        for gap in [1_000, 700, 2_000, 650, 3_000] {
            now += gap;
            tracker.on_rotation(now, &mut history);
            fastest = fastest.max(tracker.current_speed_kmh());
            assert!(tracker.max_speed_kmh() >= tracker.current_speed_kmh());
            assert_eq!(tracker.max_speed_kmh(), fastest);
        }
        assert_eq!(tracker.steps_total(), 6);
    }

    #[test]
    fn steps_increase_by_one_per_accepted_pulse() {
        let mut tracker = MotionTracker::new(scenario_config());
        let mut history = HistoryBuffer::<4>::new();

        for n in 0..20u64 {
            let before = tracker.steps_total();
            tracker.on_rotation(n * 600, &mut history);
            assert_eq!(tracker.steps_total(), before + 1);
        }
        assert!((tracker.total_distance_km() - 20.0 * 0.000314159).abs() < 1e-6);
    }
}
