use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::settings::{clamp_bpm, BPM_MAX, BPM_MIN};

pub const DEFAULT_TAP_HISTORY: usize = 6;
const MIN_TAP_HISTORY: usize = 2;

/// Tuning for the tap-tempo estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    /// Number of taps kept for averaging.
    pub history_capacity: usize,
    /// When set, a tap arriving this long after the previous one starts a
    /// fresh history. `None` keeps every tap until it is evicted.
    pub idle_reset_ms: Option<f64>,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_TAP_HISTORY,
            idle_reset_ms: None,
        }
    }
}

/// Estimates BPM from the spacing of the most recent taps.
#[derive(Debug, Clone)]
pub struct TapTempo {
    taps: VecDeque<f64>,
    capacity: usize,
    idle_reset_ms: Option<f64>,
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new(TempoConfig::default())
    }
}

impl TapTempo {
    pub fn new(config: TempoConfig) -> Self {
        let capacity = config.history_capacity.max(MIN_TAP_HISTORY);
        Self {
            taps: VecDeque::with_capacity(capacity + 1),
            capacity,
            idle_reset_ms: config.idle_reset_ms,
        }
    }

    /// Records a tap at `timestamp_ms` and returns the new estimate, or `None`
    /// while fewer than two taps are known.
    pub fn record_tap(&mut self, timestamp_ms: f64) -> Option<u32> {
        if let (Some(limit), Some(&last)) = (self.idle_reset_ms, self.taps.back()) {
            if timestamp_ms - last > limit {
                tracing::debug!(gap_ms = timestamp_ms - last, "tap history reset after idle gap");
                self.taps.clear();
            }
        }

        self.taps.push_back(timestamp_ms);
        while self.taps.len() > self.capacity {
            self.taps.pop_front();
        }

        let bpm = self.estimate()?;
        tracing::debug!(bpm, taps = self.taps.len(), "tap tempo estimate");
        Some(bpm)
    }

    /// Current estimate from the recorded history.
    pub fn estimate(&self) -> Option<u32> {
        if self.taps.len() < MIN_TAP_HISTORY {
            return None;
        }

        let (sum, count) = self
            .taps
            .iter()
            .zip(self.taps.iter().skip(1))
            .fold((0.0, 0usize), |(sum, count), (prev, next)| {
                (sum + (next - prev), count + 1)
            });
        let average_interval = sum / count as f64;

        if average_interval == 0.0 {
            return Some(BPM_MAX);
        }

        // Out-of-order taps give a negative mean, which clamps to the floor.
        let bpm = (60_000.0 / average_interval).round();
        Some(clamp_bpm(bpm as i64))
    }

    pub fn taps(&self) -> impl Iterator<Item = f64> + '_ {
        self.taps.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tap_all(tempo: &mut TapTempo, taps: &[f64]) -> Option<u32> {
        taps.iter().fold(None, |_, &t| tempo.record_tap(t))
    }

    #[test]
    fn single_tap_has_no_estimate() {
        let mut tempo = TapTempo::default();
        assert_eq!(tempo.record_tap(1_000.0), None);
        assert_eq!(tempo.len(), 1);
    }

    #[test]
    fn steady_half_second_taps_give_120() {
        let mut tempo = TapTempo::default();
        assert_eq!(tap_all(&mut tempo, &[0.0, 500.0, 1000.0, 1500.0]), Some(120));
    }

    #[test]
    fn fast_taps_clamp_to_upper_bound() {
        let mut tempo = TapTempo::default();
        // 60000 / 260 rounds to 231.
        assert_eq!(tap_all(&mut tempo, &[0.0, 260.0, 520.0]), Some(220));
    }

    #[test]
    fn slow_taps_clamp_to_lower_bound() {
        let mut tempo = TapTempo::default();
        assert_eq!(tap_all(&mut tempo, &[0.0, 10_000.0]), Some(40));
    }

    #[test]
    fn identical_timestamps_do_not_divide_by_zero() {
        let mut tempo = TapTempo::default();
        assert_eq!(tap_all(&mut tempo, &[5.0, 5.0]), Some(220));
    }

    #[test]
    fn out_of_order_taps_clamp_to_lower_bound() {
        let mut tempo = TapTempo::default();
        assert_eq!(tap_all(&mut tempo, &[1000.0, 0.0]), Some(BPM_MIN));
        // intervals -500, 100 -> mean -200
        let mut tempo = TapTempo::default();
        assert_eq!(tap_all(&mut tempo, &[1000.0, 500.0, 600.0]), Some(BPM_MIN));
    }

    #[test]
    fn averages_irregular_intervals() {
        let mut tempo = TapTempo::default();
        // intervals 400, 600, 500 -> mean 500
        assert_eq!(tap_all(&mut tempo, &[0.0, 400.0, 1000.0, 1500.0]), Some(120));
        // intervals 700, 800 -> mean 750 -> 80
        let mut tempo = TapTempo::default();
        assert_eq!(tap_all(&mut tempo, &[0.0, 700.0, 1500.0]), Some(80));
    }

    #[test]
    fn history_is_capped_and_evicts_oldest() {
        let mut tempo = TapTempo::default();
        // The first interval (2000 ms) drags the average down until evicted.
        let taps = [0.0, 2000.0, 2500.0, 3000.0, 3500.0, 4000.0];
        assert_eq!(tap_all(&mut tempo, &taps), Some(75));

        assert_eq!(tempo.record_tap(4500.0), Some(120));
        assert_eq!(tempo.len(), DEFAULT_TAP_HISTORY);
        assert!(tempo.taps().all(|t| t >= 2000.0));

        for i in 0..20 {
            tempo.record_tap(5000.0 + i as f64 * 500.0);
            assert!(tempo.len() <= DEFAULT_TAP_HISTORY);
        }
    }

    #[test]
    fn stale_taps_are_averaged_without_idle_reset() {
        let mut tempo = TapTempo::default();
        // intervals 10000, 500, 500 -> mean 3666.7 -> 16 -> clamped to 40
        assert_eq!(tap_all(&mut tempo, &[0.0, 10_000.0, 10_500.0, 11_000.0]), Some(40));
    }

    #[test]
    fn idle_reset_discards_stale_taps() {
        let mut tempo = TapTempo::new(TempoConfig {
            history_capacity: DEFAULT_TAP_HISTORY,
            idle_reset_ms: Some(2_000.0),
        });
        assert_eq!(tempo.record_tap(0.0), None);
        assert_eq!(tempo.record_tap(10_000.0), None);
        assert_eq!(tap_all(&mut tempo, &[10_500.0, 11_000.0]), Some(120));
    }

    #[test]
    fn tiny_capacity_is_raised_to_two() {
        let tempo = TapTempo::new(TempoConfig {
            history_capacity: 0,
            idle_reset_ms: None,
        });
        assert_eq!(tempo.capacity(), 2);
    }
}
