//! Synthetic ride data
//!
//! Produces a plausible, slowly varying cycling workout so the glasses can
//! be exercised without a ride computer. Samples go through the same
//! snapshot as live data.

use crate::metrics::Metric;

/// Simulated seconds per tick
const TICK_S: f32 = 2.0;

/// Deterministic workout generator
#[derive(Debug, Clone, Default)]
pub struct RideSimulator {
    tick: u32,
    distance_m: f32,
}

impl RideSimulator {
    pub const fn new() -> Self {
        Self {
            tick: 0,
            distance_m: 0.0,
        }
    }

    /// Advance one tick and return the new samples in raw units
    pub fn next_samples(&mut self) -> [(Metric, f32); 6] {
        self.tick = self.tick.wrapping_add(1);
        let t = self.tick;

        // Triangle waves with co-prime periods keep the numbers moving
        let wave = |period: u32, amplitude: f32| {
            let phase = (t % period) as f32 / period as f32;
            let tri = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
            tri * amplitude
        };

        let speed = 7.5 + wave(11, 2.5);
        self.distance_m += speed * TICK_S;

        [
            (Metric::Speed, speed),
            (Metric::HeartRate, 128.0 + wave(13, 30.0)),
            (Metric::Cadence, 82.0 + wave(7, 14.0)),
            (Metric::Power, 180.0 + wave(17, 90.0)),
            (Metric::Distance, self.distance_m),
            (Metric::ElapsedTime, t as f32 * TICK_S),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_plausible() {
        let mut sim = RideSimulator::new();
        let mut last_distance = 0.0;
        for _ in 0..100 {
            let samples = sim.next_samples();
            let (_, speed) = samples[0];
            assert!((7.5..=10.0).contains(&speed));
            let (_, distance) = samples[4];
            assert!(distance > last_distance);
            last_distance = distance;
        }
        let (metric, elapsed) = sim.next_samples()[5];
        assert_eq!(metric, Metric::ElapsedTime);
        assert_eq!(elapsed, 202.0);
    }
}
