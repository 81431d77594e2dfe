//! Ride metric catalog
//!
//! Every metric the bridge subscribes to on the ride computer, with the
//! name, unit, icon and formatting used on the glasses.

use core::fmt::Write;

use heapless::String;

/// Maximum length of a formatted metric value
pub const VALUE_LEN: usize = 12;

/// A formatted metric value
pub type MetricValue = String<VALUE_LEN>;

/// Shown for a field whose metric has no sample yet
pub const NO_VALUE: &str = "--";

/// Shown for a field whose id maps to no known metric
pub const UNKNOWN_VALUE: &str = "N/A";

/// Numeric streams published by the ride computer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Metric {
    /// Instantaneous speed (m/s)
    Speed,
    /// Ride average speed (m/s)
    AverageSpeed,
    /// Heart rate (bpm)
    HeartRate,
    /// Ride average heart rate (bpm)
    AverageHeartRate,
    /// Pedalling cadence (rpm)
    Cadence,
    /// Instantaneous power (W)
    Power,
    /// 3 second smoothed power (W)
    Power3s,
    /// 10 second smoothed power (W)
    Power10s,
    /// Ride distance (m)
    Distance,
    /// Elapsed ride time (s)
    ElapsedTime,
}

impl Metric {
    /// Number of metrics in the catalog
    pub const COUNT: usize = 10;

    /// All metrics, in subscription order
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Speed,
        Metric::AverageSpeed,
        Metric::HeartRate,
        Metric::AverageHeartRate,
        Metric::Cadence,
        Metric::Power,
        Metric::Power3s,
        Metric::Power10s,
        Metric::Distance,
        Metric::ElapsedTime,
    ];

    /// Dense index for table lookups
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable field id used by display profiles
    pub fn id(self) -> &'static str {
        match self {
            Metric::Speed => "speed",
            Metric::AverageSpeed => "avg_speed",
            Metric::HeartRate => "heart_rate",
            Metric::AverageHeartRate => "avg_heart_rate",
            Metric::Cadence => "cadence",
            Metric::Power => "power",
            Metric::Power3s => "power_3s",
            Metric::Power10s => "power_10s",
            Metric::Distance => "distance",
            Metric::ElapsedTime => "elapsed_time",
        }
    }

    /// Look up a metric by field id
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        match self {
            Metric::Speed => "Speed",
            Metric::AverageSpeed => "Avg Speed",
            Metric::HeartRate => "Heart Rate",
            Metric::AverageHeartRate => "Avg HR",
            Metric::Cadence => "Cadence",
            Metric::Power => "Power",
            Metric::Power3s => "Power 3s",
            Metric::Power10s => "Power 10s",
            Metric::Distance => "Distance",
            Metric::ElapsedTime => "Time",
        }
    }

    /// Display unit, if any
    pub fn unit(self) -> Option<&'static str> {
        match self {
            Metric::Speed | Metric::AverageSpeed => Some("km/h"),
            Metric::HeartRate | Metric::AverageHeartRate => Some("bpm"),
            Metric::Cadence => Some("rpm"),
            Metric::Power | Metric::Power3s | Metric::Power10s => Some("W"),
            Metric::Distance => Some("km"),
            Metric::ElapsedTime => None,
        }
    }

    /// Glasses image asset for this metric
    pub fn icon_id(self) -> u8 {
        match self {
            Metric::Speed | Metric::AverageSpeed => 12,
            Metric::HeartRate | Metric::AverageHeartRate => 14,
            Metric::Cadence => 16,
            Metric::Power | Metric::Power3s | Metric::Power10s => 18,
            Metric::Distance => 20,
            Metric::ElapsedTime => 22,
        }
    }

    /// True for metrics rendered as a chronometer
    pub fn is_duration(self) -> bool {
        matches!(self, Metric::ElapsedTime)
    }

    /// Format a raw sample for display
    pub fn format(self, raw: f32) -> MetricValue {
        let mut out = MetricValue::new();
        // A value that does not fit is left truncated rather than dropped
        let _ = match self {
            Metric::Speed | Metric::AverageSpeed => write!(out, "{:.1}", raw * 3.6),
            Metric::Distance => write!(out, "{:.2}", raw / 1000.0),
            Metric::ElapsedTime => {
                let total = if raw > 0.0 { raw as u32 } else { 0 };
                write!(
                    out,
                    "{}:{:02}:{:02}",
                    total / 3600,
                    (total / 60) % 60,
                    total % 60
                )
            }
            _ => write!(out, "{:.0}", raw),
        };
        out
    }
}

/// Recording state reported by the ride computer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RideState {
    /// No ride in progress
    #[default]
    Idle,
    /// Ride is being recorded
    Recording,
    /// Ride is paused (auto-pause or manual)
    Paused,
}
