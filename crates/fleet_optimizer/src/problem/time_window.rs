use jiff::civil::Time;
use serde::{Deserialize, Serialize};

use crate::utils::time::clock_to_minutes;

/// Closed interval `[earliest, latest]` of allowed arrival times, in minutes after midnight.
#[derive(Deserialize, Debug, Serialize, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    earliest: f64,
    latest: f64,
}

impl TimeWindow {
    pub fn new(earliest: f64, latest: f64) -> Self {
        TimeWindow { earliest, latest }
    }

    pub fn from_clock(earliest: Time, latest: Time) -> Self {
        TimeWindow {
            earliest: clock_to_minutes(earliest),
            latest: clock_to_minutes(latest),
        }
    }

    pub fn earliest(&self) -> f64 {
        self.earliest
    }

    pub fn latest(&self) -> f64 {
        self.latest
    }

    pub fn is_valid(&self) -> bool {
        self.earliest.is_finite() && self.latest.is_finite() && self.earliest <= self.latest
    }

    pub fn contains(&self, arrival: f64, tolerance: f64) -> bool {
        arrival >= self.earliest - tolerance && arrival <= self.latest + tolerance
    }

    /// Clips the window to `[start, end]`, `None` when nothing is left.
    pub fn clip(&self, start: f64, end: f64) -> Option<TimeWindow> {
        let earliest = self.earliest.max(start);
        let latest = self.latest.min(end);

        if earliest <= latest {
            Some(TimeWindow { earliest, latest })
        } else {
            None
        }
    }
}

#[derive(Default)]
pub struct TimeWindowBuilder {
    earliest: Option<f64>,
    latest: Option<f64>,
}

impl TimeWindowBuilder {
    pub fn with_earliest(mut self, earliest: f64) -> Self {
        self.earliest = Some(earliest);
        self
    }

    pub fn with_clock_earliest(mut self, earliest: Time) -> Self {
        self.earliest = Some(clock_to_minutes(earliest));
        self
    }

    pub fn with_latest(mut self, latest: f64) -> Self {
        self.latest = Some(latest);
        self
    }

    pub fn with_clock_latest(mut self, latest: Time) -> Self {
        self.latest = Some(clock_to_minutes(latest));
        self
    }

    /// Missing bounds default to the full day.
    pub fn build(self) -> TimeWindow {
        TimeWindow {
            earliest: self.earliest.unwrap_or(0.0),
            latest: self.latest.unwrap_or(24.0 * 60.0),
        }
    }
}
