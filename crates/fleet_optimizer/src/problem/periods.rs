use serde::Serialize;

use crate::define_index_newtype;

define_index_newtype!(PeriodIdx);

/// Ordered breakpoints `d[0] < d[1] < ... < d[T]` splitting the planning horizon into
/// `T` periods, each with its own travel-time matrix. Period `t` spans `[d[t], d[t + 1]]`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimePeriods {
    breakpoints: Vec<f64>,
}

impl TimePeriods {
    /// Validation of the breakpoints is done when the instance is built.
    pub fn new(breakpoints: Vec<f64>) -> Self {
        TimePeriods { breakpoints }
    }

    /// A single period covering `[start, end]`.
    pub fn single(start: f64, end: f64) -> Self {
        TimePeriods {
            breakpoints: vec![start, end],
        }
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn num_periods(&self) -> usize {
        self.breakpoints.len().saturating_sub(1)
    }

    pub fn periods(&self) -> impl DoubleEndedIterator<Item = PeriodIdx> + Clone {
        PeriodIdx::range(self.num_periods())
    }

    #[inline]
    pub fn start(&self, period: PeriodIdx) -> f64 {
        self.breakpoints[period.get()]
    }

    #[inline]
    pub fn end(&self, period: PeriodIdx) -> f64 {
        self.breakpoints[period.get() + 1]
    }

    pub fn horizon_start(&self) -> f64 {
        self.breakpoints.first().copied().unwrap_or(0.0)
    }

    pub fn horizon_end(&self) -> f64 {
        self.breakpoints.last().copied().unwrap_or(0.0)
    }

    pub fn contains(&self, period: PeriodIdx, time: f64, tolerance: f64) -> bool {
        time >= self.start(period) - tolerance && time <= self.end(period) + tolerance
    }

    /// Period containing `time`; a breakpoint belongs to the period it starts.
    pub fn period_of(&self, time: f64) -> Option<PeriodIdx> {
        if time < self.horizon_start() || time > self.horizon_end() {
            return None;
        }

        self.periods()
            .find(|&period| time < self.end(period))
            .or_else(|| self.periods().next_back())
    }

    pub(crate) fn is_strictly_increasing(&self) -> bool {
        self.breakpoints.iter().all(|value| value.is_finite())
            && self.breakpoints.windows(2).all(|pair| pair[0] < pair[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periods() {
        let periods = TimePeriods::new(vec![480.0, 600.0, 720.0]);

        assert_eq!(periods.num_periods(), 2);
        assert_eq!(periods.start(PeriodIdx::new(1)), 600.0);
        assert_eq!(periods.end(PeriodIdx::new(1)), 720.0);
        assert_eq!(periods.horizon_start(), 480.0);
        assert_eq!(periods.horizon_end(), 720.0);
    }

    #[test]
    fn test_period_of() {
        let periods = TimePeriods::new(vec![480.0, 600.0, 720.0]);

        assert_eq!(periods.period_of(480.0), Some(PeriodIdx::new(0)));
        assert_eq!(periods.period_of(600.0), Some(PeriodIdx::new(1)));
        assert_eq!(periods.period_of(720.0), Some(PeriodIdx::new(1)));
        assert_eq!(periods.period_of(721.0), None);
        assert_eq!(periods.period_of(100.0), None);
    }

    #[test]
    fn test_strictly_increasing() {
        assert!(TimePeriods::new(vec![480.0, 600.0]).is_strictly_increasing());
        assert!(!TimePeriods::new(vec![480.0, 480.0]).is_strictly_increasing());
        assert!(!TimePeriods::new(vec![600.0, 480.0]).is_strictly_increasing());
    }
}
