/// Runs `$block` and logs how long it took at debug level under the given stage name.
#[macro_export]
macro_rules! timer_debug {
    ($stage:literal, $block:expr) => {{
        let started_at = jiff::Timestamp::now();
        let result = $block;
        let elapsed = jiff::Timestamp::now().duration_since(started_at);

        tracing::debug!(stage = $stage, ?elapsed, "stage completed");

        result
    }};
}

/// Converts a duration to fractional minutes, the time unit used by every model.
pub fn duration_to_minutes(duration: jiff::SignedDuration) -> f64 {
    duration.as_secs_f64() / 60.0
}

/// Converts a wall-clock time of day to minutes after midnight.
pub fn clock_to_minutes(time: jiff::civil::Time) -> f64 {
    f64::from(time.hour()) * 60.0
        + f64::from(time.minute())
        + f64::from(time.second()) / 60.0
        + f64::from(time.subsec_nanosecond()) / 60e9
}
