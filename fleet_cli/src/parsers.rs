use jiff::{SignedDuration, Span, SpanRelativeTo};

/// Accepts ISO 8601 (`PT1M30S`), friendly spans (`1m 30s`, `2h`) or a number of seconds.
pub fn parse_duration(input: &str) -> Result<SignedDuration, String> {
    let input = input.trim();

    if let Ok(duration) = input.parse::<SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<u64>() {
        return i64::try_from(seconds)
            .map(SignedDuration::from_secs)
            .map_err(|_| format!("{input} seconds is too long"));
    }

    Err(format!("invalid duration {input:?}"))
}
