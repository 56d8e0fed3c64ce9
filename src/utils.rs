use chrono::{DateTime, Utc};

pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Wall-clock hours between `start` and `now`, never negative
pub fn elapsed_hours(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let duration = now.signed_duration_since(start);
    duration.num_milliseconds().max(0) as f64 / 3_600_000.0
}

pub fn format_runtime(start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
    start.map(|st| {
        let total_secs = now.signed_duration_since(st).num_seconds().max(0) as u64;
        format_duration(total_secs)
    })
}

/// Convert an AWS SDK timestamp to chrono
pub fn smithy_to_chrono(t: &aws_sdk_sagemaker::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(t.secs(), t.subsec_nanos())
}

/// Render a byte count the way the report shows bucket sizes
pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / crate::resources::pricing::BYTES_PER_GB)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(90), "1m 30s");
        assert_eq!(format_duration(3665), "1h 1m 5s");
        assert_eq!(format_duration(7200), "2h 0m 0s");
    }

    #[test]
    fn test_elapsed_hours() {
        let now = Utc::now();
        let start = now - Duration::minutes(150);
        assert_eq!(elapsed_hours(start, now), 2.5);
    }

    #[test]
    fn test_elapsed_hours_future_start_is_zero() {
        let now = Utc::now();
        assert_eq!(elapsed_hours(now + Duration::hours(1), now), 0.0);
    }

    #[test]
    fn test_format_runtime() {
        let now = Utc::now();
        let past = now - Duration::seconds(3665);
        assert_eq!(format_runtime(Some(past), now).as_deref(), Some("1h 1m 5s"));
        assert_eq!(format_runtime(None, now), None);
    }

    #[test]
    fn test_smithy_to_chrono() {
        let t = aws_sdk_sagemaker::primitives::DateTime::from_secs(1_700_000_000);
        let converted = smithy_to_chrono(&t).unwrap();
        assert_eq!(converted.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_format_gb() {
        assert_eq!(format_gb(0), "0.00 GB");
        assert_eq!(format_gb(3 * 1024 * 1024 * 1024 / 2), "1.50 GB");
    }
}
