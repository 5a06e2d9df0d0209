//! Time handling for CoverageJSON `t` axes.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::coverage_json::AxisValue;

/// Parse an ISO 8601 timestamp.
///
/// Accepts RFC 3339, naive date-times (assumed UTC) and bare dates.
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Parse an axis value as a timestamp; numbers are not timestamps.
pub fn parse_axis_time(value: &AxisValue) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_time)
}

/// A closed time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Validity window centred on `time`, spanning one `step`.
    pub fn centered(time: DateTime<Utc>, step: Duration) -> Self {
        let half = step / 2;
        Self {
            start: time - half,
            end: time + half,
        }
    }

    /// Range spanned by the first and last parseable values.
    pub fn from_values(values: &[AxisValue]) -> Option<Self> {
        let start = values.first().and_then(parse_axis_time)?;
        let end = values.last().and_then(parse_axis_time)?;
        Some(Self { start, end })
    }

    /// Check if a time falls within the range (inclusive).
    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        *time >= self.start && *time <= self.end
    }
}

/// Step between the first two values of a time axis.
pub fn time_step(values: &[AxisValue]) -> Option<Duration> {
    if values.len() < 2 {
        return None;
    }
    let t0 = parse_axis_time(&values[0])?;
    let t1 = parse_axis_time(&values[1])?;
    Some(t1 - t0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> AxisValue {
        AxisValue::Text(s.to_string())
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(parse_time("2024-01-15T12:00:00Z"), Some(expected));
        assert_eq!(parse_time("2024-01-15T12:00:00"), Some(expected));
        assert_eq!(parse_time("2024-01-15T14:00:00+02:00"), Some(expected));
        assert_eq!(
            parse_time("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_time("not a time"), None);
    }

    #[test]
    fn test_time_step() {
        let values = vec![text("2024-01-15T00:00:00Z"), text("2024-01-15T06:00:00Z")];
        assert_eq!(time_step(&values), Some(Duration::hours(6)));
        assert_eq!(time_step(&values[..1]), None);
        assert_eq!(time_step(&[AxisValue::Number(1.0), AxisValue::Number(2.0)]), None);
    }

    #[test]
    fn test_centered_range() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let range = TimeRange::centered(t, Duration::hours(1));
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 15, 11, 30, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 0).unwrap());
        assert!(range.contains(&t));
    }

    #[test]
    fn test_range_from_values() {
        let values = vec![
            text("2024-01-15T00:00:00Z"),
            text("2024-01-15T06:00:00Z"),
            text("2024-01-15T12:00:00Z"),
        ];
        let range = TimeRange::from_values(&values).unwrap();
        assert_eq!(range.end - range.start, Duration::hours(12));
        assert!(TimeRange::from_values(&[]).is_none());
    }
}
