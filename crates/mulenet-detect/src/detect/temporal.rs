//! Temporal concentration: how much of an account's activity falls into its
//! busiest 72-hour window.
//!
//! Returns a fraction in `[0, 1]`. A single burst scores 1.0; activity spread
//! evenly over weeks scores low.

#![allow(clippy::cast_precision_loss)]

use chrono::{DateTime, Duration, Utc};

/// Width of the forward-looking burst window.
pub const BURST_WINDOW_HOURS: i64 = 72;

/// Fewer events than this never count as concentrated.
const MIN_EVENTS: usize = 3;

/// Largest share of `timestamps` that fits in one forward 72-hour window.
///
/// For every event, counts the events at or after it that are at most 72
/// hours later (inclusive), takes the maximum and divides by the total.
#[must_use]
pub fn temporal_concentration(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.len() < MIN_EVENTS {
        return 0.0;
    }

    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();

    let window = Duration::hours(BURST_WINDOW_HOURS);
    let mut best = 0usize;
    let mut end = 0usize;
    for (start, &first) in sorted.iter().enumerate() {
        end = end.max(start);
        while end < sorted.len() && sorted[end] - first <= window {
            end += 1;
        }
        best = best.max(end - start);
    }

    (best as f64 / sorted.len() as f64).min(1.0)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn minutes(offsets: &[i64]) -> Vec<DateTime<Utc>> {
        offsets.iter().map(|m| base() + Duration::minutes(*m)).collect()
    }

    #[test]
    fn fewer_than_three_events_is_zero() {
        assert_eq!(temporal_concentration(&[]), 0.0);
        assert_eq!(temporal_concentration(&minutes(&[0, 1])), 0.0);
    }

    #[test]
    fn burst_within_an_hour_is_fully_concentrated() {
        assert_eq!(temporal_concentration(&minutes(&[0, 10, 20, 30, 59])), 1.0);
    }

    #[test]
    fn identical_timestamps_are_fully_concentrated() {
        assert_eq!(temporal_concentration(&minutes(&[5, 5, 5])), 1.0);
    }

    #[test]
    fn even_spread_over_thirty_days_is_low() {
        let daily: Vec<i64> = (0..30).map(|day| day * 24 * 60).collect();
        let score = temporal_concentration(&minutes(&daily));
        // Four daily events fit in a closed 72h window.
        assert_eq!(score, 4.0 / 30.0);
        assert!(score < 1.0);
    }

    #[test]
    fn window_edge_is_inclusive() {
        let exactly_72h = minutes(&[0, 36 * 60, 72 * 60]);
        assert_eq!(temporal_concentration(&exactly_72h), 1.0);

        let just_over = minutes(&[0, 36 * 60, 72 * 60 + 1]);
        assert_eq!(temporal_concentration(&just_over), 2.0 / 3.0);
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = minutes(&[0, 60, 10_000, 10_001]);
        let shuffled = minutes(&[10_001, 0, 10_000, 60]);
        assert_eq!(
            temporal_concentration(&forward),
            temporal_concentration(&shuffled)
        );
        assert_eq!(temporal_concentration(&forward), 0.5);
    }
}
