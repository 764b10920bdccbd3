//! # pulse-analytics
//!
//! Derived statistics over a window of persisted metrics.
//!
//! [`analyze`] is a pure function of the metric slice it is given: no
//! dependency on live session state, so results are reproducible from the
//! store alone and independently testable. It runs off the live path and
//! may execute concurrently with any number of active probes.

#![deny(unsafe_code)]

use std::time::Duration;

use pulse_core::types::{ActivityState, AnalysisResult, Metric};

/// Analysis parameters.
#[derive(Clone, Copy, Debug)]
pub struct AnalyticsConfig {
    /// Inter-sample gaps at or above this count as "monitoring was not
    /// running": they contribute zero duration and reset the sleep streak.
    pub gap_threshold: Duration,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            gap_threshold: Duration::from_secs(60),
        }
    }
}

/// Derive window statistics from metrics already filtered to the window
/// and sorted by timestamp ascending.
///
/// Single O(n) pass over consecutive pairs:
///
/// - a pair duration `d = t[i+1] - t[i]` is valid only when
///   `d < gap_threshold`; an oversized gap means the monitor was off, so
///   it adds nothing and resets the running sleep streak (a gap can
///   neither confirm nor extend an inferred sleep period);
/// - `Online` + valid `d` extends total active time and resets the streak;
/// - non-`Online` + valid `d` extends the streak and the longest-sleep max;
/// - RTT averages are partitioned by `Online`/`Standby`; `Offline` samples
///   are excluded from both.
///
/// Empty input yields the all-zero result.
pub fn analyze(metrics: &[Metric], config: &AnalyticsConfig) -> AnalysisResult {
    let gap_threshold_ms = config.gap_threshold.as_millis() as i64;

    let mut total_active_ms: u64 = 0;
    let mut longest_sleep_ms: u64 = 0;
    let mut sleep_streak_ms: u64 = 0;
    let mut online_rtt_sum: u64 = 0;
    let mut online_count: u64 = 0;
    let mut standby_rtt_sum: u64 = 0;
    let mut standby_count: u64 = 0;

    for (i, metric) in metrics.iter().enumerate() {
        match metric.state {
            ActivityState::Online => {
                online_rtt_sum += metric.rtt;
                online_count += 1;
            }
            ActivityState::Standby => {
                standby_rtt_sum += metric.rtt;
                standby_count += 1;
            }
            ActivityState::Offline => {}
        }

        let Some(next) = metrics.get(i + 1) else {
            break;
        };
        let duration_ms = (next.timestamp - metric.timestamp).num_milliseconds();
        let valid = duration_ms >= 0 && duration_ms < gap_threshold_ms;

        if metric.state == ActivityState::Online {
            if valid {
                total_active_ms += duration_ms as u64;
            }
            sleep_streak_ms = 0;
        } else if valid {
            sleep_streak_ms += duration_ms as u64;
            longest_sleep_ms = longest_sleep_ms.max(sleep_streak_ms);
        } else {
            sleep_streak_ms = 0;
        }
    }

    AnalysisResult {
        total_active_ms,
        longest_sleep_ms,
        avg_online_rtt: mean(online_rtt_sum, online_count),
        avg_standby_rtt: mean(standby_rtt_sum, standby_count),
    }
}

fn mean(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Parse a trailing-window spec like `24h`, `90m`, `30s`, or `7d`.
///
/// Missing or unrecognized input falls back to the given default.
pub fn parse_range(raw: Option<&str>, default: Duration) -> Duration {
    let Some(raw) = raw else {
        return default;
    };
    let raw = raw.trim();
    let Some(unit) = raw.chars().last() else {
        return default;
    };
    let Some(digits) = raw.strip_suffix(unit) else {
        return default;
    };
    let Ok(value) = digits.parse::<u64>() else {
        return default;
    };
    match unit {
        's' => Duration::from_secs(value),
        'm' => Duration::from_secs(value * 60),
        'h' => Duration::from_secs(value * 3_600),
        'd' => Duration::from_secs(value * 86_400),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use pulse_core::types::ContactAddress;

    const DAY: Duration = Duration::from_secs(86_400);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn metric(secs: i64, rtt: u64, state: ActivityState) -> Metric {
        Metric {
            contact: ContactAddress::new("c1"),
            timestamp: at(secs),
            rtt,
            state,
        }
    }

    #[test]
    fn empty_input_yields_all_zero() {
        let result = analyze(&[], &AnalyticsConfig::default());
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn single_metric_contributes_rtt_but_no_durations() {
        let result = analyze(
            &[metric(0, 120, ActivityState::Online)],
            &AnalyticsConfig::default(),
        );
        assert_eq!(result.total_active_ms, 0);
        assert_eq!(result.longest_sleep_ms, 0);
        assert_eq!(result.avg_online_rtt, 120.0);
    }

    #[test]
    fn end_to_end_scenario_from_three_ticks() {
        // t=0 Online 120ms, t=10s Online 130ms, t=20s Standby 800ms
        let metrics = [
            metric(0, 120, ActivityState::Online),
            metric(10, 130, ActivityState::Online),
            metric(20, 800, ActivityState::Standby),
        ];
        let result = analyze(&metrics, &AnalyticsConfig::default());
        assert_eq!(result.total_active_ms, 10_000);
        assert_eq!(result.longest_sleep_ms, 0);
        assert_eq!(result.avg_online_rtt, 125.0);
        assert_eq!(result.avg_standby_rtt, 800.0);
    }

    #[test]
    fn gap_resets_sleep_streak() {
        // [Standby t=0, Standby t=30s, Standby t=200s] → longest 30s, not 200s.
        let metrics = [
            metric(0, 50, ActivityState::Standby),
            metric(30, 50, ActivityState::Standby),
            metric(200, 50, ActivityState::Standby),
        ];
        let result = analyze(&metrics, &AnalyticsConfig::default());
        assert_eq!(result.longest_sleep_ms, 30_000);
    }

    #[test]
    fn gap_contributes_nothing_to_active_time() {
        let metrics = [
            metric(0, 100, ActivityState::Online),
            metric(300, 100, ActivityState::Online),
            metric(310, 100, ActivityState::Online),
        ];
        let result = analyze(&metrics, &AnalyticsConfig::default());
        assert_eq!(result.total_active_ms, 10_000);
    }

    #[test]
    fn gap_exactly_at_threshold_is_invalid() {
        let metrics = [
            metric(0, 100, ActivityState::Online),
            metric(60, 100, ActivityState::Online),
        ];
        let result = analyze(&metrics, &AnalyticsConfig::default());
        assert_eq!(result.total_active_ms, 0);
    }

    #[test]
    fn offline_excluded_from_both_rtt_averages() {
        let metrics = [
            metric(0, 100, ActivityState::Online),
            metric(10, 50, ActivityState::Standby),
            metric(20, 9_999, ActivityState::Offline),
        ];
        let result = analyze(&metrics, &AnalyticsConfig::default());
        assert_eq!(result.avg_online_rtt, 100.0);
        assert_eq!(result.avg_standby_rtt, 50.0);
    }

    #[test]
    fn sleep_streak_spans_standby_and_offline() {
        let metrics = [
            metric(0, 50, ActivityState::Standby),
            metric(20, 0, ActivityState::Offline),
            metric(40, 50, ActivityState::Standby),
            metric(50, 100, ActivityState::Online),
        ];
        let result = analyze(&metrics, &AnalyticsConfig::default());
        assert_eq!(result.longest_sleep_ms, 40_000);
    }

    #[test]
    fn online_resets_sleep_streak() {
        let metrics = [
            metric(0, 50, ActivityState::Standby),
            metric(20, 100, ActivityState::Online),
            metric(40, 50, ActivityState::Standby),
            metric(50, 50, ActivityState::Standby),
        ];
        let result = analyze(&metrics, &AnalyticsConfig::default());
        // First streak 20s, then reset by Online, then 10s.
        assert_eq!(result.longest_sleep_ms, 20_000);
    }

    #[test]
    fn custom_gap_threshold_is_honored() {
        let metrics = [
            metric(0, 100, ActivityState::Online),
            metric(90, 100, ActivityState::Online),
        ];
        let config = AnalyticsConfig {
            gap_threshold: Duration::from_secs(120),
        };
        assert_eq!(analyze(&metrics, &config).total_active_ms, 90_000);
    }

    #[test]
    fn parse_range_units() {
        assert_eq!(parse_range(Some("30s"), DAY), Duration::from_secs(30));
        assert_eq!(parse_range(Some("90m"), DAY), Duration::from_secs(5_400));
        assert_eq!(parse_range(Some("24h"), DAY), Duration::from_secs(86_400));
        assert_eq!(parse_range(Some("7d"), DAY), Duration::from_secs(604_800));
    }

    #[test]
    fn parse_range_falls_back_to_default() {
        assert_eq!(parse_range(None, DAY), DAY);
        assert_eq!(parse_range(Some(""), DAY), DAY);
        assert_eq!(parse_range(Some("yesterday"), DAY), DAY);
        assert_eq!(parse_range(Some("h"), DAY), DAY);
        assert_eq!(parse_range(Some("-5h"), DAY), DAY);
        // Multi-byte trailing characters must fall back, not panic.
        assert_eq!(parse_range(Some("24é"), DAY), DAY);
        assert_eq!(parse_range(Some("émc²"), DAY), DAY);
    }

    fn arb_state() -> impl Strategy<Value = ActivityState> {
        prop_oneof![
            Just(ActivityState::Online),
            Just(ActivityState::Standby),
            Just(ActivityState::Offline),
        ]
    }

    proptest! {
        /// Timestamp-sorting any permutation of the same records yields
        /// identical results: the analysis depends only on the ordered
        /// sequence, never on arrival order.
        #[test]
        fn analysis_is_deterministic_under_reordering(
            samples in prop::collection::vec((0_i64..10_000, 0_u64..2_000, arb_state()), 0..64),
            seed in any::<u64>(),
        ) {
            // Total order, so re-sorting after a shuffle is reproducible
            // even when timestamps collide.
            let key = |m: &Metric| (m.timestamp, m.rtt, m.state.as_sql());
            let mut metrics: Vec<Metric> = samples
                .into_iter()
                .map(|(secs, rtt, state)| metric(secs, rtt, state))
                .collect();
            metrics.sort_by_key(key);
            let baseline = analyze(&metrics, &AnalyticsConfig::default());

            // Deterministic pseudo-shuffle, then re-sort.
            let mut shuffled = metrics.clone();
            let len = shuffled.len();
            if len > 1 {
                for i in 0..len {
                    let j = (seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(i as u64)
                        % len as u64) as usize;
                    shuffled.swap(i, j);
                }
            }
            shuffled.sort_by_key(key);

            prop_assert_eq!(analyze(&shuffled, &AnalyticsConfig::default()), baseline);
        }

        /// Total active time equals the independently computed sum of
        /// valid Online-to-next durations.
        #[test]
        fn total_active_matches_reference_sum(
            samples in prop::collection::vec((0_i64..5_000, 0_u64..500, arb_state()), 0..48),
        ) {
            let mut metrics: Vec<Metric> = samples
                .into_iter()
                .map(|(secs, rtt, state)| metric(secs, rtt, state))
                .collect();
            metrics.sort_by_key(|m| m.timestamp);

            let expected: u64 = metrics
                .windows(2)
                .filter(|pair| pair[0].state == ActivityState::Online)
                .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as u64)
                .filter(|&d| d < 60_000)
                .sum();

            let result = analyze(&metrics, &AnalyticsConfig::default());
            prop_assert_eq!(result.total_active_ms, expected);
        }
    }
}
