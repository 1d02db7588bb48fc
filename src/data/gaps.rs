//! Data-completeness check that gates offset detection.
//!
//! A series is compared with the regular grid implied by its sampling period:
//! both end epochs are grid points, so a gap-free series of span `S` holds
//! `floor(S / period) + 1` samples.

use crate::domain::ObservationSeries;

/// Above this percentage of missing samples offset detection is skipped.
pub const MAX_MISSING_PERCENTAGE: f64 = 40.0;

/// Absorbs rounding when the span is an exact multiple of the period.
const GRID_EPSILON: f64 = 1.0e-6;

/// Completeness of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapAssessment {
    /// The series spans at least one sampling interval.
    Measured {
        /// Whole sampling intervals between first and last epoch.
        span_count: i64,
        /// Grid points between first and last epoch, inclusive.
        expected_count: i64,
        observed_count: usize,
        missing_percentage: f64,
    },
    /// Zero or negative span (single epoch, unordered rows, bad period).
    Insufficient,
}

/// What to do with a station before analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapDecision {
    DetectOffsets,
    PassThrough,
}

impl GapAssessment {
    pub fn decision(&self) -> GapDecision {
        match self {
            GapAssessment::Measured {
                missing_percentage, ..
            } if *missing_percentage <= MAX_MISSING_PERCENTAGE => GapDecision::DetectOffsets,
            _ => GapDecision::PassThrough,
        }
    }

    pub fn missing_percentage(&self) -> Option<f64> {
        match self {
            GapAssessment::Measured {
                missing_percentage, ..
            } => Some(*missing_percentage),
            GapAssessment::Insufficient => None,
        }
    }

    /// Number of sampling intervals, as handed to the spectrum model.
    pub fn span_count(&self) -> Option<i64> {
        match self {
            GapAssessment::Measured { span_count, .. } => Some(*span_count),
            GapAssessment::Insufficient => None,
        }
    }
}

/// Assess completeness from series bounds.
pub fn assess(observed_count: usize, sampling_period: f64, first_epoch: f64, last_epoch: f64) -> GapAssessment {
    if !(sampling_period.is_finite() && sampling_period > 0.0) {
        return GapAssessment::Insufficient;
    }
    let span = (last_epoch - first_epoch) / sampling_period + GRID_EPSILON;
    if !span.is_finite() {
        return GapAssessment::Insufficient;
    }

    let span_count = span.floor() as i64;
    if span_count <= 0 {
        return GapAssessment::Insufficient;
    }

    let expected_count = span_count + 1;
    // Multiply before dividing so whole percentages stay exact at the threshold.
    let missing = expected_count as f64 - observed_count as f64;
    let missing_percentage = 100.0 * missing / expected_count as f64;

    GapAssessment::Measured {
        span_count,
        expected_count,
        observed_count,
        missing_percentage,
    }
}

/// Assess a parsed series.
pub fn assess_series(series: &ObservationSeries) -> GapAssessment {
    match (series.first_epoch(), series.last_epoch()) {
        (Some(first), Some(last)) => assess(series.observed_count(), series.sampling_period, first, last),
        _ => GapAssessment::Insufficient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn twenty_percent_missing_runs_offset_detection() {
        let a = assess(80, 1.0, 0.0, 99.0);
        match a {
            GapAssessment::Measured {
                span_count,
                expected_count,
                missing_percentage,
                ..
            } => {
                assert_eq!(span_count, 99);
                assert_eq!(expected_count, 100);
                assert!((missing_percentage - 20.0).abs() < 1e-9);
            }
            GapAssessment::Insufficient => panic!("expected a measured assessment"),
        }
        assert_eq!(a.decision(), GapDecision::DetectOffsets);
    }

    #[test]
    fn fifty_percent_missing_passes_through() {
        let a = assess(50, 1.0, 0.0, 99.0);
        assert!((a.missing_percentage().unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(a.decision(), GapDecision::PassThrough);
    }

    #[test]
    fn threshold_is_inclusive_for_detection() {
        let a = assess(60, 1.0, 0.0, 99.0);
        assert!((a.missing_percentage().unwrap() - 40.0).abs() < 1e-9);
        assert_eq!(a.decision(), GapDecision::DetectOffsets);
    }

    #[test]
    fn epsilon_absorbs_rounding_at_exact_multiples() {
        // 0.7 / 0.1 is 6.999999999999999 in binary floating point.
        let a = assess(8, 0.1, 0.0, 0.7);
        assert_eq!(a.span_count(), Some(7));
    }

    #[test]
    fn single_epoch_is_insufficient() {
        assert_eq!(assess(1, 1.0, 5.0, 5.0), GapAssessment::Insufficient);
        assert_eq!(assess(1, 1.0, 5.0, 5.0).decision(), GapDecision::PassThrough);
        assert_eq!(assess(10, 0.0, 0.0, 9.0), GapAssessment::Insufficient);
        assert_eq!(assess(10, 1.0, 9.0, 0.0), GapAssessment::Insufficient);
    }

    proptest! {
        #[test]
        fn more_missing_never_lowers_percentage(
            span in 1u32..5000,
            period in prop::sample::select(vec![0.5, 1.0, 7.0, 1.0 / 24.0]),
            a in 0usize..5000,
            b in 0usize..5000,
        ) {
            let last = span as f64 * period;
            let (fewer_missing, more_missing) = (a.max(b), a.min(b));
            let p_few = assess(fewer_missing, period, 0.0, last).missing_percentage().unwrap();
            let p_more = assess(more_missing, period, 0.0, last).missing_percentage().unwrap();
            prop_assert!(p_more >= p_few);
        }
    }
}
