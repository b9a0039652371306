//! Signed evidence records and the pure aggregation step.
//!
//! Every analysis stage emits [`Evidence`] items; [`aggregate`] reduces one
//! run's worth of them into a total score and a verdict confidence. The
//! reduction is pure, which keeps the scoring auditable without any
//! fetching or parsing in the loop.

use serde::Serialize;

/// Lower clamp for any confidence the pipeline reports.
pub const CONFIDENCE_FLOOR: f64 = 0.1;
/// Upper clamp; heuristics alone never report certainty.
pub const CONFIDENCE_CEILING: f64 = 0.95;
/// Controls how fast confidence saturates as evidence accumulates. A lone
/// strong hostname signal (score 30) lands around 0.85.
const CONFIDENCE_SCALE: f64 = 25.0;

/// A single signed observation with its human-readable justification.
///
/// Positive scores argue for documentation, negative against. Magnitudes
/// are relative weights, not probabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub score: i32,
    pub reason: String,
}

impl Evidence {
    pub fn new(score: i32, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
        }
    }
}

/// Result of reducing one run's evidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub total_score: i32,
    /// Confidence in the verdict implied by the sign of `total_score`.
    pub confidence: f64,
}

impl Aggregate {
    /// Verdict implied by the evidence: a positive total means
    /// documentation. Ties resolve to false.
    pub fn is_documentation(&self) -> bool {
        self.total_score > 0
    }
}

/// Reduce an evidence sequence to its total score and verdict confidence.
///
/// With no evidence the confidence is exactly 0.5 (a coin flip). It grows
/// monotonically with the magnitude of the total and saturates toward the
/// ceiling; the clamp keeps every reported value strictly inside (0, 1).
pub fn aggregate(evidence: &[Evidence]) -> Aggregate {
    let total_score: i32 = evidence.iter().map(|e| e.score).sum();
    let magnitude = f64::from(total_score.abs());
    let raw = 0.5 + 0.5 * (1.0 - (-magnitude / CONFIDENCE_SCALE).exp());
    Aggregate {
        total_score,
        confidence: clamp_confidence(raw),
    }
}

/// Clamp a derived confidence into the reportable band.
pub fn clamp_confidence(confidence: f64) -> f64 {
    confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_evidence_is_a_coin_flip() {
        let agg = aggregate(&[]);
        assert_eq!(agg.total_score, 0);
        assert!((agg.confidence - 0.5).abs() < 1e-9);
        assert!(!agg.is_documentation());
    }

    #[test]
    fn total_is_the_signed_sum() {
        let agg = aggregate(&[
            Evidence::new(30, "doc subdomain"),
            Evidence::new(-15, "commerce path"),
            Evidence::new(5, "markdown extension"),
        ]);
        assert_eq!(agg.total_score, 20);
        assert!(agg.is_documentation());
    }

    #[test]
    fn zero_total_resolves_to_not_documentation() {
        let agg = aggregate(&[Evidence::new(15, "a"), Evidence::new(-15, "b")]);
        assert_eq!(agg.total_score, 0);
        assert!(!agg.is_documentation());
    }

    #[test]
    fn confidence_grows_with_magnitude() {
        let weak = aggregate(&[Evidence::new(5, "weak")]);
        let medium = aggregate(&[Evidence::new(20, "medium")]);
        let strong = aggregate(&[Evidence::new(60, "strong")]);
        assert!(weak.confidence > 0.5);
        assert!(medium.confidence > weak.confidence);
        assert!(strong.confidence > medium.confidence);
    }

    #[test]
    fn confidence_depends_on_magnitude_not_sign() {
        let positive = aggregate(&[Evidence::new(25, "for")]);
        let negative = aggregate(&[Evidence::new(-25, "against")]);
        assert!((positive.confidence - negative.confidence).abs() < 1e-9);
        assert!(positive.is_documentation());
        assert!(!negative.is_documentation());
    }

    #[test]
    fn confidence_never_reaches_the_bounds() {
        let overwhelming = aggregate(&[Evidence::new(10_000, "everything")]);
        assert!((overwhelming.confidence - CONFIDENCE_CEILING).abs() < 1e-9);

        let damning = aggregate(&[Evidence::new(-10_000, "nothing")]);
        assert!((damning.confidence - CONFIDENCE_CEILING).abs() < 1e-9);

        assert!((clamp_confidence(0.0) - CONFIDENCE_FLOOR).abs() < 1e-9);
        assert!((clamp_confidence(1.0) - CONFIDENCE_CEILING).abs() < 1e-9);
    }

    #[test]
    fn extra_positive_evidence_never_weakens_a_positive_verdict() {
        let base = vec![Evidence::new(15, "path keyword")];
        let mut extended = base.clone();
        let before = aggregate(&base);
        for score in [5, 8, 10, 15, 20] {
            extended.push(Evidence::new(score, "more"));
            let after = aggregate(&extended);
            assert!(after.total_score > before.total_score);
            assert!(after.confidence >= before.confidence);
            assert!(after.is_documentation());
        }
    }
}
