use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metric-defined utility cost of a transformation. Lower is better.
///
/// Totally ordered via [`f64::total_cmp`] so it can be aggregated without
/// `partial_cmp` escapes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InformationLoss(f64);

impl InformationLoss {
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for InformationLoss {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for InformationLoss {}

impl PartialOrd for InformationLoss {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InformationLoss {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for InformationLoss {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for InformationLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Larger of two optional bounds; `None` is the identity.
#[inline]
pub fn max_loss(
    a: Option<InformationLoss>,
    b: Option<InformationLoss>,
) -> Option<InformationLoss> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Smaller of two optional bounds; `None` is the identity.
#[inline]
pub fn min_loss(
    a: Option<InformationLoss>,
    b: Option<InformationLoss>,
) -> Option<InformationLoss> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// The metric's global extrema: no transformation can score outside them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl LossRange {
    pub const fn new(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }

    #[inline]
    pub const fn minimum(&self) -> InformationLoss {
        InformationLoss(self.minimum)
    }

    #[inline]
    pub const fn maximum(&self) -> InformationLoss {
        InformationLoss(self.maximum)
    }

    pub fn is_valid(&self) -> bool {
        self.minimum <= self.maximum
    }
}

impl Default for LossRange {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loss(v: f64) -> Option<InformationLoss> {
        Some(InformationLoss::new(v))
    }

    #[test]
    fn null_is_identity_for_both_aggregates() {
        for x in [0.0, 2.5, -1.0, f64::MAX] {
            assert_eq!(max_loss(None, loss(x)), loss(x));
            assert_eq!(max_loss(loss(x), None), loss(x));
            assert_eq!(min_loss(None, loss(x)), loss(x));
            assert_eq!(min_loss(loss(x), None), loss(x));
        }
        assert_eq!(max_loss(None, None), None);
        assert_eq!(min_loss(None, None), None);
    }

    #[test]
    fn aggregates_pick_extremes() {
        assert_eq!(max_loss(loss(1.0), loss(3.0)), loss(3.0));
        assert_eq!(min_loss(loss(1.0), loss(3.0)), loss(1.0));
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&InformationLoss::new(0.25)).expect("serialize");
        assert_eq!(json, "0.25");
        let range: LossRange =
            serde_json::from_str(r#"{"minimum":0.0,"maximum":10.0}"#).expect("deserialize");
        assert!(range.is_valid());
        assert_eq!(range.maximum(), InformationLoss::new(10.0));
    }
}
