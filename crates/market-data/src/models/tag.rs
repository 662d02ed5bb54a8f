use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default alert threshold, in percent.
pub const DEFAULT_ALERT_THRESHOLD_PCT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Metrics above this many percent (and not above the alert threshold) are "medium".
const MEDIUM_FLOOR_PCT: Decimal = Decimal::TWO;

/// Metrics below this many percent are a "discount".
const DISCOUNT_CEILING_PCT: Decimal = Decimal::NEGATIVE_ONE;

/// Classification bucket for the derived metric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    High,
    Medium,
    #[default]
    Normal,
    Discount,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Normal => "normal",
            Self::Discount => "discount",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a metric expressed in percent against the alert threshold `T`.
///
/// `metric > T` is high, `2 < metric <= T` is medium, `metric < -1` is a
/// discount and everything else is normal. The comparison against `T` is
/// strict, so a metric exactly at the threshold is not high.
pub fn classify(metric_pct: Decimal, threshold_pct: Decimal) -> Tag {
    if metric_pct > threshold_pct {
        Tag::High
    } else if metric_pct > MEDIUM_FLOOR_PCT {
        Tag::Medium
    } else if metric_pct < DISCOUNT_CEILING_PCT {
        Tag::Discount
    } else {
        Tag::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn rank(tag: Tag) -> u8 {
        match tag {
            Tag::Discount => 0,
            Tag::Normal => 1,
            Tag::Medium => 2,
            Tag::High => 3,
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(classify(dec!(5.00), dec!(5.0)), Tag::Medium);
        assert_eq!(classify(dec!(5.01), dec!(5.0)), Tag::High);
    }

    #[test]
    fn test_bucket_edges() {
        let threshold = DEFAULT_ALERT_THRESHOLD_PCT;
        assert_eq!(classify(dec!(2), threshold), Tag::Normal);
        assert_eq!(classify(dec!(2.01), threshold), Tag::Medium);
        assert_eq!(classify(dec!(-1), threshold), Tag::Normal);
        assert_eq!(classify(dec!(-1.01), threshold), Tag::Discount);
        assert_eq!(classify(dec!(0), threshold), Tag::Normal);
    }

    #[test]
    fn test_low_threshold_takes_precedence_over_medium() {
        assert_eq!(classify(dec!(1.5), dec!(1.0)), Tag::High);
        assert_eq!(classify(dec!(0.5), dec!(1.0)), Tag::Normal);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&Tag::High).unwrap(), "\"high\"");
        assert_eq!(Tag::default(), Tag::Normal);
        assert_eq!(Tag::Discount.to_string(), "discount");
    }

    proptest! {
        #[test]
        fn classification_is_monotonic(
            a in -2_000_000i64..2_000_000,
            b in -2_000_000i64..2_000_000,
            t in 1i64..2_000,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let threshold = Decimal::new(t, 2);
            let lo_tag = classify(Decimal::new(lo, 4), threshold);
            let hi_tag = classify(Decimal::new(hi, 4), threshold);
            prop_assert!(rank(lo_tag) <= rank(hi_tag));
        }

        #[test]
        fn high_exactly_above_threshold(m in -2_000_000i64..2_000_000, t in 1i64..2_000) {
            let metric = Decimal::new(m, 4);
            let threshold = Decimal::new(t, 2);
            prop_assert_eq!(classify(metric, threshold) == Tag::High, metric > threshold);
        }

        #[test]
        fn classification_is_deterministic(m in -2_000_000i64..2_000_000, t in 1i64..2_000) {
            let metric = Decimal::new(m, 4);
            let threshold = Decimal::new(t, 2);
            prop_assert_eq!(classify(metric, threshold), classify(metric, threshold));
        }
    }
}
