use chrono::{DateTime, Utc};

use super::models::{CompositeScore, Components, NormalizedFeature};
use super::normalizer::clamp_unit;
use super::weights::{WeightVector, WEIGHT_SUM_TOLERANCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CutRule {
    /// First class whose cut the value is strictly below
    Below,
    /// First class whose cut the value is strictly above
    Above,
}

/// Monotonic cut points mapping a composite value to an ordered class
#[derive(Debug, Clone, Copy)]
pub struct ThresholdTable<C: 'static> {
    rule: CutRule,
    cuts: &'static [(f64, C)],
    otherwise: C,
}

impl<C: Copy> ThresholdTable<C> {
    /// Cuts in ascending order; `value < cut` selects the class
    pub const fn below(cuts: &'static [(f64, C)], otherwise: C) -> Self {
        Self {
            rule: CutRule::Below,
            cuts,
            otherwise,
        }
    }

    /// Cuts in descending order; `value > cut` selects the class
    pub const fn above(cuts: &'static [(f64, C)], otherwise: C) -> Self {
        Self {
            rule: CutRule::Above,
            cuts,
            otherwise,
        }
    }

    pub fn classify(&self, value: f64) -> C {
        self.cuts
            .iter()
            .find(|(cut, _)| match self.rule {
                CutRule::Below => value < *cut,
                CutRule::Above => value > *cut,
            })
            .map(|(_, class)| *class)
            .unwrap_or(self.otherwise)
    }
}

/// Rounds values within the weight-sum tolerance of 0 or 1 onto the bound
fn snap_to_bounds(value: f64) -> f64 {
    if value <= WEIGHT_SUM_TOLERANCE {
        0.0
    } else if 1.0 - value <= WEIGHT_SUM_TOLERANCE {
        1.0
    } else {
        value
    }
}

/// Folds normalized features through a weight vector and classifies the result.
///
/// Only features named by `weights` are kept as components. The classifier sees
/// the composite value and the components, so two-factor rules can be expressed.
pub fn compose<C>(
    subject_id: &str,
    weights: &WeightVector,
    features: impl IntoIterator<Item = NormalizedFeature>,
    generated_at: DateTime<Utc>,
    classify: impl FnOnce(f64, &Components) -> C,
) -> CompositeScore<C> {
    let components: Components = features
        .into_iter()
        .filter(|feature| weights.weight(feature.name) > 0.0)
        .map(|feature| (feature.name, feature))
        .collect();

    let value = snap_to_bounds(clamp_unit(weights.weighted_sum(&components)));
    let classification = classify(value, &components);

    CompositeScore {
        subject_id: subject_id.to_string(),
        value,
        components,
        classification,
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::models::{FeatureName, RiskLevel};
    use chrono::TimeZone;
    use rstest::rstest;

    const LEVELS: ThresholdTable<RiskLevel> = ThresholdTable::below(
        &[
            (0.25, RiskLevel::Low),
            (0.5, RiskLevel::Medium),
            (0.75, RiskLevel::High),
        ],
        RiskLevel::Critical,
    );

    #[rstest]
    #[case(0.0, RiskLevel::Low)]
    #[case(0.2499, RiskLevel::Low)]
    #[case(0.25, RiskLevel::Medium)]
    #[case(0.5, RiskLevel::High)]
    #[case(0.75, RiskLevel::Critical)]
    #[case(1.0, RiskLevel::Critical)]
    fn below_table_cuts(#[case] value: f64, #[case] expected: RiskLevel) {
        assert_eq!(LEVELS.classify(value), expected);
    }

    #[test]
    fn above_table_cuts_are_strict() {
        let table = ThresholdTable::above(&[(0.7, 3u8), (0.5, 2u8), (0.3, 1u8)], 0u8);
        assert_eq!(table.classify(0.71), 3);
        assert_eq!(table.classify(0.7), 2);
        assert_eq!(table.classify(0.3), 0);
    }

    #[test]
    fn compose_keeps_only_weighted_features() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let score = compose(
            "p-1",
            &WeightVector::injury_risk(),
            vec![
                NormalizedFeature::observed(FeatureName::Workload, 1.0),
                NormalizedFeature::observed(FeatureName::Sentiment, 1.0),
            ],
            at,
            |value, _| LEVELS.classify(value),
        );

        assert_eq!(score.components.len(), 1);
        assert_eq!(score.value, 0.25);
        assert_eq!(score.classification, RiskLevel::Medium);
        assert_eq!(score.generated_at, at);
    }

    #[test]
    fn saturated_features_reach_exactly_one() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let weights = WeightVector::fatigue();
        let features: Vec<NormalizedFeature> = weights
            .features()
            .map(|name| NormalizedFeature::observed(name, 1.0))
            .collect();

        let score = compose("p-1", &weights, features, at, |_, _| ());

        assert_eq!(score.value, 1.0);
    }
}
