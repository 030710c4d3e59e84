use std::collections::HashSet;

use super::errors::ScoringError;
use super::models::{Components, FeatureName};

pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

pub const FATIGUE_WEIGHTS: [(FeatureName, f64); 5] = [
    (FeatureName::PhysicalLoad, 0.30),
    (FeatureName::TravelFatigue, 0.20),
    (FeatureName::GameFrequency, 0.20),
    (FeatureName::MinutesPlayed, 0.20),
    (FeatureName::RecoveryTime, 0.10),
];

pub const INJURY_RISK_WEIGHTS: [(FeatureName, f64); 5] = [
    (FeatureName::Workload, 0.25),
    (FeatureName::HistoricalInjuries, 0.20),
    (FeatureName::BiomechanicalStress, 0.20),
    (FeatureName::EnvironmentalFactors, 0.15),
    (FeatureName::RecoveryMetrics, 0.20),
];

pub const PSYCHOLOGICAL_WEIGHTS: [(FeatureName, f64); 5] = [
    (FeatureName::Sentiment, 0.15),
    (FeatureName::InterviewTone, 0.25),
    (FeatureName::BodyLanguage, 0.20),
    (FeatureName::TeamDynamics, 0.20),
    (FeatureName::RecentPerformance, 0.20),
];

/// Named, versioned feature weights for one composite model.
///
/// Weights are non-negative and sum to 1. The built-in vectors are checked by
/// tests; custom vectors are checked by [`WeightVector::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    name: String,
    version: u32,
    weights: Vec<(FeatureName, f64)>,
}

impl WeightVector {
    pub fn new(
        name: &str,
        version: u32,
        weights: Vec<(FeatureName, f64)>,
    ) -> Result<Self, ScoringError> {
        if weights.is_empty() {
            return Err(ScoringError::InvalidWeights(format!("{name} has no weights")));
        }

        let mut seen = HashSet::new();
        for (feature, weight) in &weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ScoringError::InvalidWeights(format!(
                    "{name}: weight for {feature:?} must be a non-negative number"
                )));
            }
            if !seen.insert(*feature) {
                return Err(ScoringError::InvalidWeights(format!(
                    "{name}: {feature:?} appears more than once"
                )));
            }
        }

        let vector = Self {
            name: name.to_string(),
            version,
            weights,
        };
        let total = vector.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "{name}: weights sum to {total}, expected 1"
            )));
        }

        Ok(vector)
    }

    fn builtin(name: &str, weights: &[(FeatureName, f64)]) -> Self {
        Self {
            name: name.to_string(),
            version: 1,
            weights: weights.to_vec(),
        }
    }

    pub fn fatigue() -> Self {
        Self::builtin("fatigue", &FATIGUE_WEIGHTS)
    }

    pub fn injury_risk() -> Self {
        Self::builtin("injury_risk", &INJURY_RISK_WEIGHTS)
    }

    pub fn psychological() -> Self {
        Self::builtin("psychological", &PSYCHOLOGICAL_WEIGHTS)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn features(&self) -> impl Iterator<Item = FeatureName> + '_ {
        self.weights.iter().map(|(feature, _)| *feature)
    }

    pub fn weight(&self, feature: FeatureName) -> f64 {
        self.weights
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Weighted sum over `components`; absent components contribute 0
    pub fn weighted_sum(&self, components: &Components) -> f64 {
        self.weights
            .iter()
            .map(|(feature, weight)| {
                components
                    .get(feature)
                    .map(|f| f.value * weight)
                    .unwrap_or(0.0)
            })
            .sum()
    }

    /// Fails unless this vector weights exactly the given features
    pub fn ensure_covers(&self, expected: &[FeatureName]) -> Result<(), ScoringError> {
        let ours: HashSet<FeatureName> = self.features().collect();
        let theirs: HashSet<FeatureName> = expected.iter().copied().collect();
        if ours == theirs {
            Ok(())
        } else {
            Err(ScoringError::InvalidWeights(format!(
                "{} v{} does not weight the expected features",
                self.name, self.version
            )))
        }
    }
}
