use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::EnumIter;

use crate::observation::{PositionGroup, TimeWindow};

use super::normalizer::clamp_unit;

/// Every feature any composite model consumes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum FeatureName {
    PhysicalLoad,
    TravelFatigue,
    GameFrequency,
    MinutesPlayed,
    RecoveryTime,
    Workload,
    HistoricalInjuries,
    BiomechanicalStress,
    EnvironmentalFactors,
    RecoveryMetrics,
    Sentiment,
    InterviewTone,
    BodyLanguage,
    TeamDynamics,
    RecentPerformance,
}

/// A bounded scalar derived from one observation field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeature {
    pub name: FeatureName,
    pub value: f64,
    /// True when the value is the neutral default for missing data
    pub defaulted: bool,
}

impl NormalizedFeature {
    pub fn observed(name: FeatureName, value: f64) -> Self {
        Self {
            name,
            value: clamp_unit(value),
            defaulted: false,
        }
    }

    pub fn defaulted(name: FeatureName, value: f64) -> Self {
        Self {
            name,
            value: clamp_unit(value),
            defaulted: true,
        }
    }
}

pub type Components = BTreeMap<FeatureName, NormalizedFeature>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScore<C> {
    pub subject_id: String,
    pub value: f64,
    pub components: Components,
    pub classification: C,
    pub generated_at: DateTime<Utc>,
}

impl<C> CompositeScore<C> {
    /// Value of one component, 0 when the model does not use it
    pub fn component(&self, name: FeatureName) -> f64 {
        self.components.get(&name).map(|f| f.value).unwrap_or(0.0)
    }

    pub fn defaulted_components(&self) -> Vec<FeatureName> {
        self.components
            .values()
            .filter(|f| f.defaulted)
            .map(|f| f.name)
            .collect()
    }
}

// ============================================================================
// Classifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedAction {
    Start,
    Monitor,
    Bench,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentalState {
    Struggling,
    Distracted,
    Neutral,
    Focused,
    Peak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCondition {
    Poor,
    Fair,
    Good,
    Excellent,
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueReport {
    pub score: CompositeScore<RecommendedAction>,
    /// Historical correlation between fatigue and output for this subject
    pub performance_correlation: f64,
    pub projected_performance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjuryProbability {
    pub next_game: f64,
    pub next_7_days: f64,
    pub next_30_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjuryRiskReport {
    pub score: CompositeScore<RiskLevel>,
    pub injury_probability: InjuryProbability,
    pub recommendations: Vec<String>,
}

impl InjuryRiskReport {
    pub fn risk_level(&self) -> RiskLevel {
        self.score.classification
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsychologicalReport {
    pub score: CompositeScore<MentalState>,
    /// Authoritative performance multiplier, `0.5 + confidence`
    pub projected_impact: f64,
    /// Modifier returned by the regression delegate, informational only
    pub delegate_estimate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldAnalysis {
    pub condition: f64,
    pub speed: f64,
    pub traction: f64,
    pub classification: FieldCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalReport {
    pub subject_id: String,
    pub game_id: String,
    pub is_home: bool,
    pub weather_risk: f64,
    pub field: FieldAnalysis,
    pub home_advantage: f64,
    pub communication_difficulty: f64,
    pub circadian_alignment: f64,
    pub position_modifiers: BTreeMap<PositionGroup, f64>,
    /// Modifier for the subject's own position, when known
    pub subject_modifier: Option<f64>,
    pub generated_at: DateTime<Utc>,
}

/// All four models for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAssessment {
    pub subject_id: String,
    pub fatigue: FatigueReport,
    pub injury_risk: InjuryRiskReport,
    pub psychological: PsychologicalReport,
    pub environmental: Option<EnvironmentalReport>,
}

// ============================================================================
// Request contexts
// ============================================================================

/// Lookback window ending at `as_of`; `as_of` also stamps the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookback {
    pub days: u32,
    pub as_of: DateTime<Utc>,
}

impl Lookback {
    pub fn new(days: u32, as_of: DateTime<Utc>) -> Self {
        Self { days, as_of }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::ending_at(self.as_of, self.days)
    }

    /// The lookback window widened to at least `min_days`
    pub fn window_of_at_least(&self, min_days: u32) -> TimeWindow {
        TimeWindow::ending_at(self.as_of, self.days.max(min_days))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameContext {
    pub game_id: String,
    pub as_of: DateTime<Utc>,
}

impl GameContext {
    pub fn new(game_id: &str, as_of: DateTime<Utc>) -> Self {
        Self {
            game_id: game_id.to_string(),
            as_of,
        }
    }
}
