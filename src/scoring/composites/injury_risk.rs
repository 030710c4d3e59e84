use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::delegate::{PredictionResult, TaskDescriptor, TaskPriority};
use crate::observation::{
    BiomechanicalLoad, GameStatLine, InjuryRecord, RecoveryMetrics, SubjectProfile, TimeWindow,
};
use crate::scoring::models::{
    Components, FeatureName, InjuryProbability, InjuryRiskReport, Lookback, NormalizedFeature,
    RiskLevel,
};
use crate::scoring::normalizer;
use crate::scoring::pipeline::{compose, ThresholdTable};
use crate::scoring::weights::WeightVector;
use crate::shared::ScoringSources;

pub const RISK_LEVELS: ThresholdTable<RiskLevel> = ThresholdTable::below(
    &[
        (0.25, RiskLevel::Low),
        (0.5, RiskLevel::Medium),
        (0.75, RiskLevel::High),
    ],
    RiskLevel::Critical,
);

pub const PREDICTION_HORIZON_DAYS: u32 = 30;

const WORKLOAD_HISTORY_DAYS: u32 = 28;
const UPCOMING_GAME_DAYS: u32 = 14;

pub const LOAD_MANAGEMENT: &str =
    "Reduce training load and manage minutes until acute workload returns to baseline";
pub const MOVEMENT_SCREENING: &str =
    "Schedule a biomechanical movement screening to address elevated joint stress";
pub const SLEEP_AND_RECOVERY: &str =
    "Prioritize sleep and recovery protocols before the next session";
pub const PREHAB: &str = "Maintain a targeted prehab program for previously injured areas";
pub const DAILY_MONITORING: &str = "Monitor daily with the medical staff until risk subsides";

/// Risk-reduction advice, in a fixed order, for the given components and level
pub fn recommendations(components: &Components, level: RiskLevel) -> Vec<String> {
    let value = |name: FeatureName| components.get(&name).map(|f| f.value);
    let mut advice = Vec::new();

    if value(FeatureName::Workload).is_some_and(|v| v > 0.7) {
        advice.push(LOAD_MANAGEMENT.to_string());
    }
    if value(FeatureName::BiomechanicalStress).is_some_and(|v| v > 0.6) {
        advice.push(MOVEMENT_SCREENING.to_string());
    }
    if value(FeatureName::RecoveryMetrics).is_some_and(|v| v < 0.4) {
        advice.push(SLEEP_AND_RECOVERY.to_string());
    }
    if value(FeatureName::HistoricalInjuries).is_some_and(|v| v > 0.5) {
        advice.push(PREHAB.to_string());
    }
    if matches!(level, RiskLevel::High | RiskLevel::Critical) {
        advice.push(DAILY_MONITORING.to_string());
    }

    advice
}

/// Horizon probabilities from the delegate's daily series; all zero without one
pub fn injury_probability(result: Option<&PredictionResult>) -> InjuryProbability {
    let values = result.map(PredictionResult::bounded_values).unwrap_or_default();
    let Some(&next_game) = values.first() else {
        return InjuryProbability::default();
    };

    InjuryProbability {
        next_game,
        next_7_days: values.iter().take(7).copied().fold(0.0, f64::max),
        next_30_days: values.iter().copied().fold(0.0, f64::max),
    }
}

/// Minutes per day for the last `days` days, most recent first
fn daily_minutes(lines: &[GameStatLine], as_of: DateTime<Utc>, days: u32) -> Vec<f64> {
    let mut series = vec![0.0; days as usize];
    for line in lines.iter().filter(|l| l.played_at <= as_of) {
        let days_ago = (as_of - line.played_at).num_days();
        if let Some(slot) = usize::try_from(days_ago).ok().and_then(|d| series.get_mut(d)) {
            *slot += line.minutes.max(0.0);
        }
    }
    series
}

#[derive(Debug, Clone)]
pub struct InjuryRiskInputs {
    pub features: Vec<NormalizedFeature>,
    /// Feature series handed to the prediction delegate
    pub delegate_features: Value,
}

#[derive(Debug, Clone)]
pub struct InjuryRiskModel {
    weights: WeightVector,
}

impl InjuryRiskModel {
    pub fn new(weights: WeightVector) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn score(
        &self,
        subject_id: &str,
        features: Vec<NormalizedFeature>,
        prediction: Option<&PredictionResult>,
        generated_at: DateTime<Utc>,
    ) -> InjuryRiskReport {
        let mut advice = Vec::new();
        let score = compose(
            subject_id,
            &self.weights,
            features,
            generated_at,
            |value, components| {
                let level = RISK_LEVELS.classify(value);
                advice = recommendations(components, level);
                level
            },
        );

        InjuryRiskReport {
            score,
            injury_probability: injury_probability(prediction),
            recommendations: advice,
        }
    }

    pub fn prediction_task(subject_id: &str, delegate_features: Value) -> TaskDescriptor {
        TaskDescriptor::new(
            "prediction",
            json!({
                "subjectId": subject_id,
                "horizon": PREDICTION_HORIZON_DAYS,
                "features": delegate_features,
            }),
            TaskPriority::High,
        )
    }

    #[instrument(skip(self, sources, profile), fields(subject_id = %profile.id))]
    pub async fn gather(
        &self,
        sources: &ScoringSources,
        profile: &SubjectProfile,
        lookback: &Lookback,
    ) -> InjuryRiskInputs {
        let as_of = lookback.as_of;
        let history_window = lookback.window_of_at_least(WORKLOAD_HISTORY_DAYS);
        let upcoming = TimeWindow::starting_at(as_of, UPCOMING_GAME_DAYS);

        let (lines, injuries, biomechanics, recovery, weather, next_games) = tokio::join!(
            sources.stat_lines(&profile.id, &history_window),
            sources.injuries(&profile.id),
            sources.observations.biomechanics(&profile.id, lookback.days),
            sources.observations.recovery(&profile.id),
            sources.observations.weather(json!({
                "subjectId": profile.id,
                "asOf": as_of.to_rfc3339(),
            })),
            sources.schedule(&profile.team_id, &upcoming),
        );

        let next_venue = next_games
            .iter()
            .filter(|entry| entry.starts_at >= as_of)
            .min_by_key(|entry| entry.starts_at)
            .and_then(|entry| entry.venue_id.clone());
        let indoor = match next_venue {
            Some(venue_id) => sources
                .observations
                .venue(&venue_id)
                .await
                .is_some_and(|venue| venue.indoor),
            None => false,
        };

        let rest = normalizer::rest_days(&lines, as_of)
            .map(|days| normalizer::recovery_score(Some(days), profile.sport.ideal_rest_days()));

        debug!(
            stat_lines = lines.len(),
            injuries = injuries.len(),
            indoor,
            has_weather = weather.is_some(),
            "Gathered injury risk inputs"
        );

        InjuryRiskInputs {
            features: vec![
                normalizer::workload(&lines, as_of),
                normalizer::injury_history(&injuries, as_of),
                normalizer::biomechanical_stress(biomechanics.as_ref()),
                normalizer::environmental_risk(weather.as_ref(), indoor),
                normalizer::recovery_metrics(recovery.as_ref(), rest),
            ],
            delegate_features: delegate_features(
                &lines,
                &injuries,
                biomechanics.as_ref(),
                recovery.as_ref(),
                as_of,
            ),
        }
    }
}

impl Default for InjuryRiskModel {
    fn default() -> Self {
        Self::new(WeightVector::injury_risk())
    }
}

fn delegate_features(
    lines: &[GameStatLine],
    injuries: &[InjuryRecord],
    biomechanics: Option<&BiomechanicalLoad>,
    recovery: Option<&RecoveryMetrics>,
    as_of: DateTime<Utc>,
) -> Value {
    let injuries: Vec<Value> = injuries
        .iter()
        .filter(|record| record.occurred_at <= as_of)
        .map(|record| {
            json!({
                "daysAgo": (as_of - record.occurred_at).num_days(),
                "severity": record.severity,
            })
        })
        .collect();
    let recovery: Vec<f64> = recovery
        .map(|r| r.sleep_hours.into_iter().chain(r.hrv_score).collect())
        .unwrap_or_default();

    json!({
        "workload": daily_minutes(lines, as_of, WORKLOAD_HISTORY_DAYS),
        "injuries": injuries,
        "biomechanics": biomechanics.map(|b| b.readings.clone()).unwrap_or_default(),
        "recovery": recovery,
    })
}
