use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::observation::SubjectProfile;
use crate::scoring::models::{FatigueReport, Lookback, NormalizedFeature, RecommendedAction};
use crate::scoring::normalizer;
use crate::scoring::pipeline::compose;
use crate::scoring::weights::WeightVector;
use crate::shared::ScoringSources;

pub const BENCH_FATIGUE: f64 = 0.7;
pub const BENCH_PROJECTION: f64 = 0.7;
pub const MONITOR_FATIGUE: f64 = 0.5;
pub const MONITOR_PROJECTION: f64 = 0.85;
pub const PROJECTION_FLOOR: f64 = 0.5;

/// Games considered when correlating load with output
const CORRELATION_HISTORY_DAYS: u32 = 120;

/// Normalized fatigue features plus the subject's load/output correlation
#[derive(Debug, Clone)]
pub struct FatigueInputs {
    pub features: Vec<NormalizedFeature>,
    pub performance_correlation: f64,
}

pub fn projected_performance(fatigue: f64, correlation: f64) -> f64 {
    (1.0 + fatigue * correlation).max(PROJECTION_FLOOR)
}

pub fn recommend(fatigue: f64, projected: f64) -> RecommendedAction {
    if fatigue > BENCH_FATIGUE || projected < BENCH_PROJECTION {
        RecommendedAction::Bench
    } else if fatigue > MONITOR_FATIGUE || projected < MONITOR_PROJECTION {
        RecommendedAction::Monitor
    } else {
        RecommendedAction::Start
    }
}

#[derive(Debug, Clone)]
pub struct FatigueModel {
    weights: WeightVector,
}

impl FatigueModel {
    pub fn new(weights: WeightVector) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn score(
        &self,
        subject_id: &str,
        inputs: FatigueInputs,
        generated_at: DateTime<Utc>,
    ) -> FatigueReport {
        let correlation = inputs.performance_correlation;
        let mut projected = PROJECTION_FLOOR;
        let score = compose(
            subject_id,
            &self.weights,
            inputs.features,
            generated_at,
            |fatigue, _| {
                projected = projected_performance(fatigue, correlation);
                recommend(fatigue, projected)
            },
        );

        FatigueReport {
            score,
            performance_correlation: correlation,
            projected_performance: projected,
        }
    }

    #[instrument(skip(self, sources, profile), fields(subject_id = %profile.id))]
    pub async fn gather(
        &self,
        sources: &ScoringSources,
        profile: &SubjectProfile,
        lookback: &Lookback,
    ) -> FatigueInputs {
        let window = lookback.window();
        let history_window = lookback.window_of_at_least(CORRELATION_HISTORY_DAYS);

        let (tracking, legs, history, schedule) = tokio::join!(
            sources.observations.tracking(&profile.id, lookback.days),
            sources.observations.travel(&profile.id, lookback.days),
            sources.stat_lines(&profile.id, &history_window),
            sources.schedule(&profile.team_id, &window),
        );

        let recent: Vec<_> = history
            .iter()
            .filter(|line| window.contains(line.played_at))
            .cloned()
            .collect();
        let games_played = schedule
            .iter()
            .filter(|entry| entry.starts_at <= lookback.as_of)
            .count();
        let rest = normalizer::rest_days(&history, lookback.as_of);

        debug!(
            games_played,
            stat_lines = recent.len(),
            travel_legs = legs.len(),
            has_tracking = tracking.is_some(),
            "Gathered fatigue inputs"
        );

        FatigueInputs {
            features: vec![
                normalizer::physical_load(tracking.as_ref()),
                normalizer::travel_fatigue(&legs),
                normalizer::game_frequency(games_played, lookback.days),
                normalizer::minutes_load(&recent, profile.sport),
                normalizer::recovery_time(rest, profile.sport),
            ],
            performance_correlation: normalizer::performance_correlation(&history, profile.sport),
        }
    }
}

impl Default for FatigueModel {
    fn default() -> Self {
        Self::new(WeightVector::fatigue())
    }
}
