use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::delegate::{PredictionResult, TaskDescriptor, TaskPriority};
use crate::observation::SubjectProfile;
use crate::scoring::models::{
    Components, FeatureName, Lookback, MentalState, NormalizedFeature, PsychologicalReport,
};
use crate::scoring::normalizer;
use crate::scoring::pipeline::{compose, ThresholdTable};
use crate::scoring::weights::WeightVector;

use crate::shared::ScoringSources;

pub const PEAK_CONFIDENCE: f64 = 0.85;
pub const PEAK_RECENT_PERFORMANCE: f64 = 0.8;

pub const MENTAL_STATES: ThresholdTable<MentalState> = ThresholdTable::above(
    &[
        (0.7, MentalState::Focused),
        (0.5, MentalState::Neutral),
        (0.3, MentalState::Distracted),
    ],
    MentalState::Struggling,
);

/// Team form and output trend need more history than a short lookback holds
const FORM_HISTORY_DAYS: u32 = 60;

pub fn mental_state(confidence: f64, components: &Components) -> MentalState {
    let recent = components
        .get(&FeatureName::RecentPerformance)
        .map(|f| f.value)
        .unwrap_or(0.0);
    if confidence > PEAK_CONFIDENCE && recent > PEAK_RECENT_PERFORMANCE {
        MentalState::Peak
    } else {
        MENTAL_STATES.classify(confidence)
    }
}

pub fn projected_impact(confidence: f64) -> f64 {
    0.5 + confidence
}

/// First finite value of the regression result, unbounded
fn delegate_estimate(result: Option<&PredictionResult>) -> Option<f64> {
    result
        .and_then(|r| r.values.first().copied())
        .filter(|v| v.is_finite())
}

#[derive(Debug, Clone)]
pub struct PsychologicalModel {
    weights: WeightVector,
    sentiment_sources: Vec<String>,
}

impl PsychologicalModel {
    pub fn new(weights: WeightVector, sentiment_sources: Vec<String>) -> Self {
        Self {
            weights,
            sentiment_sources,
        }
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn sentiment_sources(&self) -> &[String] {
        &self.sentiment_sources
    }

    pub fn score(
        &self,
        subject_id: &str,
        features: Vec<NormalizedFeature>,
        prediction: Option<&PredictionResult>,
        generated_at: DateTime<Utc>,
    ) -> PsychologicalReport {
        let score = compose(subject_id, &self.weights, features, generated_at, mental_state);

        PsychologicalReport {
            projected_impact: projected_impact(score.value),
            delegate_estimate: delegate_estimate(prediction),
            score,
        }
    }

    pub fn regression_task(
        subject_id: &str,
        confidence: f64,
        features: &[NormalizedFeature],
    ) -> TaskDescriptor {
        let components: Map<String, Value> = features
            .iter()
            .filter_map(|f| {
                let key = serde_json::to_value(f.name).ok()?.as_str()?.to_string();
                Some((key, json!(f.value)))
            })
            .collect();

        TaskDescriptor::new(
            "regression",
            json!({
                "subjectId": subject_id,
                "confidence": confidence,
                "components": components,
            }),
            TaskPriority::Normal,
        )
    }

    /// Weighted confidence over `features`, used to build the regression task
    pub fn confidence(&self, features: &[NormalizedFeature]) -> f64 {
        let components: Components = features.iter().map(|f| (f.name, *f)).collect();
        normalizer::clamp_unit(self.weights.weighted_sum(&components))
    }

    #[instrument(skip(self, sources, profile), fields(subject_id = %profile.id))]
    pub async fn gather(
        &self,
        sources: &ScoringSources,
        profile: &SubjectProfile,
        lookback: &Lookback,
    ) -> Vec<NormalizedFeature> {
        let form_window = lookback.window_of_at_least(FORM_HISTORY_DAYS);
        let sentiment_reads = self
            .sentiment_sources
            .iter()
            .map(|provider| sources.observations.sentiment(provider, &profile.id));

        let (sentiments, tone, body_language, schedule, lines) = tokio::join!(
            join_all(sentiment_reads),
            sources.observations.interview_tone(&profile.id),
            sources.observations.body_language(&profile.id),
            sources.schedule(&profile.team_id, &form_window),
            sources.stat_lines(&profile.id, &form_window),
        );

        debug!(
            sentiment_sources = sentiments.len(),
            sentiment_hits = sentiments.iter().filter(|s| s.is_some()).count(),
            schedule = schedule.len(),
            stat_lines = lines.len(),
            "Gathered psychological inputs"
        );

        vec![
            normalizer::sentiment(&sentiments),
            normalizer::signal(FeatureName::InterviewTone, tone),
            normalizer::signal(FeatureName::BodyLanguage, body_language),
            normalizer::team_dynamics(&schedule),
            normalizer::recent_performance(&lines),
        ]
    }
}
