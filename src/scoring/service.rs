use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::cache::{keys, ScoreCache};
use crate::config::EngineConfig;
use crate::delegate::{BoundedDelegate, PredictionDelegate, UnavailableDelegate};
use crate::observation::{HistoricalRecords, ObservationAdapter, ObservationGateway, SubjectProfile};
use crate::shared::ScoringSources;

use super::composites::{EnvironmentalModel, FatigueModel, InjuryRiskModel, PsychologicalModel};
use super::models::{
    EnvironmentalReport, FatigueReport, FeatureName, GameContext, InjuryRiskReport, Lookback,
    PlayerAssessment, PsychologicalReport,
};
use super::weights::{WeightVector, FATIGUE_WEIGHTS, INJURY_RISK_WEIGHTS, PSYCHOLOGICAL_WEIGHTS};
use super::ScoringError;

/// Longest history a single request may reach back over
pub const MAX_LOOKBACK_DAYS: u32 = 3 * 365;

/// Entry point for every composite score.
///
/// Only subject and request validation errors surface to callers. Missing or failing
/// data sources degrade to neutral defaults inside the models.
pub struct ScoringEngine {
    sources: ScoringSources,
    cache: Option<Arc<dyn ScoreCache>>,
    config: EngineConfig,
    fatigue: FatigueModel,
    injury_risk: InjuryRiskModel,
    psychological: PsychologicalModel,
    environmental: EnvironmentalModel,
}

impl ScoringEngine {
    pub fn builder(
        observations: Arc<dyn ObservationGateway>,
        history: Arc<dyn HistoricalRecords>,
    ) -> ScoringEngineBuilder {
        ScoringEngineBuilder::new(observations, history)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(skip(self, lookback), fields(days = lookback.days))]
    pub async fn fatigue_index(
        &self,
        subject_id: &str,
        lookback: &Lookback,
    ) -> Result<FatigueReport, ScoringError> {
        let profile = self.resolve(subject_id, lookback).await?;
        let key = keys::lookback_key(
            keys::FATIGUE_MODEL,
            subject_id,
            lookback.as_of,
            lookback.days,
        );

        let report = self
            .read_through(key, async {
                let inputs = self.fatigue.gather(&self.sources, &profile, lookback).await;
                self.fatigue.score(&profile.id, inputs, lookback.as_of)
            })
            .await;

        info!(
            value = report.score.value,
            action = ?report.score.classification,
            "Fatigue index ready"
        );
        Ok(report)
    }

    #[instrument(skip(self, lookback), fields(days = lookback.days))]
    pub async fn injury_risk(
        &self,
        subject_id: &str,
        lookback: &Lookback,
    ) -> Result<InjuryRiskReport, ScoringError> {
        let profile = self.resolve(subject_id, lookback).await?;
        let key = keys::lookback_key(
            keys::INJURY_RISK_MODEL,
            subject_id,
            lookback.as_of,
            lookback.days,
        );

        let report = self
            .read_through(key, async {
                let inputs = self
                    .injury_risk
                    .gather(&self.sources, &profile, lookback)
                    .await;
                let task = InjuryRiskModel::prediction_task(&profile.id, inputs.delegate_features);
                let prediction = self.sources.delegate.submit(task).await;
                self.injury_risk.score(
                    &profile.id,
                    inputs.features,
                    prediction.as_ref(),
                    lookback.as_of,
                )
            })
            .await;

        info!(
            value = report.score.value,
            level = ?report.risk_level(),
            recommendations = report.recommendations.len(),
            "Injury risk ready"
        );
        Ok(report)
    }

    #[instrument(skip(self, lookback), fields(days = lookback.days))]
    pub async fn psychological_state(
        &self,
        subject_id: &str,
        lookback: &Lookback,
    ) -> Result<PsychologicalReport, ScoringError> {
        let profile = self.resolve(subject_id, lookback).await?;
        let key = keys::lookback_key(
            keys::PSYCHOLOGICAL_MODEL,
            subject_id,
            lookback.as_of,
            lookback.days,
        );

        let report = self
            .read_through(key, async {
                let features = self
                    .psychological
                    .gather(&self.sources, &profile, lookback)
                    .await;
                let confidence = self.psychological.confidence(&features);
                let task = PsychologicalModel::regression_task(&profile.id, confidence, &features);
                let prediction = self.sources.delegate.submit(task).await;
                self.psychological.score(
                    &profile.id,
                    features,
                    prediction.as_ref(),
                    lookback.as_of,
                )
            })
            .await;

        info!(
            value = report.score.value,
            state = ?report.score.classification,
            "Psychological state ready"
        );
        Ok(report)
    }

    #[instrument(skip(self, context), fields(game_id = %context.game_id))]
    pub async fn environmental_impact(
        &self,
        subject_id: &str,
        context: &GameContext,
    ) -> Result<EnvironmentalReport, ScoringError> {
        let profile = self.resolve_subject(subject_id).await?;
        let key = keys::game_key(
            keys::ENVIRONMENTAL_MODEL,
            subject_id,
            &context.game_id,
            context.as_of,
        );

        let report = self
            .read_through(key, async {
                let inputs = self
                    .environmental
                    .gather(&self.sources, &profile, context)
                    .await;
                self.environmental.score(&profile, context, &inputs)
            })
            .await;

        info!(
            weather_risk = report.weather_risk,
            is_home = report.is_home,
            "Environmental impact ready"
        );
        Ok(report)
    }

    /// Runs every model for one subject concurrently
    #[instrument(skip(self, lookback, game), fields(days = lookback.days))]
    pub async fn full_assessment(
        &self,
        subject_id: &str,
        lookback: &Lookback,
        game: Option<&GameContext>,
    ) -> Result<PlayerAssessment, ScoringError> {
        let environmental = async {
            match game {
                Some(context) => self.environmental_impact(subject_id, context).await.map(Some),
                None => Ok(None),
            }
        };

        let (fatigue, injury_risk, psychological, environmental) = tokio::try_join!(
            self.fatigue_index(subject_id, lookback),
            self.injury_risk(subject_id, lookback),
            self.psychological_state(subject_id, lookback),
            environmental,
        )?;

        Ok(PlayerAssessment {
            subject_id: subject_id.to_string(),
            fatigue,
            injury_risk,
            psychological,
            environmental,
        })
    }

    async fn resolve(
        &self,
        subject_id: &str,
        lookback: &Lookback,
    ) -> Result<SubjectProfile, ScoringError> {
        if lookback.days == 0 || lookback.days > MAX_LOOKBACK_DAYS {
            return Err(ScoringError::InvalidLookback(lookback.days));
        }
        self.resolve_subject(subject_id).await
    }

    async fn resolve_subject(&self, subject_id: &str) -> Result<SubjectProfile, ScoringError> {
        if subject_id.trim().is_empty() {
            return Err(ScoringError::invalid_subject(subject_id, "subject id is empty"));
        }

        match self.sources.history.resolve_subject(subject_id).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(ScoringError::invalid_subject(subject_id, "unknown subject")),
            Err(err) => {
                warn!(subject_id, error = %err, "Subject lookup failed");
                Err(ScoringError::invalid_subject(subject_id, err.to_string()))
            }
        }
    }

    /// Serves `key` from the cache when present, otherwise computes and stores it
    async fn read_through<T, F>(&self, key: String, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = T>,
    {
        let Some(cache) = &self.cache else {
            return compute.await;
        };

        if let Some(hit) = cache.get(&key).await {
            match serde_json::from_value::<T>(hit) {
                Ok(report) => {
                    debug!(key = %key, "Score cache hit");
                    return report;
                }
                Err(err) => warn!(key = %key, error = %err, "Discarding unreadable cache entry"),
            }
        }

        let report = compute.await;
        match serde_json::to_value(&report) {
            Ok(value) => cache.set(&key, value, self.config.cache_ttl).await,
            Err(err) => warn!(key = %key, error = %err, "Report not cacheable"),
        }
        report
    }
}

pub struct ScoringEngineBuilder {
    observations: Arc<dyn ObservationGateway>,
    history: Arc<dyn HistoricalRecords>,
    delegate: Arc<dyn PredictionDelegate>,
    cache: Option<Arc<dyn ScoreCache>>,
    config: EngineConfig,
    fatigue_weights: WeightVector,
    injury_risk_weights: WeightVector,
    psychological_weights: WeightVector,
}

fn features_of(weights: &[(FeatureName, f64)]) -> Vec<FeatureName> {
    weights.iter().map(|(feature, _)| *feature).collect()
}

impl ScoringEngineBuilder {
    fn new(observations: Arc<dyn ObservationGateway>, history: Arc<dyn HistoricalRecords>) -> Self {
        Self {
            observations,
            history,
            delegate: Arc::new(UnavailableDelegate),
            cache: None,
            config: EngineConfig::default(),
            fatigue_weights: WeightVector::fatigue(),
            injury_risk_weights: WeightVector::injury_risk(),
            psychological_weights: WeightVector::psychological(),
        }
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn PredictionDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ScoreCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fatigue_weights(mut self, weights: WeightVector) -> Result<Self, ScoringError> {
        weights.ensure_covers(&features_of(&FATIGUE_WEIGHTS))?;
        self.fatigue_weights = weights;
        Ok(self)
    }

    pub fn with_injury_risk_weights(mut self, weights: WeightVector) -> Result<Self, ScoringError> {
        weights.ensure_covers(&features_of(&INJURY_RISK_WEIGHTS))?;
        self.injury_risk_weights = weights;
        Ok(self)
    }

    pub fn with_psychological_weights(
        mut self,
        weights: WeightVector,
    ) -> Result<Self, ScoringError> {
        weights.ensure_covers(&features_of(&PSYCHOLOGICAL_WEIGHTS))?;
        self.psychological_weights = weights;
        Ok(self)
    }

    pub fn build(self) -> ScoringEngine {
        let delegate = BoundedDelegate::new(self.delegate, self.config.delegate_timeout);
        let sources = ScoringSources::new(
            ObservationAdapter::new(self.observations),
            self.history,
            delegate,
        );

        ScoringEngine {
            sources,
            cache: self.cache,
            fatigue: FatigueModel::new(self.fatigue_weights),
            injury_risk: InjuryRiskModel::new(self.injury_risk_weights),
            psychological: PsychologicalModel::new(
                self.psychological_weights,
                self.config.sentiment_sources.clone(),
            ),
            environmental: EnvironmentalModel::new(),
            config: self.config,
        }
    }
}
