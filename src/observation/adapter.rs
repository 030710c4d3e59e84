use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use super::gateway::ObservationGateway;
use super::models::{
    BiomechanicalLoad, CrowdAcoustics, Observation, RecoveryMetrics, SentimentReading,
    SignalReading, TrackingMetrics, TravelLeg, VenueProfile, WeatherConditions,
};

/// Provider feeds the engine reads through the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationSource {
    Tracking,
    Travel,
    Biomechanics,
    Recovery,
    Sentiment(String),
    InterviewTone,
    BodyLanguage,
    Weather,
    Venue,
    Crowd,
}

impl ObservationSource {
    pub fn capability(&self) -> &str {
        match self {
            ObservationSource::Tracking => "tracking",
            ObservationSource::Travel => "travel",
            ObservationSource::Biomechanics => "biomechanics",
            ObservationSource::Recovery => "wellness",
            ObservationSource::Sentiment(_) => "sentiment",
            ObservationSource::InterviewTone => "media",
            ObservationSource::BodyLanguage => "video",
            ObservationSource::Weather => "weather",
            ObservationSource::Venue | ObservationSource::Crowd => "venue",
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            ObservationSource::Tracking => "metrics",
            ObservationSource::Travel => "legs",
            ObservationSource::Biomechanics => "stress",
            ObservationSource::Recovery => "recovery",
            ObservationSource::Sentiment(provider) => provider.as_str(),
            ObservationSource::InterviewTone => "interview_tone",
            ObservationSource::BodyLanguage => "body_language",
            ObservationSource::Weather => "forecast",
            ObservationSource::Venue => "profile",
            ObservationSource::Crowd => "crowd_acoustics",
        }
    }
}

// Providers disagree on envelope shapes; these accept the known variants.

#[derive(Deserialize)]
#[serde(untagged)]
enum TravelShape {
    Legs(Vec<TravelLeg>),
    Wrapped { legs: Vec<TravelLeg> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StressSample {
    Value(f64),
    Tagged {
        #[serde(alias = "stress", alias = "load")]
        value: f64,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StressShape {
    Samples(Vec<StressSample>),
    Wrapped {
        #[serde(alias = "samples", alias = "stressReadings")]
        readings: Vec<StressSample>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarShape {
    Value(f64),
    Tagged {
        #[serde(alias = "score", alias = "confidence", alias = "sentiment")]
        value: f64,
    },
}

impl ScalarShape {
    fn value(self) -> f64 {
        match self {
            ScalarShape::Value(v) | ScalarShape::Tagged { value: v } => v,
        }
    }
}

fn parse<T: DeserializeOwned>(raw: Value) -> Option<T> {
    serde_json::from_value(raw).ok()
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Resolves a raw provider payload into the schema for its source.
///
/// Malformed payloads resolve to `None`, exactly like absent ones.
pub fn decode(source: &ObservationSource, raw: Value) -> Option<Observation> {
    match source {
        ObservationSource::Tracking => parse::<TrackingMetrics>(raw).map(Observation::Tracking),
        ObservationSource::Travel => parse::<TravelShape>(raw).map(|shape| {
            Observation::Travel(match shape {
                TravelShape::Legs(legs) | TravelShape::Wrapped { legs } => legs,
            })
        }),
        ObservationSource::Biomechanics => parse::<StressShape>(raw).map(|shape| {
            let samples = match shape {
                StressShape::Samples(s) | StressShape::Wrapped { readings: s } => s,
            };
            let readings = samples
                .into_iter()
                .map(|sample| match sample {
                    StressSample::Value(v) | StressSample::Tagged { value: v } => v,
                })
                .filter(|v| v.is_finite())
                .collect();
            Observation::Biomechanics(BiomechanicalLoad { readings })
        }),
        ObservationSource::Recovery => parse::<RecoveryMetrics>(raw).map(Observation::Recovery),
        ObservationSource::Sentiment(_) => parse::<ScalarShape>(raw)
            .and_then(|s| finite(s.value()))
            .map(|score| Observation::Sentiment(SentimentReading { score })),
        ObservationSource::InterviewTone => parse::<ScalarShape>(raw)
            .and_then(|s| finite(s.value()))
            .map(|confidence| Observation::InterviewTone(SignalReading { confidence })),
        ObservationSource::BodyLanguage => parse::<ScalarShape>(raw)
            .and_then(|s| finite(s.value()))
            .map(|confidence| Observation::BodyLanguage(SignalReading { confidence })),
        ObservationSource::Weather => parse::<WeatherConditions>(raw).map(Observation::Weather),
        ObservationSource::Venue => parse::<VenueProfile>(raw).map(Observation::Venue),
        ObservationSource::Crowd => parse::<CrowdAcoustics>(raw).map(Observation::Crowd),
    }
}

/// Typed reads over an [`ObservationGateway`].
///
/// Every accessor returns `None` when the provider is unavailable, returns
/// nothing, or returns a payload that does not fit the source schema.
#[derive(Clone)]
pub struct ObservationAdapter {
    gateway: Arc<dyn ObservationGateway>,
}

impl ObservationAdapter {
    pub fn new(gateway: Arc<dyn ObservationGateway>) -> Self {
        Self { gateway }
    }

    pub async fn observe(&self, source: &ObservationSource, args: Value) -> Option<Observation> {
        let capability = source.capability();
        let operation = source.operation();

        match self.gateway.fetch(capability, operation, args).await {
            Ok(Some(raw)) => {
                let decoded = decode(source, raw);
                if decoded.is_none() {
                    debug!(capability, operation, "Discarding malformed observation payload");
                }
                decoded
            }
            Ok(None) => {
                debug!(capability, operation, "Observation not available");
                None
            }
            Err(err) => {
                debug!(capability, operation, error = %err, "Observation fetch failed");
                None
            }
        }
    }

    pub async fn tracking(&self, subject_id: &str, days: u32) -> Option<TrackingMetrics> {
        let args = json!({ "subjectId": subject_id, "days": days });
        match self.observe(&ObservationSource::Tracking, args).await? {
            Observation::Tracking(metrics) => Some(metrics),
            _ => None,
        }
    }

    pub async fn travel(&self, subject_id: &str, days: u32) -> Vec<TravelLeg> {
        let args = json!({ "subjectId": subject_id, "days": days });
        match self.observe(&ObservationSource::Travel, args).await {
            Some(Observation::Travel(legs)) => legs,
            _ => Vec::new(),
        }
    }

    pub async fn biomechanics(&self, subject_id: &str, days: u32) -> Option<BiomechanicalLoad> {
        let args = json!({ "subjectId": subject_id, "days": days });
        match self.observe(&ObservationSource::Biomechanics, args).await? {
            Observation::Biomechanics(load) => Some(load),
            _ => None,
        }
    }

    pub async fn recovery(&self, subject_id: &str) -> Option<RecoveryMetrics> {
        let args = json!({ "subjectId": subject_id });
        match self.observe(&ObservationSource::Recovery, args).await? {
            Observation::Recovery(metrics) => Some(metrics),
            _ => None,
        }
    }

    pub async fn sentiment(&self, provider: &str, subject_id: &str) -> Option<SentimentReading> {
        let source = ObservationSource::Sentiment(provider.to_string());
        let args = json!({ "subjectId": subject_id });
        match self.observe(&source, args).await? {
            Observation::Sentiment(reading) => Some(reading),
            _ => None,
        }
    }

    pub async fn interview_tone(&self, subject_id: &str) -> Option<SignalReading> {
        let args = json!({ "subjectId": subject_id });
        match self.observe(&ObservationSource::InterviewTone, args).await? {
            Observation::InterviewTone(reading) => Some(reading),
            _ => None,
        }
    }

    pub async fn body_language(&self, subject_id: &str) -> Option<SignalReading> {
        let args = json!({ "subjectId": subject_id });
        match self.observe(&ObservationSource::BodyLanguage, args).await? {
            Observation::BodyLanguage(reading) => Some(reading),
            _ => None,
        }
    }

    /// Forecast for the next game of a subject, or for an explicit game
    pub async fn weather(&self, args: Value) -> Option<WeatherConditions> {
        match self.observe(&ObservationSource::Weather, args).await? {
            Observation::Weather(conditions) => Some(conditions),
            _ => None,
        }
    }

    pub async fn venue(&self, venue_id: &str) -> Option<VenueProfile> {
        let args = json!({ "venueId": venue_id });
        match self.observe(&ObservationSource::Venue, args).await? {
            Observation::Venue(profile) => Some(profile),
            _ => None,
        }
    }

    pub async fn crowd(&self, venue_id: &str) -> Option<CrowdAcoustics> {
        let args = json!({ "venueId": venue_id });
        match self.observe(&ObservationSource::Crowd, args).await? {
            Observation::Crowd(acoustics) => Some(acoustics),
            _ => None,
        }
    }
}
