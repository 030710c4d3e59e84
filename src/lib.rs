// Composite player scoring engine
// Public API used by embedding services and the integration tests

pub mod cache;
pub mod config;
pub mod delegate;
pub mod observation;
pub mod scoring;
pub mod shared;

pub use cache::{InMemoryScoreCache, ScoreCache};
pub use config::EngineConfig;
pub use delegate::{
    BoundedDelegate, DelegateError, PredictionDelegate, PredictionResult, TaskDescriptor,
    TaskPriority, UnavailableDelegate,
};
pub use observation::{
    GatewayError, HistoricalRecords, InMemoryHistoricalRecords, InMemoryObservationGateway,
    ObservationGateway,
};
pub use scoring::{
    EnvironmentalReport, FatigueReport, GameContext, InjuryRiskReport, Lookback, PlayerAssessment,
    PsychologicalReport, ScoringEngine, ScoringEngineBuilder, ScoringError, WeightVector,
};
pub use shared::ScoringSources;
