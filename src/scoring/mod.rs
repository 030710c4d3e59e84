pub mod composites;
pub mod geo;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod service;
pub mod weights;

mod errors;

pub use errors::ScoringError;
pub use models::*;
pub use pipeline::{compose, ThresholdTable};
pub use service::{ScoringEngine, ScoringEngineBuilder};
pub use weights::WeightVector;
