//! The four composite models.
//!
//! Each model splits into a concurrent `gather` over the data ports and a pure
//! `score` over already-normalized features, so scoring is testable without I/O.

pub mod environmental;
pub mod fatigue;
pub mod injury_risk;
pub mod psychological;

pub use environmental::EnvironmentalModel;
pub use fatigue::FatigueModel;
pub use injury_risk::InjuryRiskModel;
pub use psychological::PsychologicalModel;
