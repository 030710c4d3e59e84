pub mod adapter;
pub mod gateway;
pub mod history;
pub mod models;

mod errors;

pub use adapter::{ObservationAdapter, ObservationSource};
pub use errors::GatewayError;
pub use gateway::{InMemoryObservationGateway, ObservationGateway};
pub use history::{HistoricalRecords, InMemoryHistoricalRecords};
pub use models::*;
