use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Capability unavailable: {0}")]
    Unavailable(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Query error: {0}")]
    Query(String),
}
