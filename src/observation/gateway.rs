use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::GatewayError;

/// Capability-addressed access to third-party observation providers.
///
/// `Ok(None)` and `Err(_)` are both treated by the engine as missing data.
#[async_trait]
pub trait ObservationGateway: Send + Sync {
    async fn fetch(
        &self,
        capability: &str,
        operation: &str,
        args: Value,
    ) -> Result<Option<Value>, GatewayError>;
}

/// Argument keys used to address a stored payload, in lookup order
const ADDRESS_KEYS: [&str; 3] = ["subjectId", "gameId", "venueId"];

fn address_of(args: &Value) -> Option<String> {
    ADDRESS_KEYS
        .iter()
        .find_map(|key| args.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

type PayloadKey = (String, String, String);

/// In-memory gateway for development and testing
///
/// Payloads are addressed by capability, operation and the first of
/// `subjectId`, `gameId` or `venueId` present in the call arguments.
#[derive(Debug, Default)]
pub struct InMemoryObservationGateway {
    payloads: RwLock<HashMap<PayloadKey, Value>>,
}

impl InMemoryObservationGateway {
    pub fn new() -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, capability: &str, operation: &str, address: &str, payload: Value) {
        self.payloads.write().await.insert(
            (
                capability.to_string(),
                operation.to_string(),
                address.to_string(),
            ),
            payload,
        );
    }

    pub async fn payload_count(&self) -> usize {
        self.payloads.read().await.len()
    }
}

#[async_trait]
impl ObservationGateway for InMemoryObservationGateway {
    #[instrument(skip(self, args))]
    async fn fetch(
        &self,
        capability: &str,
        operation: &str,
        args: Value,
    ) -> Result<Option<Value>, GatewayError> {
        let Some(address) = address_of(&args) else {
            return Err(GatewayError::Query(format!(
                "no address in arguments for {capability}/{operation}"
            )));
        };

        let payloads = self.payloads.read().await;
        let payload = payloads
            .get(&(capability.to_string(), operation.to_string(), address.clone()))
            .cloned();

        if payload.is_none() {
            debug!(capability, operation, address = %address, "No payload stored in memory");
        }

        Ok(payload)
    }
}
