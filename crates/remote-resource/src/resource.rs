//! Typed boundary calls.

use portal_types::{MutationRequest, QueryKey, TransportError};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::routes;
use crate::transport::{Transport, TransportResponse};

/// Typed accessor for the portal's remote collections and entities.
///
/// Each call is exactly one transport round-trip. Cloning is cheap.
#[derive(Clone)]
pub struct RemoteResource {
    transport: Arc<dyn Transport>,
}

impl RemoteResource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Loads the collection or entity identified by `key`.
    pub async fn fetch<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<T, TransportError> {
        let request = routes::query_request(key)?;
        debug!(key = %key, path = %request.path, "Fetching resource");
        let response = self.transport.send(request).await?;
        decode(response)
    }

    /// Performs a state-changing request and decodes the server's answer.
    pub async fn mutate<R: DeserializeOwned>(
        &self,
        request: &MutationRequest,
    ) -> Result<R, TransportError> {
        let transport_request = routes::mutation_request(request);
        debug!(
            kind = %request.kind(),
            method = %transport_request.method,
            path = %transport_request.path,
            "Sending mutation"
        );
        let response = self.transport.send(transport_request).await?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: TransportResponse) -> Result<T, TransportError> {
    let TransportResponse { status, data } = response;
    serde_json::from_value::<T>(data)
        .map_err(|e| TransportError::http(status, format!("failed to decode response: {e}")))
}
