//! Health API.

use crate::client::DiaryClient;
use crate::error::Result;
use crate::types::HealthResponse;

/// Health API client.
pub struct HealthApi {
    client: DiaryClient,
}

impl HealthApi {
    pub(crate) fn new(client: DiaryClient) -> Self {
        Self { client }
    }

    /// Check backend health.
    pub async fn check(&self) -> Result<HealthResponse> {
        self.client.get(&["health"]).await
    }

    /// Simple connectivity check - returns true if the backend is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.check().await.is_ok()
    }
}
