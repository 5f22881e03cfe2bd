//! Request and response types for the diary API.
//!
//! Character payloads reuse [`diary_types::Character`] and
//! [`diary_types::FollowOutcome`]; only endpoint-specific envelopes live here.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Affinity
// ─────────────────────────────────────────────────────────────────────────────

/// Request to adjust a user/character affinity counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityRequest {
    /// Amount to add; may be negative.
    pub delta: i64,
}

/// The affinity value after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityResponse {
    pub affinity: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status (ok, degraded, unhealthy).
    pub status: String,
    /// Server version.
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthResponse {
    /// Whether the backend reports itself healthy.
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
