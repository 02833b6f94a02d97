use serde::{Deserialize, Serialize};
use crate::models::domain::Notification;

/// Notices addressed to the caller of an operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingResponse {
    pub notifications: Vec<Notification>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
