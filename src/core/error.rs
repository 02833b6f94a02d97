use thiserror::Error;

/// Local, non-fatal outcomes of pairing operations
///
/// None of these indicate a fault in the service. Callers turn them into
/// user-facing text (or an HTTP status in the adapter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    #[error("User {0} is already waiting for a match")]
    AlreadyWaiting(String),

    #[error("Pair {0} is no longer active")]
    SessionNotFound(String),

    #[error("User {user_id} is not a party of pair {pair_id}")]
    UnknownParty { pair_id: String, user_id: String },

    #[error("User {0} is not waiting for a match")]
    NotWaiting(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl PairingError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            PairingError::AlreadyWaiting(_) => "already_waiting",
            PairingError::SessionNotFound(_) => "session_not_found",
            PairingError::UnknownParty { .. } => "unknown_party",
            PairingError::NotWaiting(_) => "not_waiting",
            PairingError::InvalidRequest(_) => "invalid_request",
        }
    }
}
