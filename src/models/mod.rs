// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ContactRef, Notice, Notification, PairId, PendingPair, Request, VoteOutcome};
pub use requests::{NotificationsQuery, SubmitRequest, UserRequest, VoteRequest};
pub use responses::{ErrorResponse, HealthResponse, PairingResponse};
