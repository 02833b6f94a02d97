// Service exports
pub mod outbox;
pub mod rate_limit;
pub mod sweeper;

pub use outbox::Outbox;
pub use rate_limit::StartLimiter;
pub use sweeper::{spawn_expiry_sweeper, sweep_once};
