// Core matchmaking exports
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod sessions;
pub mod window;

pub use coordinator::{Coordinator, ExpiryPolicy, PairingStats};
pub use error::PairingError;
pub use registry::{MatchResult, WaitingRegistry};
pub use sessions::SessionStore;
pub use window::{default_window, within_window, DEFAULT_WINDOW_MINUTES};
