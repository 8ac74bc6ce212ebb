//! Travis Webhook - relays signed Travis CI build notifications to chat.
//!
//! Each delivery is handled on its own with no shared mutable state:
//!
//! ```text
//! Travis → web::handlers → signature check → notify::format → chat webhook
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod payload;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, NotifyError, VerifyError};
pub use notify::{ChatMessage, Notifier};
pub use payload::{BuildPayload, BuildState, EventType};
pub use web::{router, AppState, Outcome};
