//! Chat notification module.
//!
//! Turns a verified build payload into a Google Chat card and posts it to
//! the configured webhook:
//!
//! ```text
//! BuildPayload → format_message() → ChatMessage → Notifier::send()
//! ```

pub mod card;
pub mod client;
pub mod format;

pub use card::{Button, Card, CardHeader, ChatMessage, Section, Widget};
pub use client::Notifier;
pub use format::{format_duration, format_message};
