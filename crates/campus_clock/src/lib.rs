//! Campus room availability and exam countdowns.
//!
//! Two feeds are loaded at startup: a calendar feed of room bookings and a
//! JSON exam feed. Both become immutable snapshots that the HTTP API and the
//! dashboard task query; a reload swaps them whole.

pub mod calendar;
pub mod config;
pub mod countdown;
pub mod dashboard;
pub mod error;
pub mod exams;
pub mod feed;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{ConfigError, FeedError};
pub use feed::FeedClient;
pub use types::AppState;
