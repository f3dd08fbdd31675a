//! Questwatch Core - Foundation crate for the questwatch tracker.
//!
//! This crate provides the shared configuration, watch-list types, and
//! error handling that the other questwatch crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Configuration error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Watch-list types (`WatchedQuest`, `WatchList`)
//!
//! # Example
//!
//! ```rust
//! use questwatch_core::{AppConfig, WatchList};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::with_default_watchlist();
//! let watch = WatchList::new(&config.watchlist);
//! assert!(watch.contains(41896));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, FetchConfig, MailConfig, ServerConfig, TrackerConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::{WatchList, WatchedQuest};
