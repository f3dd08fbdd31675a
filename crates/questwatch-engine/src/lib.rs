//! Questwatch Engine - Stateful reconciliation of page sightings.
//!
//! This crate owns the in-memory entity indexes and the per-cycle
//! algorithm that merges newly observed entities and quest instances into
//! persistent state exactly once, tracks instance expiry, and computes the
//! alert-worthy delta.
//!
//! # Cycle shape
//!
//! 1. Expire tracked instances whose ending has passed
//! 2. Discover zones and base entities from page anchors
//! 3. Process the quest listing under bounded concurrency
//! 4. Hand the newly-instantiated quest ids to the alert composer
//!
//! Per-record and per-entry failures are absorbed and logged; only a
//! missing or malformed listing is fatal to the cycle, since that means
//! the page format changed.
//!
//! # Example
//!
//! ```rust,ignore
//! use questwatch_engine::{reconcile, TrackerState};
//!
//! let mut state = TrackerState::load(&db, now).await?;
//! let outcome = reconcile(&mut state, &db, &page, now).await?;
//! if let Some(alert) = questwatch_engine::alert::compose(
//!     &outcome.new_quest_ids, &watch, &state.quests, &state.active,
//! ) {
//!     // hand to the notifier
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alert;
pub mod cycle;
pub mod error;
pub mod state;

// Re-export commonly used types
pub use alert::{compose, compose_failure, Alert};
pub use cycle::{reconcile, CycleOutcome, MAX_CONCURRENT_ENTRIES};
pub use error::{CycleError, Result};
pub use state::TrackerState;
