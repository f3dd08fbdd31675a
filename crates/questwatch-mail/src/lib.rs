//! Questwatch Mail - Outbound alert delivery over SMTP.
//!
//! Single best-effort sends; the caller logs a failure and moves on, there
//! is no retry or queueing in this design.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod sender;

pub use sender::{send_smtp, MailError};
