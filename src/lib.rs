//! revise-scheduler Library
//!
//! Spaced-repetition revision scheduling: revise items with an append-only
//! review history, an update-by-closure repository, command/query handlers,
//! an HTTP API, and a periodic due-item reminder scan.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod handlers;
pub mod jobs;
pub mod repository;

pub use aggregate::{ItemStatus, ReviseItem};
pub use config::Config;
pub use domain::{DomainError, IntervalTable, ReminderUser};
pub use error::{AppError, AppResult, ErrorKind};
