//! Aggregate module
//!
//! Aggregate roots. All invariant-preserving mutation goes through their methods.

pub mod revise_item;

pub use revise_item::{ItemStatus, ReviseItem, ReviseItemRecord};
