//! Domain module
//!
//! Core domain types and business rules.

pub mod clock;
pub mod error;
pub mod fields;
pub mod interval;
pub mod pagination;
pub mod revision;
pub mod tags;
pub mod user;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::DomainError;
pub use fields::{ItemDescription, ItemName};
pub use interval::{IntervalParseError, IntervalTable};
pub use pagination::{Page, PageMetadata, Pagination};
pub use revision::Revision;
pub use tags::TagSet;
pub use user::ReminderUser;
