//! Notification channel
//!
//! The scanner hands each due user and their due items to a [`Notifier`].
//! Delivery channels (mail, push, chat) implement the trait; the default
//! [`TracingNotifier`] writes the reminder to the log.

use async_trait::async_trait;

use crate::aggregate::ReviseItem;
use crate::domain::ReminderUser;

/// Delivery errors. Every error is treated as transient by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Outbound reminder channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: &ReminderUser, items: &[ReviseItem]) -> Result<(), NotifyError>;
}

/// Logs reminders instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, user: &ReminderUser, items: &[ReviseItem]) -> Result<(), NotifyError> {
        let names: Vec<&str> = items.iter().map(|item| item.name()).collect();

        tracing::info!(
            user_id = %user.id,
            display_name = user.display_name.as_deref().unwrap_or(""),
            due_items = items.len(),
            items = ?names,
            "Revision reminder"
        );

        Ok(())
    }
}
