//! Register Reminder Handler

use std::sync::Arc;

use crate::domain::ReminderUser;
use crate::error::AppResult;
use crate::repository::UserDirectory;

use super::RegisterReminderCommand;

/// Handler for reminder registration
pub struct RegisterReminderHandler {
    users: Arc<dyn UserDirectory>,
}

impl RegisterReminderHandler {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    pub async fn execute(&self, command: RegisterReminderCommand) -> AppResult<ReminderUser> {
        let mut user = ReminderUser::new(
            command.user_id,
            command.reminder_time,
            command.utc_offset_minutes,
        )?;
        if let Some(display_name) = command.display_name {
            user = user.with_display_name(&display_name)?;
        }

        self.users.upsert_user(&user).await?;

        tracing::info!(
            user_id = %user.id,
            reminder_time = %user.reminder_time,
            utc_offset_minutes = user.utc_offset_minutes,
            "Reminder registered"
        );

        Ok(user)
    }
}
