//! Review Handler

use std::sync::Arc;

use crate::aggregate::ReviseItem;
use crate::domain::{IntervalTable, Revision, SharedClock};
use crate::error::{AppError, AppResult};
use crate::repository::ReviseItemRepository;

use super::{mutate_owned, ReviewItemCommand};

/// Result of a recorded review
#[derive(Debug, Clone)]
pub struct ReviewItemResult {
    pub item: ReviseItem,
    pub revision: Revision,
}

/// Handler for recording reviews
pub struct ReviewItemHandler<R> {
    repository: R,
    clock: SharedClock,
    intervals: Arc<IntervalTable>,
}

impl<R: ReviseItemRepository> ReviewItemHandler<R> {
    pub fn new(repository: R, clock: SharedClock, intervals: Arc<IntervalTable>) -> Self {
        Self {
            repository,
            clock,
            intervals,
        }
    }

    /// Execute the review command
    pub async fn execute(&self, command: ReviewItemCommand) -> AppResult<ReviewItemResult> {
        let intervals = Arc::clone(&self.intervals);

        let item = mutate_owned(
            &self.repository,
            &self.clock,
            command.item_id,
            command.caller_id,
            move |item, now| item.review(&intervals, now).map(|_| ()),
        )
        .await?;

        let revision = item
            .revisions()
            .last()
            .cloned()
            .ok_or_else(|| AppError::Unknown(format!("review of {} left no revision", item.id())))?;

        tracing::info!(
            item_id = %item.id(),
            repetitions = item.repetitions(),
            next_revision_at = %item.next_revision_at(),
            "Revise item reviewed"
        );

        Ok(ReviewItemResult { item, revision })
    }
}
