//! Scheduled Jobs
//!
//! The due-item reminder scan. Each cycle finds users whose local reminder
//! time fell in the range since the previous cycle, collects their due items,
//! and hands them to the [`Notifier`]. One user's failure never aborts the
//! cycle for the others.

mod notifier;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

use crate::aggregate::ReviseItem;
use crate::config::Config;
use crate::domain::{ReminderUser, SharedClock};
use crate::repository::UserDirectory;

pub use notifier::{Notifier, NotifyError, TracingNotifier};

// =========================================================================
// Configuration
// =========================================================================

/// Configuration for the reminder scheduler
#[derive(Debug, Clone)]
pub struct ReminderSchedulerConfig {
    /// Scan cadence, also the width of the first scanned range (default: 1 minute)
    pub scan_interval: Duration,
    /// Delivery attempts per user and cycle (default: 6)
    pub max_attempts: u32,
    /// Pause between delivery attempts (default: 1 second)
    pub retry_delay: Duration,
}

impl Default for ReminderSchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(60),
            max_attempts: 6,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl From<&Config> for ReminderSchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            scan_interval: config.reminder_scan_interval,
            max_attempts: config.notify_max_attempts,
            retry_delay: config.notify_retry_delay,
        }
    }
}

// =========================================================================
// Cycle report
// =========================================================================

/// A user whose reminder could not be delivered this cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFailure {
    pub user_id: Uuid,
    /// Delivery attempts made; 0 when the due items could not be loaded
    pub attempts: u32,
    pub error: String,
}

/// Outcome of one scan cycle over `[window_start, window_end)`
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub users_scanned: usize,
    pub users_notified: usize,
    pub items_notified: usize,
    pub failures: Vec<UserFailure>,
    /// Set when the due-user query itself failed
    pub scan_error: Option<String>,
    /// Stop was requested before every due user was processed
    pub interrupted: bool,
}

impl CycleReport {
    fn new(window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            window_start,
            window_end,
            users_scanned: 0,
            users_notified: 0,
            items_notified: 0,
            failures: Vec::new(),
            scan_error: None,
            interrupted: false,
        }
    }

    /// No failures and no scan error
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.scan_error.is_none()
    }
}

// =========================================================================
// ReminderScanner
// =========================================================================

/// Runs single scan cycles
pub struct ReminderScanner {
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    clock: SharedClock,
    config: ReminderSchedulerConfig,
}

impl ReminderScanner {
    /// Create a scanner with the default configuration
    pub fn new(
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: SharedClock,
    ) -> Self {
        Self::with_config(users, notifier, clock, ReminderSchedulerConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: SharedClock,
        config: ReminderSchedulerConfig,
    ) -> Self {
        Self {
            users,
            notifier,
            clock,
            config,
        }
    }

    /// Run one cycle over the scan interval ending now (manual trigger)
    pub async fn run_cycle(&self) -> CycleReport {
        let now = self.clock.now();
        self.cycle(now - self.window_width(), now, None).await
    }

    fn window_width(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.scan_interval)
            .unwrap_or_else(|_| chrono::Duration::minutes(1))
    }

    /// Notify users whose reminder time falls in `[from, to)` about items due at `to`
    async fn cycle(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        stop: Option<&watch::Receiver<bool>>,
    ) -> CycleReport {
        let now = to;
        let mut report = CycleReport::new(from, to);

        let users = match self.users.users_due_for_reminder(from, to).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "Fetching due users failed");
                report.scan_error = Some(e.to_string());
                return report;
            }
        };

        for user in users {
            if stop.is_some_and(|stop| *stop.borrow()) {
                report.interrupted = true;
                tracing::info!("Reminder cycle interrupted by shutdown");
                break;
            }

            report.users_scanned += 1;

            let items = match self.users.due_items_for_user(user.id, now).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::error!(user_id = %user.id, error = %e, "Fetching due items failed");
                    report.failures.push(UserFailure {
                        user_id: user.id,
                        attempts: 0,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if items.is_empty() {
                continue;
            }

            match self.notify_with_retry(&user, &items).await {
                Ok(attempts) => {
                    tracing::debug!(user_id = %user.id, attempts, items = items.len(), "Reminder delivered");
                    report.users_notified += 1;
                    report.items_notified += items.len();
                }
                Err((attempts, e)) => {
                    tracing::error!(
                        user_id = %user.id,
                        attempts,
                        error = %e,
                        "Reminder delivery gave up"
                    );
                    report.failures.push(UserFailure {
                        user_id: user.id,
                        attempts,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Deliver with a fixed delay between attempts.
    ///
    /// Returns the number of attempts used, or the last error.
    async fn notify_with_retry(
        &self,
        user: &ReminderUser,
        items: &[ReviseItem],
    ) -> Result<u32, (u32, NotifyError)> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.notifier.notify(user, items).await {
                Ok(()) => return Ok(attempt),
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        user_id = %user.id,
                        error = %e,
                        "Reminder delivery failed, retrying (attempt {}/{})",
                        attempt,
                        max_attempts
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => return Err((attempt, e)),
            }
        }
    }
}

// =========================================================================
// ScanCursor
// =========================================================================

/// Start of the next range to scan.
///
/// Each cycle scans from the previous end up to now, so a late cycle picks up
/// the time it missed and no instant is scanned twice.
#[derive(Debug, Clone, Default)]
struct ScanCursor {
    next_start: Option<DateTime<Utc>>,
}

impl ScanCursor {
    /// Range to scan at `now`; the first one starts `width` before it
    fn range(&mut self, now: DateTime<Utc>, width: chrono::Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = *self.next_start.get_or_insert(now - width);
        (start.min(now), now)
    }

    /// Never moves backwards when the clock does
    fn advance(&mut self, to: DateTime<Utc>) {
        self.next_start = Some(self.next_start.map_or(to, |end| end.max(to)));
    }
}

// =========================================================================
// ReminderScheduler
// =========================================================================

/// Periodic driver for a [`ReminderScanner`].
///
/// Constructed idle; [`start`](Self::start) spawns the cadence and returns a
/// [`SchedulerHandle`] used to stop it.
pub struct ReminderScheduler {
    scanner: ReminderScanner,
}

impl ReminderScheduler {
    pub fn new(scanner: ReminderScanner) -> Self {
        Self { scanner }
    }

    /// Start the scheduler in the background
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(stop_rx).await;
        });

        SchedulerHandle { stop_tx, task }
    }

    /// Run the scheduler loop until stop is requested
    async fn run(&self, mut stop: watch::Receiver<bool>) {
        tracing::info!(
            scan_interval_secs = self.scanner.config.scan_interval.as_secs(),
            "Reminder scheduler started"
        );

        let cycle_stop = stop.clone();
        let mut cursor = ScanCursor::default();
        let mut ticker = interval(self.scanner.config.scan_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick(&mut cursor, Some(&cycle_stop)).await;
                    log_report(&report);
                    if report.interrupted {
                        break;
                    }
                }
                _ = stop.changed() => break,
            }
        }

        tracing::info!("Reminder scheduler stopped");
    }

    /// Scan from the cursor up to now.
    ///
    /// The cursor only advances when the due-user query succeeded, so a failed
    /// scan is covered by the next cycle.
    async fn tick(
        &self,
        cursor: &mut ScanCursor,
        stop: Option<&watch::Receiver<bool>>,
    ) -> CycleReport {
        let (from, to) = cursor.range(self.scanner.clock.now(), self.scanner.window_width());
        let report = self.scanner.cycle(from, to, stop).await;
        if report.scan_error.is_none() {
            cursor.advance(to);
        }
        report
    }
}

fn log_report(report: &CycleReport) {
    if report.is_clean() {
        tracing::debug!(
            users_scanned = report.users_scanned,
            users_notified = report.users_notified,
            items_notified = report.items_notified,
            "Reminder cycle completed"
        );
    } else {
        tracing::warn!(
            users_scanned = report.users_scanned,
            users_notified = report.users_notified,
            failures = report.failures.len(),
            scan_error = report.scan_error.as_deref().unwrap_or(""),
            "Reminder cycle completed with failures"
        );
    }
}

/// Handle to a running [`ReminderScheduler`]
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the scheduler and wait for the in-flight user to finish
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Reminder scheduler task failed");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
