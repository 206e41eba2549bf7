//! Fires the birthday campaign once per occurrence of a cron schedule,
//! evaluated against the host's local wall clock.

use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use cron::Schedule;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::campaign::{CampaignError, CampaignSummary};

/// The first occurrence of `schedule` strictly after `now`.
pub fn next_firing(schedule: &Schedule, now: DateTime<Local>) -> Option<DateTime<Local>> {
    schedule.after(&now).next()
}

/// A single long-lived scheduled task. Arming it is idempotent: only the
/// first call to [`DailyTrigger::start`] spawns the firing loop.
///
/// Firings missed while the process was down are not made up. Dropping the
/// trigger disarms it.
pub struct DailyTrigger<F> {
    schedule: Schedule,
    job: Arc<F>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<F, Fut> DailyTrigger<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CampaignSummary, CampaignError>> + Send + 'static,
{
    pub fn new(schedule: Schedule, job: F) -> Self {
        Self {
            schedule,
            job: Arc::new(job),
            handle: Mutex::new(None),
        }
    }

    /// Arms the trigger. Returns `false`, without arming a second loop, if it
    /// was already started.
    pub fn start(&self) -> bool {
        let mut handle = match self.handle.lock() {
            Ok(handle) => handle,
            Err(poisoned) => poisoned.into_inner(),
        };

        if handle.is_some() {
            tracing::warn!("Birthday trigger is already running, ignoring second start");
            return false;
        }

        *handle = Some(tokio::spawn(fire_on_schedule(
            self.schedule.clone(),
            Arc::clone(&self.job),
        )));
        tracing::info!(schedule = %self.schedule, "Birthday trigger started");

        true
    }

    pub fn is_started(&self) -> bool {
        match self.handle.lock() {
            Ok(handle) => handle.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }
}

impl<F> Drop for DailyTrigger<F> {
    fn drop(&mut self) {
        let handle = match self.handle.get_mut() {
            Ok(handle) => handle,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = handle.take() {
            handle.abort();
        }
    }
}

async fn fire_on_schedule<F, Fut>(schedule: Schedule, job: Arc<F>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CampaignSummary, CampaignError>> + Send + 'static,
{
    let mut last_fired: Option<DateTime<Local>> = None;

    loop {
        // Never pick the occurrence that has just fired, even if the wall
        // clock stepped backwards while the job ran.
        let now = Local::now();
        let after = last_fired.map_or(now, |fired| fired.max(now));
        let Some(next) = next_firing(&schedule, after) else {
            tracing::warn!(%schedule, "Schedule has no upcoming occurrence, birthday trigger stops");
            return;
        };
        tracing::info!(next_firing = %next, "Birthday campaign armed");

        // Re-check the wall clock on wake-up: a sleep measured on the monotonic
        // clock may end before the local time has reached `next`.
        loop {
            let remaining = next - Local::now();
            match remaining.to_std() {
                Ok(wait) if !wait.is_zero() => sleep(wait).await,
                _ => break,
            }
        }

        tracing::info!(scheduled_for = %next, "Birthday campaign triggered");
        match tokio::spawn(job()).await {
            Ok(Ok(summary)) => tracing::info!(
                total = summary.total,
                sent = summary.sent,
                failed = summary.failed,
                "Birthday job completed"
            ),
            Ok(Err(error)) => {
                tracing::error!(error.cause_chain = ?error, "Birthday job failed")
            }
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Birthday job panicked")
            }
        }

        last_fired = Some(next);
    }
}
