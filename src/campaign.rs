//! One end-to-end run: find today's birthdays, greet everyone concurrently,
//! count the outcomes.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::Instrument;

use crate::birthdays::find_birthdays_on;
use crate::email_client::EmailClient;
use crate::notifications::{send_birthday_notification, DispatchOutcome};
use crate::utils::error_chain_fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CampaignSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

impl CampaignSummary {
    pub fn from_outcomes(outcomes: &[DispatchOutcome]) -> Self {
        let sent = outcomes.iter().filter(|o| o.is_sent()).count();
        Self {
            total: outcomes.len(),
            sent,
            failed: outcomes.len() - sent,
        }
    }
}

#[derive(thiserror::Error)]
pub enum CampaignError {
    #[error("Failed to fetch the users whose birthday is today")]
    DataAccess(#[source] sqlx::Error),
    #[error("The birthday campaign did not run to completion")]
    Interrupted(#[source] JoinError),
}

impl Debug for CampaignError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Everything a campaign run needs. Cheap to clone; shared by the daily
/// trigger and the on-demand paths.
///
/// Runs are not deduplicated: running twice on the same day greets the
/// same users twice.
#[derive(Clone)]
pub struct BirthdayCampaign {
    pool: Pool<Postgres>,
    email_client: Arc<EmailClient>,
}

impl BirthdayCampaign {
    pub fn new(pool: Pool<Postgres>, email_client: Arc<EmailClient>) -> Self {
        Self { pool, email_client }
    }

    pub async fn run(&self) -> Result<CampaignSummary, CampaignError> {
        self.run_on(Local::now().date_naive()).await
    }

    /// Runs today's campaign on its own task. Dropping the handle detaches
    /// the run instead of cancelling it, so deliveries already in flight
    /// are never abandoned halfway.
    pub fn spawn_run(&self) -> JoinHandle<Result<CampaignSummary, CampaignError>> {
        let campaign = self.clone();
        tokio::spawn(async move { campaign.run().await }.in_current_span())
    }

    #[tracing::instrument(name = "Running the birthday campaign", skip(self))]
    pub async fn run_on(&self, date: NaiveDate) -> Result<CampaignSummary, CampaignError> {
        let users = find_birthdays_on(&self.pool, date)
            .await
            .map_err(CampaignError::DataAccess)?;

        if users.is_empty() {
            tracing::info!("No birthdays today");
            return Ok(CampaignSummary::default());
        }
        tracing::info!(count = users.len(), "Found birthday(s) today");

        let mut dispatches = JoinSet::new();
        for user in users {
            let email_client = Arc::clone(&self.email_client);
            dispatches.spawn(
                async move {
                    send_birthday_notification(&email_client, &user.email, &user.username).await
                }
                .in_current_span(),
            );
        }

        let mut outcomes = Vec::with_capacity(dispatches.len());
        while let Some(joined) = dispatches.join_next().await {
            let outcome = joined.unwrap_or_else(|error| {
                tracing::error!(error.cause_chain = ?error, "Birthday dispatch task did not complete");
                DispatchOutcome::Failed {
                    error: error.to_string(),
                }
            });
            outcomes.push(outcome);
        }

        let summary = CampaignSummary::from_outcomes(&outcomes);
        tracing::info!(
            total = summary.total,
            sent = summary.sent,
            failed = summary.failed,
            "Birthday campaign finished"
        );

        Ok(summary)
    }
}
