//! Runs today's birthday campaign once and exits.
//!
//! Shares the campaign with the server's daily trigger, so running it on a
//! day the trigger already fired greets the same users again.

use std::process::ExitCode;

use anyhow::Context;

use birthday_mailer::campaign::CampaignSummary;
use birthday_mailer::configuration::get_configuration;
use birthday_mailer::startup::get_app_state;
use birthday_mailer::telemetry::{get_subscriber, initialize_subscriber};

#[tokio::main]
async fn main() -> ExitCode {
    let subscriber = get_subscriber(
        "send_birthday_emails".into(),
        "info".into(),
        std::io::stdout,
    );
    initialize_subscriber(subscriber);

    tracing::info!("Manually triggering birthday check");
    match send_birthday_emails().await {
        Ok(summary) => {
            tracing::info!(
                total = summary.total,
                sent = summary.sent,
                failed = summary.failed,
                "Birthday check completed"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(error.cause_chain = ?error, "Birthday check failed");
            ExitCode::FAILURE
        }
    }
}

async fn send_birthday_emails() -> Result<CampaignSummary, anyhow::Error> {
    let configuration = get_configuration().context("Failed to read configuration")?;
    let app_state = get_app_state(&configuration)?;

    app_state
        .campaign
        .run()
        .await
        .context("Birthday campaign failed")
}
