use anyhow::Context;
use tokio::net::TcpListener;

use birthday_mailer::configuration::get_configuration;
use birthday_mailer::scheduler::DailyTrigger;
use birthday_mailer::startup::{get_app_state, run};
use birthday_mailer::telemetry::{get_subscriber, initialize_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("birthday_mailer".into(), "info".into(), std::io::stdout);
    initialize_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration")?;
    let schedule = configuration
        .scheduler
        .schedule()
        .context("Invalid birthday campaign schedule")?;
    let app_state = get_app_state(&configuration)?;

    sqlx::migrate!("./migrations")
        .run(&app_state.pool)
        .await
        .context("Failed to migrate the database")?;

    let campaign = app_state.campaign.clone();
    let trigger = DailyTrigger::new(schedule, move || {
        let campaign = campaign.clone();
        async move { campaign.run().await }
    });
    trigger.start();

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(
        address = %listener.local_addr()?,
        access_url = %configuration.application.access_url,
        "Server is running"
    );

    run(listener, app_state).await?;

    Ok(())
}
