use std::time::{Duration, Instant};

use chrono::{Datelike, Local};
use claims::{assert_err, assert_ok};
use reqwest::StatusCode;
use wiremock::matchers::{any, body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use birthday_mailer::birthdays::find_todays_birthdays;
use birthday_mailer::campaign::{CampaignError, CampaignSummary};

use crate::helpers::{date, email_accepted, App};

fn summary(total: usize, sent: usize, failed: usize) -> CampaignSummary {
    CampaignSummary {
        total,
        sent,
        failed,
    }
}

#[tokio::test]
async fn only_users_born_on_the_same_month_and_day_are_greeted() {
    let app = App::new().await;
    app.add_user("Ana", "ana@example.com", date(1990, 3, 15)).await;
    app.add_user("Ben", "ben@example.com", date(1985, 3, 15)).await;
    app.add_user("Cid", "cid@example.com", date(2000, 3, 16)).await;

    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(email_accepted())
        .expect(2)
        .mount(&app.email_server)
        .await;

    let result = app.campaign.run_on(date(2024, 3, 15)).await;

    assert_eq!(assert_ok!(result), summary(2, 2, 0));
    let mut recipients = app.email_recipients().await;
    recipients.sort();
    assert_eq!(recipients, ["ana@example.com", "ben@example.com"]);
}

#[tokio::test]
async fn no_birthdays_means_an_empty_summary_and_no_emails() {
    let app = App::new().await;
    app.add_user("Cid", "cid@example.com", date(2000, 3, 16)).await;

    Mock::given(any())
        .respond_with(email_accepted())
        .expect(0)
        .mount(&app.email_server)
        .await;

    let result = app.campaign.run_on(date(2024, 3, 15)).await;

    assert_eq!(assert_ok!(result), summary(0, 0, 0));
}

#[tokio::test]
async fn a_run_where_every_send_fails_still_completes() {
    let app = App::new().await;
    app.add_user("Ana", "ana@example.com", date(1990, 3, 15)).await;
    app.add_user("Ben", "ben@example.com", date(1985, 3, 15)).await;
    app.add_user("Dee", "dee@example.com", date(1970, 3, 15)).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&app.email_server)
        .await;

    let result = app.campaign.run_on(date(2024, 3, 15)).await;

    assert_eq!(assert_ok!(result), summary(3, 0, 3));
}

#[tokio::test]
async fn one_failed_delivery_does_not_prevent_the_others() {
    let app = App::new().await;
    app.add_user("Ana", "ana@example.com", date(1990, 3, 15)).await;
    app.add_user("Ben", "ben@example.com", date(1985, 3, 15)).await;
    app.add_user("Dee", "dee@example.com", date(1970, 3, 15)).await;

    // Mounted first, so it wins over the catch-all below for Ben's request.
    Mock::given(body_string_contains("ben@example.com"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(any())
        .respond_with(email_accepted())
        .expect(2)
        .mount(&app.email_server)
        .await;

    let result = app.campaign.run_on(date(2024, 3, 15)).await;

    assert_eq!(assert_ok!(result), summary(3, 2, 1));
}

#[tokio::test]
async fn a_stored_invalid_email_counts_as_a_failed_delivery() {
    let app = App::new().await;
    app.add_user("Ana", "ana@example.com", date(1990, 3, 15)).await;
    app.add_user("Eve", "not-an-email", date(1993, 3, 15)).await;

    Mock::given(any())
        .respond_with(email_accepted())
        .expect(1)
        .mount(&app.email_server)
        .await;

    let result = app.campaign.run_on(date(2024, 3, 15)).await;

    assert_eq!(assert_ok!(result), summary(2, 1, 1));
}

#[tokio::test]
async fn dispatches_are_in_flight_at_the_same_time() {
    let app = App::new().await;
    app.add_user("Ana", "ana@example.com", date(1990, 3, 15)).await;
    app.add_user("Ben", "ben@example.com", date(1985, 3, 15)).await;
    app.add_user("Dee", "dee@example.com", date(1970, 3, 15)).await;

    Mock::given(path("/email"))
        .respond_with(email_accepted().set_delay(Duration::from_secs(1)))
        .expect(3)
        .mount(&app.email_server)
        .await;

    let started = Instant::now();
    let result = app.campaign.run_on(date(2024, 3, 15)).await;
    let elapsed = started.elapsed();

    assert_eq!(assert_ok!(result), summary(3, 3, 0));
    // Sequential sends would take at least three seconds.
    assert!(
        elapsed < Duration::from_secs(2),
        "campaign took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn a_data_access_failure_fails_the_whole_run() {
    let app = App::new().await;
    app.add_user("Ana", "ana@example.com", date(1990, 3, 15)).await;

    Mock::given(any())
        .respond_with(email_accepted())
        .expect(0)
        .mount(&app.email_server)
        .await;

    app.pool.close().await;
    let result = app.campaign.run_on(date(2024, 3, 15)).await;

    let error = assert_err!(result);
    assert!(matches!(error, CampaignError::DataAccess(_)));
}

#[tokio::test]
async fn running_twice_on_the_same_day_greets_the_same_users_twice() {
    let app = App::new().await;
    app.add_user("Ana", "ana@example.com", date(1990, 3, 15)).await;

    Mock::given(any())
        .respond_with(email_accepted())
        .expect(2)
        .mount(&app.email_server)
        .await;

    let first = app.campaign.run_on(date(2024, 3, 15)).await;
    let second = app.campaign.run_on(date(2024, 3, 15)).await;

    assert_eq!(assert_ok!(first), summary(1, 1, 0));
    assert_eq!(assert_ok!(second), summary(1, 1, 0));
}

#[tokio::test]
async fn the_test_endpoint_runs_todays_campaign() {
    let app = App::new().await;
    let today = Local::now().date_naive();
    // 2000 is a leap year, so this is valid even on 29 February.
    let born = today.with_year(2000).unwrap();
    app.add_user("Ana", "ana@example.com", born).await;

    Mock::given(any())
        .respond_with(email_accepted())
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.get_test_birthday_emails().await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Birthday check completed");
    assert_eq!(
        body["result"],
        serde_json::json!({ "total": 1, "sent": 1, "failed": 0 })
    );
}

#[tokio::test]
async fn dropping_a_spawned_run_does_not_cancel_its_deliveries() {
    let app = App::new().await;
    let born = Local::now().date_naive().with_year(2000).unwrap();
    app.add_user("Ana", "ana@example.com", born).await;

    Mock::given(any())
        .respond_with(email_accepted())
        .expect(1)
        .mount(&app.email_server)
        .await;

    drop(app.campaign.spawn_run());

    let mut recipients = Vec::new();
    for _ in 0..50 {
        recipients = app.email_recipients().await;
        if !recipients.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(recipients, ["ana@example.com"]);
}

#[tokio::test]
async fn the_test_endpoint_returns_500_when_the_store_is_unavailable() {
    let app = App::new().await;

    app.pool.close().await;
    let response = app.get_test_birthday_emails().await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn todays_birthdays_are_matched_against_the_local_date() {
    let app = App::new().await;
    let today = Local::now().date_naive();
    let born = today.with_year(2000).unwrap();
    let not_born_today = today.succ_opt().unwrap().with_year(2000).unwrap();
    app.add_user("Ana", "ana@example.com", born).await;
    app.add_user("Ben", "ben@example.com", not_born_today).await;

    let users = assert_ok!(find_todays_birthdays(&app.pool).await);

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "ana@example.com");
    assert_eq!(users[0].date_of_birth, born);
}
