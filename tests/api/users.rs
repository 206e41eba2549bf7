use reqwest::StatusCode;

use crate::helpers::{date, App};

#[tokio::test]
async fn register_returns_201_for_valid_data() {
    let app = App::new().await;
    let body = serde_json::json!({
        "username": "arine",
        "email": "peppydays@gmail.com",
        "dateOfBirth": "1990-03-15",
    });

    let response = app.post_users(&body).await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let created: serde_json::Value = response.json().await.unwrap();
    assert_eq!(created["username"], "arine");
    assert_eq!(created["dateOfBirth"], "1990-03-15");

    let saved: (String, String, chrono::NaiveDate) =
        sqlx::query_as("SELECT username, email, date_of_birth FROM users")
            .fetch_one(&app.pool)
            .await
            .unwrap();

    assert_eq!(saved.0, "arine");
    assert_eq!(saved.1, "peppydays@gmail.com");
    assert_eq!(saved.2, date(1990, 3, 15));
}

#[tokio::test]
async fn register_returns_422_when_some_attributes_in_request_are_missing() {
    let app = App::new().await;
    let test_cases = [
        serde_json::json!({ "username": "arine", "email": "peppydays@gmail.com" }),
        serde_json::json!({ "email": "peppydays@gmail.com", "dateOfBirth": "1990-03-15" }),
        serde_json::json!({ "username": "arine", "dateOfBirth": "1990-03-15" }),
    ];

    for test_case in test_cases {
        let response = app.post_users(&test_case).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn register_returns_400_when_fields_are_present_but_invalid() {
    let app = App::new().await;
    let test_cases = [
        ("arine", "", "1990-03-15"),
        ("a", "peppydays@gmail.com", "1990-03-15"),
        ("arine", "definitely-not-an-email", "1990-03-15"),
        ("arine", "peppydays@gmail.com", "15/03/1990"),
        ("arine", "peppydays@gmail.com", "2999-01-01"),
    ];

    for (username, email, date_of_birth) in test_cases {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "dateOfBirth": date_of_birth,
        });
        let response = app.post_users(&body).await;

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "{} / {} / {} should be rejected",
            username,
            email,
            date_of_birth
        );
    }
}

#[tokio::test]
async fn register_returns_409_when_the_email_already_exists() {
    let app = App::new().await;
    let body = serde_json::json!({
        "username": "arine",
        "email": "peppydays@gmail.com",
        "dateOfBirth": "1990-03-15",
    });

    app.post_users(&body).await.error_for_status().unwrap();
    let response = app.post_users(&body).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: serde_json::Value = response.json().await.unwrap();
    assert_eq!(error["message"], "Email already exists");
}

#[tokio::test]
async fn register_returns_409_when_the_email_differs_only_in_case() {
    let app = App::new().await;
    let first = serde_json::json!({
        "username": "arine",
        "email": "PeppyDays@Gmail.com",
        "dateOfBirth": "1990-03-15",
    });
    let second = serde_json::json!({
        "username": "another arine",
        "email": "peppydays@gmail.com",
        "dateOfBirth": "1991-04-16",
    });

    let created = app.post_users(&first).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let user: serde_json::Value = created.json().await.unwrap();
    assert_eq!(user["email"], "peppydays@gmail.com");

    let response = app.post_users(&second).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn registered_users_are_listed() {
    let app = App::new().await;
    app.add_user("ana", "ana@example.com", date(1990, 3, 15)).await;
    app.add_user("ben", "ben@example.com", date(1985, 7, 1)).await;

    let response = app.get_users().await;

    assert_eq!(response.status(), StatusCode::OK);
    let listing: serde_json::Value = response.json().await.unwrap();
    assert_eq!(listing["count"], 2);
    assert_eq!(listing["users"][0]["email"], "ana@example.com");
    assert_eq!(listing["users"][1]["email"], "ben@example.com");
}
