//! Selects the users whose birthday falls on a given calendar day.

use chrono::{Datelike, Local, NaiveDate};
use sqlx::{Pool, Postgres};

use crate::domain::User;

/// Users born on the host's current local month and day, any year.
///
/// "Today" is evaluated on every call, so a long-running process picks up
/// date changes without restarting.
pub async fn find_todays_birthdays(pool: &Pool<Postgres>) -> Result<Vec<User>, sqlx::Error> {
    find_birthdays_on(pool, Local::now().date_naive()).await
}

/// Users whose date of birth has the same month and day as `date`.
///
/// The birth year is ignored. Users born on 29 February only match in leap years.
#[tracing::instrument(
    name = "Finding users with a birthday",
    skip(pool),
    fields(month = date.month(), day = date.day())
)]
pub async fn find_birthdays_on(
    pool: &Pool<Postgres>,
    date: NaiveDate,
) -> Result<Vec<User>, sqlx::Error> {
    let (month, day) = month_and_day(date);

    sqlx::query_as::<_, User>(
        r#"
            SELECT id, username, email, date_of_birth
            FROM users
            WHERE EXTRACT(MONTH FROM date_of_birth)::INT = $1
              AND EXTRACT(DAY FROM date_of_birth)::INT = $2
            ORDER BY created_at
        "#,
    )
    .bind(month)
    .bind(day)
    .fetch_all(pool)
    .await
    .map_err(|error| {
        tracing::error!("Failed to execute query: {:?}", error);
        error
    })
}

fn month_and_day(date: NaiveDate) -> (i32, i32) {
    (date.month() as i32, date.day() as i32)
}
