use std::fmt::Debug;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::domain::{DateOfBirth, NewUser, User, UserEmail, UserName};
use crate::routes::ErrorBody;
use crate::utils::error_chain_fmt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    username: String,
    email: String,
    date_of_birth: String,
}

impl TryFrom<UserData> for NewUser {
    type Error = UserError;

    fn try_from(data: UserData) -> Result<Self, Self::Error> {
        let today = Local::now().date_naive();
        let name = UserName::parse(data.username).map_err(UserError::ValidationError)?;
        let email = UserEmail::parse(data.email).map_err(UserError::ValidationError)?;
        let date_of_birth =
            DateOfBirth::parse(&data.date_of_birth, today).map_err(UserError::ValidationError)?;

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            date_of_birth,
        })
    }
}

#[tracing::instrument(
    name = "Registering a new user",
    skip(body, pool),
    fields(
        user_email = %body.email,
        user_name = %body.username
    ),
)]
pub async fn register_user(
    State(pool): State<Pool<Postgres>>,
    Json(body): Json<UserData>,
) -> Result<(StatusCode, Json<User>), UserError> {
    let new_user: NewUser = body.try_into()?;

    let user = insert_user(&pool, &new_user).await.map_err(|error| {
        let is_duplicate = error
            .as_database_error()
            .is_some_and(|e| e.is_unique_violation());

        if is_duplicate {
            UserError::DuplicateEmail(error)
        } else {
            UserError::UnexpectedError(
                anyhow::Error::new(error).context("Failed to insert new user in the database"),
            )
        }
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Serialize)]
pub struct UsersResponse {
    count: usize,
    users: Vec<User>,
}

#[tracing::instrument(name = "Listing registered users", skip(pool))]
pub async fn list_users(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<UsersResponse>, UserError> {
    let users = get_all_users(&pool)
        .await
        .context("Failed to retrieve users")?;

    Ok(Json(UsersResponse {
        count: users.len(),
        users,
    }))
}

#[tracing::instrument(name = "Saving new user details in the database", skip(pool, new_user))]
pub async fn insert_user(pool: &Pool<Postgres>, new_user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (id, username, email, date_of_birth, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, date_of_birth
        "#,
    )
    .bind(new_user.id)
    .bind(new_user.name.as_ref())
    .bind(new_user.email.as_ref())
    .bind(new_user.date_of_birth.date())
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|error| {
        tracing::error!("Failed to execute query: {:?}", error);
        error
    })
}

#[tracing::instrument(name = "Get all users", skip(pool))]
pub async fn get_all_users(pool: &Pool<Postgres>) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"SELECT id, username, email, date_of_birth FROM users ORDER BY created_at"#,
    )
    .fetch_all(pool)
    .await
}

#[derive(thiserror::Error)]
pub enum UserError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Email already exists")]
    DuplicateEmail(#[source] sqlx::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            UserError::ValidationError(_) => StatusCode::BAD_REQUEST,
            UserError::DuplicateEmail(_) => StatusCode::CONFLICT,
            UserError::UnexpectedError(_) => {
                tracing::error!("{:?}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorBody::new(&self))).into_response()
    }
}
