use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// A registered user as read back from the store.
///
/// The email is kept as stored; it is validated again right before delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
}
