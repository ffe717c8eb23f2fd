use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{BookingError, Result};

pub const LEVEL_USER: &str = "user";
pub const LEVEL_ADMIN: &str = "admin";
pub const LEVEL_HAIRDRESSER: &str = "hairdresser";

/// Access level of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    User,
    Admin,
    Hairdresser,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::User => LEVEL_USER,
            Level::Admin => LEVEL_ADMIN,
            Level::Hairdresser => LEVEL_HAIRDRESSER,
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            LEVEL_USER => Ok(Level::User),
            LEVEL_ADMIN => Ok(Level::Admin),
            LEVEL_HAIRDRESSER => Ok(Level::Hairdresser),
            other => Err(BookingError::InvalidLevel(other.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    /// Plaintext; hashed by the repository before it is stored.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub appointment_ids: Vec<String>,
    pub review_ids: Vec<String>,
    pub job: String,
    pub biography: String,
    pub level: Level,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub appointment_ids: Vec<String>,
    pub review_ids: Vec<String>,
    pub job: String,
    pub biography: String,
    pub level: Level,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub customer_id: String,
    pub hairdresser_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub service: String,
    pub comments: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub customer_id: String,
    pub hairdresser_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub service: String,
    pub comments: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub poster_id: String,
    pub hairdresser_id: String,
    pub body: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub poster_id: String,
    pub hairdresser_id: String,
    pub body: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDiscount {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discount {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub appointment_ids: String,
    pub review_ids: String,
    pub job: String,
    pub biography: String,
    pub level: String,
}

impl TryFrom<UserRow> for User {
    type Error = BookingError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            level: Level::parse(&row.level)?,
            appointment_ids: decode_ids(&row.appointment_ids),
            review_ids: decode_ids(&row.review_ids),
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            job: row.job,
            biography: row.biography,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppointmentRow {
    pub id: String,
    pub customer_id: String,
    pub hairdresser_id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub service: String,
    pub comments: String,
    pub price: f64,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = BookingError;

    fn try_from(row: AppointmentRow) -> Result<Self> {
        Ok(Appointment {
            start_time: from_millis(row.start_time, "start time")?,
            end_time: from_millis(row.end_time, "end time")?,
            id: row.id,
            customer_id: row.customer_id,
            hairdresser_id: row.hairdresser_id,
            service: row.service,
            comments: row.comments,
            price: row.price,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: String,
    pub poster_id: String,
    pub hairdresser_id: String,
    pub body: String,
    pub rating: f64,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            poster_id: row.poster_id,
            hairdresser_id: row.hairdresser_id,
            body: row.body,
            rating: row.rating,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscountRow {
    pub id: String,
    pub name: String,
    pub amount: f64,
}

impl From<DiscountRow> for Discount {
    fn from(row: DiscountRow) -> Self {
        Discount {
            id: row.id,
            name: row.name,
            amount: row.amount,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub kind: String,
    pub message: String,
    pub created_at: String,
}

// A malformed column degrades to an empty list rather than hiding the user.
fn decode_ids(raw: &str) -> Vec<String> {
    match serde_json::from_str(raw) {
        Ok(ids) => ids,
        Err(err) => {
            log::warn!("Malformed reference list {raw:?}: {err}");
            Vec::new()
        }
    }
}

pub(crate) fn from_millis(millis: i64, field: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| BookingError::InvalidDate {
        field: field.to_string(),
        value: millis.to_string(),
    })
}
