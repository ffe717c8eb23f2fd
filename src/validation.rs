//! Input checks that turn raw form values into well-formed records.
//!
//! Nothing here touches the store. Each check either returns the normalized
//! value or fails with the first problem it finds.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::{
    error::{BookingError, Result},
    models::{Level, LoginAttempt, NewAppointment, NewDiscount, NewReview, NewUser},
};

pub const RATING_RANGE: RangeInclusive<f64> = 1.0..=5.0;
pub const DISCOUNT_RANGE: RangeInclusive<f64> = 1.0..=25.0;
pub const PRICE_RANGE: RangeInclusive<f64> = f64::MIN..=f64::MAX;
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email pattern compiles")
});

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

pub fn check_string(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::EmptyField {
            field: field.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

pub fn check_optional_string(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Trims and checks an identifier, returning it in canonical form.
pub fn check_id(value: &str, entity: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::InvalidIdentifier {
            entity: entity.to_string(),
            value: value.to_string(),
        });
    }
    Uuid::parse_str(trimmed)
        .map(|id| id.to_string())
        .map_err(|_| BookingError::InvalidIdentifier {
            entity: entity.to_string(),
            value: trimmed.to_string(),
        })
}

pub fn check_number(value: f64, range: RangeInclusive<f64>, field: &str) -> Result<f64> {
    if !value.is_finite() || !range.contains(&value) {
        return Err(BookingError::OutOfRange {
            field: field.to_string(),
            min: *range.start(),
            max: *range.end(),
        });
    }
    Ok(value)
}

/// Parses a form value as a number; unparsable input counts as out of range.
pub fn parse_number(value: &str, range: RangeInclusive<f64>, field: &str) -> Result<f64> {
    let parsed = value.trim().parse::<f64>().unwrap_or(f64::NAN);
    check_number(parsed, range, field)
}

pub fn check_email(value: &str, field: &str) -> Result<String> {
    let email = check_string(value, field)?.to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(BookingError::InvalidFormat {
            field: field.to_string(),
        });
    }
    Ok(email)
}

pub fn check_password(value: &str) -> Result<String> {
    let password = value.trim();
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BookingError::WeakPassword(
            "cannot be shorter than 6 characters",
        ));
    }
    if password.chars().any(char::is_whitespace) {
        return Err(BookingError::WeakPassword("cannot contain spaces"));
    }
    Ok(password.to_string())
}

pub fn check_level(value: &str) -> Result<Level> {
    Level::parse(value.trim())
}

/// Accepts RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]` (read as UTC) or epoch milliseconds.
///
/// A bare date is midnight UTC.
pub fn check_date(value: &str, field: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    let invalid = || BookingError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN).and_utc());
    }
    if let Ok(millis) = trimmed.parse::<f64>() {
        if millis.is_finite() && millis.fract() == 0.0 {
            return DateTime::from_timestamp_millis(millis as i64).ok_or_else(invalid);
        }
    }
    Err(invalid())
}

pub fn validate_appointment(
    customer_id: &str,
    hairdresser_id: &str,
    start_time: &str,
    end_time: &str,
    service: &str,
    comments: Option<&str>,
    price: &str,
) -> Result<NewAppointment> {
    let customer_id = check_id(customer_id, "customer")?;
    let hairdresser_id = check_id(hairdresser_id, "hairdresser")?;
    let start_time = check_date(start_time, "start timestamp")?;
    let end_time = check_date(end_time, "end timestamp")?;
    if end_time <= start_time {
        return Err(BookingError::InvalidDate {
            field: "end timestamp".to_string(),
            value: end_time.to_rfc3339(),
        });
    }

    Ok(NewAppointment {
        customer_id,
        hairdresser_id,
        start_time,
        end_time,
        service: check_string(service, "service")?,
        comments: check_optional_string(comments),
        price: parse_number(price, PRICE_RANGE, "price")?,
    })
}

pub fn validate_review(
    poster_id: &str,
    hairdresser_id: &str,
    body: &str,
    rating: &str,
) -> Result<NewReview> {
    Ok(NewReview {
        poster_id: check_id(poster_id, "poster")?,
        hairdresser_id: check_id(hairdresser_id, "hairdresser")?,
        body: check_string(body, "body")?,
        rating: parse_number(rating, RATING_RANGE, "rating")?,
    })
}

/// Raw signup or admin form fields for a user.
#[derive(Debug, Clone, Default)]
pub struct UserInput<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub appointment_ids: &'a [&'a str],
    pub review_ids: &'a [&'a str],
    pub job: Option<&'a str>,
    pub biography: Option<&'a str>,
    pub level: Option<&'a str>,
}

pub fn validate_user(input: &UserInput<'_>) -> Result<NewUser> {
    let email = check_email(input.email, "user email")?;
    let password = check_password(input.password)?;
    let first_name = check_string(input.first_name, "first name")?;
    let last_name = check_string(input.last_name, "last name")?;
    let appointment_ids = input
        .appointment_ids
        .iter()
        .map(|id| check_id(id, "appointment"))
        .collect::<Result<Vec<_>>>()?;
    let review_ids = input
        .review_ids
        .iter()
        .map(|id| check_id(id, "review"))
        .collect::<Result<Vec<_>>>()?;
    let level = match input.level {
        Some(level) => check_level(level)?,
        None => Level::User,
    };

    Ok(NewUser {
        email,
        password,
        first_name,
        last_name,
        appointment_ids,
        review_ids,
        job: check_optional_string(input.job),
        biography: check_optional_string(input.biography),
        level,
    })
}

pub fn validate_login_attempt(email: &str, password: &str) -> Result<LoginAttempt> {
    Ok(LoginAttempt {
        email: check_email(email, "user email")?,
        password: check_password(password)?,
    })
}

pub fn validate_discount(name: &str, amount: &str) -> Result<NewDiscount> {
    Ok(NewDiscount {
        name: check_string(name, "discount")?,
        amount: parse_number(amount, DISCOUNT_RANGE, "amount")?,
    })
}
