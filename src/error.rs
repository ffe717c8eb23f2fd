use thiserror::Error;

pub type Result<T, E = BookingError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("invalid {entity} ID: {value:?}")]
    InvalidIdentifier { entity: String, value: String },

    #[error("{field} cannot be an empty string or string with just spaces")]
    EmptyField { field: String },

    #[error("{field} is ill-formed (expected: number between {min} and {max})")]
    OutOfRange { field: String, min: f64, max: f64 },

    #[error("provided {field} is invalid")]
    InvalidFormat { field: String },

    #[error("password {0}")]
    WeakPassword(&'static str),

    #[error("user level {0:?} is invalid (expected user, admin or hairdresser)")]
    InvalidLevel(String),

    #[error("provided {field} is not a valid date: {value:?}")]
    InvalidDate { field: String, value: String },

    #[error("user with email {0} already exists")]
    DuplicateEmail(String),

    #[error("either the email or password is invalid")]
    AuthenticationFailed,

    #[error("no {entity} found with {key} {value}")]
    NotFound {
        entity: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("update of {0} was not applied")]
    UpdateFailed(String),

    #[error("adding {entity} {id} to {party} {party_id} failed")]
    LinkageFailed {
        entity: &'static str,
        id: String,
        party: &'static str,
        party_id: String,
    },

    #[error("appointment time already taken")]
    SlotTaken,

    #[error("{0} insert failed")]
    InsertFailed(&'static str),

    #[error("unknown service {0:?}")]
    UnknownService(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
}

impl BookingError {
    pub(crate) fn not_found(
        entity: &'static str,
        key: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            entity,
            key,
            value: value.into(),
        }
    }

    /// True for failures caused by caller input rather than the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::EmptyField { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidFormat { .. }
                | Self::WeakPassword(_)
                | Self::InvalidLevel(_)
                | Self::InvalidDate { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_failures_are_validation_errors() {
        let input = [
            BookingError::EmptyField {
                field: "body".to_string(),
            },
            BookingError::WeakPassword("cannot contain spaces"),
            BookingError::InvalidDate {
                field: "start timestamp".to_string(),
                value: "tomorrow".to_string(),
            },
        ];
        assert!(input.iter().all(BookingError::is_validation));
    }

    #[test]
    fn store_and_booking_failures_are_not() {
        let other = [
            BookingError::SlotTaken,
            BookingError::AuthenticationFailed,
            BookingError::not_found("user", "id", "x"),
            BookingError::Storage(sqlx::Error::RowNotFound),
        ];
        assert!(!other.iter().any(BookingError::is_validation));
    }
}
