//! Store access for the four entity tables.
//!
//! List queries return a possibly-empty sequence (`find_*`). The `get_*`
//! variants run the same query and treat an empty result as `NotFound`.

pub mod appointments;
pub mod discounts;
pub mod reviews;
pub mod users;

use crate::error::{BookingError, Result};

pub fn require_any<T>(
    items: Vec<T>,
    entity: &'static str,
    key: &'static str,
    value: &str,
) -> Result<Vec<T>> {
    if items.is_empty() {
        return Err(BookingError::not_found(entity, key, value));
    }
    Ok(items)
}

pub(crate) fn ensure_inserted(rows_affected: u64, entity: &'static str) -> Result<()> {
    if rows_affected == 0 {
        return Err(BookingError::InsertFailed(entity));
    }
    Ok(())
}
