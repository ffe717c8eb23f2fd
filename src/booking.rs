//! The finalization pathway: a chosen slot, service and discount become a
//! priced appointment ready to be booked.

use sqlx::SqlitePool;

use crate::{
    error::{BookingError, Result},
    models::{Appointment, Level, NewAppointment},
    pricing::{NegativePricePolicy, ServiceType},
    repo::{appointments, discounts, users},
    schedule::Interval,
    validation::{check_date, check_id, check_number, check_optional_string, PRICE_RANGE},
};

/// Raw booking form fields.
#[derive(Debug, Clone, Default)]
pub struct BookingRequest<'a> {
    pub customer_id: &'a str,
    pub hairdresser_id: &'a str,
    pub start: &'a str,
    pub service: &'a str,
    pub comments: Option<&'a str>,
    pub discount: Option<&'a str>,
}

pub async fn finalize(
    pool: &SqlitePool,
    request: &BookingRequest<'_>,
    policy: NegativePricePolicy,
) -> Result<NewAppointment> {
    let customer_id = check_id(request.customer_id, "customer")?;
    let hairdresser_id = check_id(request.hairdresser_id, "hairdresser")?;
    let slot = Interval::slot(check_date(request.start, "appointment datetime")?);
    let service = ServiceType::parse(request.service)?;

    users::get(pool, &customer_id).await?;
    let hairdresser = users::get(pool, &hairdresser_id).await?;
    if hairdresser.level != Level::Hairdresser {
        return Err(BookingError::not_found("hairdresser", "id", hairdresser_id));
    }

    let price = discounts::compute_price(pool, service.keyword(), request.discount, policy).await?;

    Ok(NewAppointment {
        customer_id,
        hairdresser_id,
        start_time: slot.start,
        end_time: slot.end,
        service: service.keyword().to_string(),
        comments: check_optional_string(request.comments),
        price: check_number(price, PRICE_RANGE, "price")?,
    })
}

/// Finalizes and books in one go; fails with `SlotTaken` if the hour is gone.
pub async fn finalize_and_book(
    pool: &SqlitePool,
    request: &BookingRequest<'_>,
    policy: NegativePricePolicy,
) -> Result<Appointment> {
    let appointment = finalize(pool, request, policy).await?;
    appointments::book(pool, &appointment).await
}
