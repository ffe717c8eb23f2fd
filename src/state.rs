use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::{
    booking::{self, BookingRequest},
    config::Config,
    db,
    error::Result,
    models::{Appointment, NewAppointment},
    repo::{appointments, discounts},
};

/// Pool plus settings, shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Connects and migrates.
    pub async fn connect(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = db::connect(&config).await?;
        db::run_migrations(&pool).await?;
        Ok(Self::new(pool, config))
    }

    pub async fn log_activity(&self, kind: &str, message: &str, user_id: Option<&str>) {
        db::log_activity(&self.db, kind, message, user_id, self.config.activity_retention).await;
    }

    pub async fn price(&self, service: &str, discount_name: Option<&str>) -> Result<f64> {
        discounts::compute_price(&self.db, service, discount_name, self.config.negative_price).await
    }

    pub async fn appointments_on(&self, day: NaiveDate) -> Result<Vec<Appointment>> {
        appointments::find_on_day(&self.db, day, self.config.utc_offset).await
    }

    /// Appointments on the salon-local day named by `raw`.
    pub async fn appointments_on_date(&self, raw: &str) -> Result<Vec<Appointment>> {
        let day = appointments::parse_day(raw, self.config.utc_offset)?;
        self.appointments_on(day).await
    }

    pub async fn open_slots(
        &self,
        hairdresser_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<DateTime<Utc>>> {
        appointments::open_slots(
            &self.db,
            hairdresser_id,
            day,
            &self.config.hours,
            self.config.utc_offset,
        )
        .await
    }

    pub async fn finalize(&self, request: &BookingRequest<'_>) -> Result<NewAppointment> {
        booking::finalize(&self.db, request, self.config.negative_price).await
    }

    pub async fn book(&self, request: &BookingRequest<'_>) -> Result<Appointment> {
        let booked =
            booking::finalize_and_book(&self.db, request, self.config.negative_price).await;
        let appointment = match booked {
            Ok(appointment) => appointment,
            Err(err) if err.is_validation() => {
                log::debug!("Booking request rejected: {err}");
                return Err(err);
            }
            Err(err) => {
                log::warn!("Booking with hairdresser {} failed: {err}", request.hairdresser_id);
                return Err(err);
            }
        };
        self.log_activity(
            "appointment_booked",
            &format!(
                "Appointment {} booked with hairdresser {} at {}.",
                appointment.id, appointment.hairdresser_id, appointment.start_time
            ),
            Some(&appointment.customer_id),
        )
        .await;
        Ok(appointment)
    }
}
