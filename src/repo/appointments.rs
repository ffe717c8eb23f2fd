use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    auth::new_id,
    error::{BookingError, Result},
    models::{Appointment, AppointmentRow, NewAppointment},
    repo::{ensure_inserted, require_any, users},
    schedule::{day_window, first_conflict, free_slots, BusinessHours, Interval},
    validation::{check_date, check_id},
};

const APPOINTMENT_COLUMNS: &str =
    "id, customer_id, hairdresser_id, start_time, end_time, service, comments, price";

fn collect(rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>> {
    rows.into_iter().map(Appointment::try_from).collect()
}

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Appointment>> {
    let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY rowid"
    ))
    .fetch_all(pool)
    .await?;
    collect(rows)
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Appointment> {
    let id = check_id(id, "appointment")?;
    let row = sqlx::query_as::<_, AppointmentRow>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Err(BookingError::not_found("appointment", "id", id)),
    }
}

pub async fn find_by_customer(pool: &SqlitePool, customer_id: &str) -> Result<Vec<Appointment>> {
    let customer_id = check_id(customer_id, "customer")?;
    let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE customer_id = ? ORDER BY start_time, rowid"
    ))
    .bind(&customer_id)
    .fetch_all(pool)
    .await?;
    collect(rows)
}

pub async fn get_by_customer(pool: &SqlitePool, customer_id: &str) -> Result<Vec<Appointment>> {
    let found = find_by_customer(pool, customer_id).await?;
    require_any(found, "appointment", "customer id", customer_id.trim())
}

pub async fn find_by_hairdresser(
    pool: &SqlitePool,
    hairdresser_id: &str,
) -> Result<Vec<Appointment>> {
    let hairdresser_id = check_id(hairdresser_id, "hairdresser")?;
    let mut conn = pool.acquire().await?;
    hairdresser_schedule(&mut conn, &hairdresser_id).await
}

pub async fn get_by_hairdresser(
    pool: &SqlitePool,
    hairdresser_id: &str,
) -> Result<Vec<Appointment>> {
    let found = find_by_hairdresser(pool, hairdresser_id).await?;
    require_any(found, "appointment", "hairdresser id", hairdresser_id.trim())
}

async fn hairdresser_schedule(
    conn: &mut SqliteConnection,
    hairdresser_id: &str,
) -> Result<Vec<Appointment>> {
    let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE hairdresser_id = ? ORDER BY start_time, rowid"
    ))
    .bind(hairdresser_id)
    .fetch_all(&mut *conn)
    .await?;
    collect(rows)
}

/// Appointments starting on the salon-local calendar `day`.
pub async fn find_on_day(
    pool: &SqlitePool,
    day: NaiveDate,
    offset: FixedOffset,
) -> Result<Vec<Appointment>> {
    let window = day_window(day, offset);
    let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE start_time >= ? AND start_time < ?
         ORDER BY start_time, rowid"
    ))
    .bind(window.start.timestamp_millis())
    .bind(window.end.timestamp_millis())
    .fetch_all(pool)
    .await?;
    collect(rows)
}

pub async fn get_on_day(
    pool: &SqlitePool,
    day: NaiveDate,
    offset: FixedOffset,
) -> Result<Vec<Appointment>> {
    let found = find_on_day(pool, day, offset).await?;
    require_any(found, "appointment", "date", &day.to_string())
}

/// Reads a bare `YYYY-MM-DD` or any datetime [`check_date`] accepts as a salon-local day.
pub fn parse_day(raw: &str, offset: FixedOffset) -> Result<NaiveDate> {
    if let Ok(day) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        return Ok(day);
    }
    Ok(check_date(raw, "appointment date")?
        .with_timezone(&offset)
        .date_naive())
}

/// Fails with `SlotTaken` if `[start, end)` collides with any of the hairdresser's bookings.
///
/// Nothing holds the schedule between this check and a later [`create`]; two
/// callers can both pass and both insert. Use [`book`] when that matters.
pub async fn check_overlap(
    pool: &SqlitePool,
    hairdresser_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<()> {
    let hairdresser_id = check_id(hairdresser_id, "hairdresser")?;
    let mut conn = pool.acquire().await?;
    ensure_free(&mut conn, &hairdresser_id, &Interval::new(start, end)).await
}

/// Availability probe for a one-hour slot starting at `raw_start`.
pub async fn check_slot(pool: &SqlitePool, hairdresser_id: &str, raw_start: &str) -> Result<()> {
    let start = check_date(raw_start, "appointment")?;
    let slot = Interval::slot(start);
    check_overlap(pool, hairdresser_id, slot.start, slot.end).await
}

async fn ensure_free(
    conn: &mut SqliteConnection,
    hairdresser_id: &str,
    candidate: &Interval,
) -> Result<()> {
    let booked = hairdresser_schedule(conn, hairdresser_id).await?;
    if let Some(existing) = first_conflict(&booked, candidate) {
        log::debug!(
            "Slot {} for hairdresser {hairdresser_id} collides with appointment {}",
            candidate.start,
            existing.id
        );
        return Err(BookingError::SlotTaken);
    }
    Ok(())
}

/// Stores an appointment and links it to both users. The overlap check is the caller's job.
///
/// The insert and the linkage are separate writes: if linkage fails the
/// appointment row stays behind.
pub async fn create(pool: &SqlitePool, appointment: &NewAppointment) -> Result<Appointment> {
    let id = new_id();
    let mut conn = pool.acquire().await?;
    insert(&mut conn, &id, appointment).await?;
    drop(conn);

    let stored = get(pool, &id).await?;
    users::append_appointment_ref(pool, &stored).await?;
    log::info!(
        "Appointment {id} created for hairdresser {} at {}",
        stored.hairdresser_id,
        stored.start_time
    );
    Ok(stored)
}

/// Overlap check, insert and linkage under one write lock; nothing is kept on failure.
///
/// The transaction rolls back when dropped uncommitted, so a cancelled call
/// leaves neither rows nor an open write lock behind.
pub async fn book(pool: &SqlitePool, appointment: &NewAppointment) -> Result<Appointment> {
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let stored = match book_locked(&mut tx, appointment).await {
        Ok(stored) => stored,
        Err(err) => {
            if let Err(rollback) = tx.rollback().await {
                log::error!("Rollback after failed booking also failed: {rollback}");
            }
            return Err(err);
        }
    };
    tx.commit().await?;

    log::info!(
        "Appointment {} booked for hairdresser {} at {}",
        stored.id,
        stored.hairdresser_id,
        stored.start_time
    );
    Ok(stored)
}

async fn book_locked(
    conn: &mut SqliteConnection,
    appointment: &NewAppointment,
) -> Result<Appointment> {
    let candidate = Interval::new(appointment.start_time, appointment.end_time);
    ensure_free(conn, &appointment.hairdresser_id, &candidate).await?;

    let id = new_id();
    insert(conn, &id, appointment).await?;
    let stored = Appointment {
        id,
        customer_id: appointment.customer_id.clone(),
        hairdresser_id: appointment.hairdresser_id.clone(),
        start_time: appointment.start_time,
        end_time: appointment.end_time,
        service: appointment.service.clone(),
        comments: appointment.comments.clone(),
        price: appointment.price,
    };
    users::link_appointment(conn, &stored).await?;
    Ok(stored)
}

async fn insert(conn: &mut SqliteConnection, id: &str, appointment: &NewAppointment) -> Result<()> {
    let result = sqlx::query(
        r#"INSERT INTO appointments
           (id, customer_id, hairdresser_id, start_time, end_time, service, comments, price)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(id)
    .bind(&appointment.customer_id)
    .bind(&appointment.hairdresser_id)
    .bind(appointment.start_time.timestamp_millis())
    .bind(appointment.end_time.timestamp_millis())
    .bind(&appointment.service)
    .bind(&appointment.comments)
    .bind(appointment.price)
    .execute(&mut *conn)
    .await?;
    ensure_inserted(result.rows_affected(), "appointment")
}

/// One-hour slot starts on `day` still open for the hairdresser.
pub async fn open_slots(
    pool: &SqlitePool,
    hairdresser_id: &str,
    day: NaiveDate,
    hours: &BusinessHours,
    offset: FixedOffset,
) -> Result<Vec<DateTime<Utc>>> {
    let booked = find_by_hairdresser(pool, hairdresser_id).await?;
    Ok(free_slots(hours, day, offset, &booked))
}
