use std::{env, fs, path::Path, str::FromStr};

use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    auth::new_id,
    config::Config,
    error::Result,
    models::{ActivityRow, LEVEL_ADMIN, LEVEL_HAIRDRESSER},
    repo::{appointments, discounts, reviews, users},
    validation::{
        validate_appointment, validate_discount, validate_review, validate_user, UserInput,
    },
};

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    ensure_sqlite_dir(&config.database_url).map_err(sqlx::Error::Io)?;

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connect_options)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Appends to the activity log and prunes it down to the newest `retention` rows.
///
/// Logging must never fail the operation being logged, so store errors are only reported.
pub async fn log_activity(
    pool: &SqlitePool,
    kind: &str,
    message: &str,
    user_id: Option<&str>,
    retention: u32,
) {
    log::info!("[{kind}] {message}");

    let inserted = sqlx::query(
        r#"INSERT INTO activities (id, kind, message, created_at, user_id)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(kind)
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .execute(pool)
    .await;
    if let Err(err) = inserted {
        log::warn!("Could not record activity {kind}: {err}");
        return;
    }

    let pruned = sqlx::query(
        r#"DELETE FROM activities
           WHERE rowid NOT IN (SELECT rowid FROM activities ORDER BY rowid DESC LIMIT ?)"#,
    )
    .bind(i64::from(retention))
    .execute(pool)
    .await;
    if let Err(err) = pruned {
        log::warn!("Could not prune activity log: {err}");
    }
}

/// Newest activity first.
pub async fn recent_activity(pool: &SqlitePool, limit: u32) -> Result<Vec<ActivityRow>> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT kind, message, created_at FROM activities ORDER BY rowid DESC LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fills an empty store with the demo salon. Does nothing once any user exists.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<bool> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        log::info!("Store already has {existing} users, skipping seed");
        return Ok(false);
    }

    let john = users::create(
        pool,
        validate_user(&UserInput {
            email: "johnsmith@gmail.com",
            password: "supersecret",
            first_name: "John",
            last_name: "Smith",
            ..Default::default()
        })?,
    )
    .await?;
    let alma = users::create(
        pool,
        validate_user(&UserInput {
            email: "almacorvin@gmail.com",
            password: "almacorvin22",
            first_name: "Alma",
            last_name: "Corvin",
            ..Default::default()
        })?,
    )
    .await?;
    let alexander = users::create(
        pool,
        validate_user(&UserInput {
            email: "alexandergomez@gmail.com",
            password: "mypassword",
            first_name: "Alexander",
            last_name: "Gomez",
            job: Some("haircut"),
            biography: Some(
                "Alexander has been a salonist for over 15 years after graduating with a \
                 Masters Degree in Hair Styling, and has been with the salon since its founding.",
            ),
            level: Some(LEVEL_HAIRDRESSER),
            ..Default::default()
        })?,
    )
    .await?;
    let zachary = users::create(
        pool,
        validate_user(&UserInput {
            email: "zachroho@gmail.com",
            password: "thelettereight",
            first_name: "Zachary",
            last_name: "Rohovit",
            job: Some("coloring"),
            biography: Some(
                "Zachary, originally a chemical engineer, developed a treatment that lets hair be \
                 bleached and colored without severe damage.",
            ),
            level: Some(LEVEL_HAIRDRESSER),
            ..Default::default()
        })?,
    )
    .await?;

    let admin_email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@salon.local".to_string());
    let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "password1234".to_string());
    if admin_password == "password1234" {
        log::warn!(
            "ADMIN_PASSWORD not set. Using default password 'password1234'. \
             Set ADMIN_PASSWORD in production."
        );
    }
    users::create(
        pool,
        validate_user(&UserInput {
            email: &admin_email,
            password: &admin_password,
            first_name: "Salon",
            last_name: "Admin",
            level: Some(LEVEL_ADMIN),
            ..Default::default()
        })?,
    )
    .await?;
    log::info!("Done seeding users");

    // Salon-local hours on 2022-05-12, at UTC-4.
    let bookings = [
        (&alma, &alexander, 12, "coloronly", "My first time getting a coloring.", "45"),
        (&john, &zachary, 13, "washandcut", "I would like to use size 2 clippers", "65"),
        (&john, &alexander, 14, "cutandcolor", "Lets make it three colors.", "80"),
        (&alma, &zachary, 15, "washandcut", "Squared neckline please.", "65"),
    ];
    for (customer, hairdresser, hour, service, comments, price) in bookings {
        let start = format!("2022-05-12T{hour:02}:00:00-04:00");
        let end = format!("2022-05-12T{:02}:00:00-04:00", hour + 1);
        let appointment = validate_appointment(
            &customer.id,
            &hairdresser.id,
            &start,
            &end,
            service,
            Some(comments),
            price,
        )?;
        appointments::book(pool, &appointment).await?;
    }
    log::info!("Done seeding appointments");

    let posted = [
        (&alma, &alexander, "I believe that the service was first-class!", "4.6"),
        (&john, &zachary, "I disliked the cut from the second it started!", "1.3"),
        (
            &john,
            &alexander,
            "This was my third time here, and I just had to leave a good review.",
            "4.8",
        ),
    ];
    for (poster, hairdresser, body, rating) in posted {
        let review = validate_review(&poster.id, &hairdresser.id, body, rating)?;
        reviews::create(pool, &review).await?;
    }
    log::info!("Done seeding reviews");

    discounts::create(pool, &validate_discount("welcome", "20")?).await?;
    discounts::create(pool, &validate_discount("take10", "10")?).await?;
    log::info!("Done seeding discounts");

    Ok(true)
}
