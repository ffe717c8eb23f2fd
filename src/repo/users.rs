use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    auth::{hash_password, new_id, verify_password},
    error::{BookingError, Result},
    models::{Appointment, Level, LoginAttempt, NewUser, Review, User, UserRow},
    repo::ensure_inserted,
    validation::{check_id, check_string},
};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, appointment_ids, \
                            review_ids, job, biography, level";

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY rowid"
    ))
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(User::try_from).collect()
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<User> {
    let id = check_id(id, "user")?;
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => row.try_into(),
        None => Err(BookingError::not_found("user", "id", id)),
    }
}

async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    row.map(User::try_from).transpose()
}

/// First user, in signup order, whose names contain `first` and `last` (case-insensitive).
pub async fn find_by_name(pool: &SqlitePool, first: &str, last: &str) -> Result<User> {
    let first = check_string(first, "first name")?;
    let last = check_string(last, "last name")?;
    let first_lower = first.to_lowercase();
    let last_lower = last.to_lowercase();

    get_all(pool)
        .await?
        .into_iter()
        .find(|user| {
            user.first_name.to_lowercase().contains(&first_lower)
                && user.last_name.to_lowercase().contains(&last_lower)
        })
        .ok_or_else(|| BookingError::not_found("user", "name", format!("{first} {last}")))
}

pub async fn create(pool: &SqlitePool, user: NewUser) -> Result<User> {
    if find_by_email(pool, &user.email).await?.is_some() {
        return Err(BookingError::DuplicateEmail(user.email));
    }

    let id = new_id();
    let password_hash = hash_password(&user.password)?;
    let appointment_ids = encode_ids(&user.appointment_ids)?;
    let review_ids = encode_ids(&user.review_ids)?;

    let result = sqlx::query(
        r#"INSERT INTO users
           (id, email, password_hash, first_name, last_name, appointment_ids, review_ids,
            job, biography, level, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&user.email)
    .bind(password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(appointment_ids)
    .bind(review_ids)
    .bind(&user.job)
    .bind(&user.biography)
    .bind(user.level.as_str())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await;

    // A concurrent signup can slip past the lookup above; the unique index catches it.
    let result = match result {
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(BookingError::DuplicateEmail(user.email));
        }
        other => other?,
    };
    ensure_inserted(result.rows_affected(), "user")?;

    log::info!("Created {} account {}", user.level, id);
    get(pool, &id).await
}

/// Checks a login against the stored hash. Unknown email and wrong password fail the same way.
pub async fn authenticate(pool: &SqlitePool, attempt: &LoginAttempt) -> Result<User> {
    let Some(user) = find_by_email(pool, &attempt.email).await? else {
        log::debug!("Login rejected: no account for submitted email");
        return Err(BookingError::AuthenticationFailed);
    };
    if !verify_password(&attempt.password, &user.password_hash) {
        log::debug!("Login rejected: password mismatch for {}", user.id);
        return Err(BookingError::AuthenticationFailed);
    }
    Ok(user)
}

pub async fn update_level(pool: &SqlitePool, id: &str, level: Level) -> Result<()> {
    let id = check_id(id, "user")?;
    let result = sqlx::query("UPDATE users SET level = ? WHERE id = ? AND level <> ?")
        .bind(level.as_str())
        .bind(&id)
        .bind(level.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(&id)
            .fetch_one(pool)
            .await?;
        if exists == 0 {
            return Err(BookingError::not_found("user", "id", id));
        }
        return Err(BookingError::UpdateFailed(format!("level of user {id}")));
    }

    log::info!("User {id} level set to {level}");
    Ok(())
}

pub async fn list_by_role(pool: &SqlitePool, level: Level) -> Result<Vec<User>> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE level = ? ORDER BY rowid"
    ))
    .bind(level.as_str())
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(User::try_from).collect()
}

/// Records `appointment` on both its customer and its hairdresser, in one transaction.
pub async fn append_appointment_ref(pool: &SqlitePool, appointment: &Appointment) -> Result<()> {
    let mut tx = pool.begin().await?;
    link_appointment(&mut tx, appointment).await?;
    tx.commit().await?;
    Ok(())
}

/// Records `review` on both its poster and the reviewed hairdresser, in one transaction.
pub async fn append_review_ref(pool: &SqlitePool, review: &Review) -> Result<()> {
    let mut tx = pool.begin().await?;
    link_review(&mut tx, review).await?;
    tx.commit().await?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum RefList {
    Appointments,
    Reviews,
}

impl RefList {
    fn push_sql(self) -> &'static str {
        match self {
            RefList::Appointments => {
                "UPDATE users SET appointment_ids = json_insert(appointment_ids, '$[#]', ?) \
                 WHERE id = ?"
            }
            RefList::Reviews => {
                "UPDATE users SET review_ids = json_insert(review_ids, '$[#]', ?) WHERE id = ?"
            }
        }
    }

    fn entity(self) -> &'static str {
        match self {
            RefList::Appointments => "appointment",
            RefList::Reviews => "review",
        }
    }
}

pub(crate) async fn link_appointment(
    conn: &mut SqliteConnection,
    appointment: &Appointment,
) -> Result<()> {
    let id = &appointment.id;
    push_ref(conn, RefList::Appointments, id, "customer", &appointment.customer_id).await?;
    push_ref(conn, RefList::Appointments, id, "hairdresser", &appointment.hairdresser_id).await
}

pub(crate) async fn link_review(conn: &mut SqliteConnection, review: &Review) -> Result<()> {
    push_ref(conn, RefList::Reviews, &review.id, "poster", &review.poster_id).await?;
    push_ref(conn, RefList::Reviews, &review.id, "hairdresser", &review.hairdresser_id).await
}

async fn push_ref(
    conn: &mut SqliteConnection,
    list: RefList,
    ref_id: &str,
    party: &'static str,
    user_id: &str,
) -> Result<()> {
    let result = sqlx::query(list.push_sql())
        .bind(ref_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        log::warn!("Could not add {} {ref_id} to {party} {user_id}", list.entity());
        return Err(BookingError::LinkageFailed {
            entity: list.entity(),
            id: ref_id.to_string(),
            party,
            party_id: user_id.to_string(),
        });
    }
    Ok(())
}

fn encode_ids(ids: &[String]) -> Result<String> {
    serde_json::to_string(ids).map_err(|err| {
        BookingError::Storage(sqlx::Error::Encode(Box::new(err)))
    })
}
