use sqlx::SqlitePool;

use crate::{
    auth::new_id,
    error::{BookingError, Result},
    models::{NewReview, Review, ReviewRow},
    repo::{ensure_inserted, require_any, users},
    validation::{check_id, check_string},
};

const REVIEW_COLUMNS: &str = "id, poster_id, hairdresser_id, body, rating";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingOrder {
    Ascending,
    Descending,
}

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Review>> {
    let rows = sqlx::query_as::<_, ReviewRow>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY rowid"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Review::from).collect())
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Review> {
    let id = check_id(id, "review")?;
    let row = sqlx::query_as::<_, ReviewRow>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ? LIMIT 1"
    ))
    .bind(&id)
    .fetch_optional(pool)
    .await?;

    row.map(Review::from)
        .ok_or_else(|| BookingError::not_found("review", "id", id))
}

/// Stores a review and links it to the poster and the reviewed hairdresser.
pub async fn create(pool: &SqlitePool, review: &NewReview) -> Result<Review> {
    let id = new_id();
    let result = sqlx::query(
        "INSERT INTO reviews (id, poster_id, hairdresser_id, body, rating) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&review.poster_id)
    .bind(&review.hairdresser_id)
    .bind(&review.body)
    .bind(review.rating)
    .execute(pool)
    .await?;
    ensure_inserted(result.rows_affected(), "review")?;

    let stored = get(pool, &id).await?;
    users::append_review_ref(pool, &stored).await?;
    log::info!("Review {id} posted for hairdresser {}", stored.hairdresser_id);
    Ok(stored)
}

/// Every review ordered by rating; equal ratings stay in posting order.
pub async fn sorted_by_rating(pool: &SqlitePool, order: RatingOrder) -> Result<Vec<Review>> {
    let direction = match order {
        RatingOrder::Ascending => "ASC",
        RatingOrder::Descending => "DESC",
    };
    let sql = format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY rating {direction}, rowid ASC"
    );
    let rows = sqlx::query_as::<_, ReviewRow>(&sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(Review::from).collect())
}

pub async fn find_by_poster(pool: &SqlitePool, poster_id: &str) -> Result<Vec<Review>> {
    let poster_id = check_id(poster_id, "customer")?;
    let rows = sqlx::query_as::<_, ReviewRow>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE poster_id = ? ORDER BY rowid"
    ))
    .bind(&poster_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Review::from).collect())
}

pub async fn get_by_poster(pool: &SqlitePool, poster_id: &str) -> Result<Vec<Review>> {
    let found = find_by_poster(pool, poster_id).await?;
    require_any(found, "review", "poster id", poster_id.trim())
}

pub async fn find_by_hairdresser(pool: &SqlitePool, hairdresser_id: &str) -> Result<Vec<Review>> {
    let hairdresser_id = check_id(hairdresser_id, "hairdresser")?;
    let rows = sqlx::query_as::<_, ReviewRow>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews WHERE hairdresser_id = ? ORDER BY rowid"
    ))
    .bind(&hairdresser_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Review::from).collect())
}

pub async fn get_by_hairdresser(pool: &SqlitePool, hairdresser_id: &str) -> Result<Vec<Review>> {
    let found = find_by_hairdresser(pool, hairdresser_id).await?;
    require_any(found, "review", "hairdresser id", hairdresser_id.trim())
}

/// Reviews whose body contains `term`, ignoring case. The term is matched literally.
pub async fn search(pool: &SqlitePool, term: &str) -> Result<Vec<Review>> {
    let term = check_string(term, "review search term")?.to_lowercase();
    let found = get_all(pool)
        .await?
        .into_iter()
        .filter(|review| review.body.to_lowercase().contains(&term))
        .collect();
    Ok(found)
}

pub async fn get_by_search(pool: &SqlitePool, term: &str) -> Result<Vec<Review>> {
    let found = search(pool, term).await?;
    require_any(found, "review", "term", term.trim())
}
