use sqlx::SqlitePool;

use crate::{
    auth::new_id,
    error::{BookingError, Result},
    models::{Discount, DiscountRow, NewDiscount},
    pricing::{self, NegativePricePolicy},
    repo::ensure_inserted,
    validation::check_id,
};

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Discount>> {
    let rows =
        sqlx::query_as::<_, DiscountRow>("SELECT id, name, amount FROM discounts ORDER BY rowid")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(Discount::from).collect())
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Discount> {
    let id = check_id(id, "discount")?;
    sqlx::query_as::<_, DiscountRow>("SELECT id, name, amount FROM discounts WHERE id = ? LIMIT 1")
        .bind(&id)
        .fetch_optional(pool)
        .await?
        .map(Discount::from)
        .ok_or_else(|| BookingError::not_found("discount", "id", id))
}

/// Every discount called `name`, in insertion order.
pub async fn find_all_by_name(pool: &SqlitePool, name: &str) -> Result<Vec<Discount>> {
    let rows = sqlx::query_as::<_, DiscountRow>(
        "SELECT id, name, amount FROM discounts WHERE name = ? ORDER BY rowid",
    )
    .bind(name.trim())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Discount::from).collect())
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Discount>> {
    let row = sqlx::query_as::<_, DiscountRow>(
        "SELECT id, name, amount FROM discounts WHERE name = ? ORDER BY rowid LIMIT 1",
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Discount::from))
}

pub async fn create(pool: &SqlitePool, discount: &NewDiscount) -> Result<Discount> {
    let id = new_id();
    let result = sqlx::query("INSERT INTO discounts (id, name, amount) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&discount.name)
        .bind(discount.amount)
        .execute(pool)
        .await?;
    ensure_inserted(result.rows_affected(), "discount")?;

    log::info!("Discount {:?} ({}) created", discount.name, discount.amount);
    get(pool, &id).await
}

/// Final price for `service` after applying every stored discount called `discount_name`.
pub async fn compute_price(
    pool: &SqlitePool,
    service: &str,
    discount_name: Option<&str>,
    policy: NegativePricePolicy,
) -> Result<f64> {
    let discounts = match discount_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => find_all_by_name(pool, name).await?,
        None => Vec::new(),
    };
    pricing::compute_price(service, discount_name, &discounts, policy)
}
