use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccrualUpdate, Order, OrderNumber},
    traits::InsertOrderResult,
};

/// Inserts a `NEW` order for `user_id`, unless the number is already registered, in which case the existing order
/// is returned.
///
/// The unique constraint on `number` arbitrates between racing submissions. Losers of the race see the winner's row
/// when they fetch the existing order.
pub async fn idempotent_insert(
    user_id: i64,
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, sqlx::Error> {
    let now = Utc::now();
    let inserted = sqlx::query_as::<_, Order>(
        r#"INSERT INTO orders (number, user_id, status, uploaded_at, updated_at) VALUES (?, ?, 'NEW', ?, ?)
        ON CONFLICT (number) DO NOTHING
        RETURNING *"#,
    )
    .bind(number)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(order) => {
            trace!("🗃️ Order {number} inserted with id {}", order.id);
            Ok(InsertOrderResult::Inserted(order))
        },
        None => {
            let existing = fetch_order_by_number(number, conn).await?.ok_or(sqlx::Error::RowNotFound)?;
            trace!("🗃️ Order {number} already exists. Owner is user #{}", existing.user_id);
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
    }
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE number = ?").bind(number).fetch_optional(conn).await?;
    Ok(order)
}

/// All orders for the user, newest first. Orders uploaded in the same instant fall back to insertion order.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE user_id = ? ORDER BY uploaded_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Orders that the accrual service still has to rule on, oldest first.
pub async fn fetch_pending_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE status IN ('NEW', 'PROCESSING') ORDER BY uploaded_at ASC, id ASC",
    )
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Sets the status and reward of a pending order. Orders in a final state are not touched, and `None` is returned.
pub async fn update_accrual(
    number: &OrderNumber,
    update: &AccrualUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(
        r#"UPDATE orders SET status = ?, accrual = ?, updated_at = ?
        WHERE number = ? AND status IN ('NEW', 'PROCESSING')
        RETURNING *"#,
    )
    .bind(update.status)
    .bind(update.accrual)
    .bind(Utc::now())
    .bind(number)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
