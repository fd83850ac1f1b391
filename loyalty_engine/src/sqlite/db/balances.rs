use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Balance, Points};

pub async fn create_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO balances (user_id, current, withdrawn, updated_at) VALUES (?, 0, 0, ?)")
        .bind(user_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_balance(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    let balance = sqlx::query_as::<_, Balance>(
        "SELECT user_id, current, withdrawn, updated_at FROM balances WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(balance)
}

/// Adds `amount` to the user's spendable balance. Returns false, and changes nothing, if the user has no balance row
/// or the credit would take `current` past `i64::MAX` hundredths. SQLite would silently store such a sum as a REAL.
pub async fn credit_balance(user_id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let headroom = i64::MAX.saturating_sub(amount.value());
    let result =
        sqlx::query("UPDATE balances SET current = current + ?, updated_at = ? WHERE user_id = ? AND current <= ?")
            .bind(amount)
            .bind(Utc::now())
            .bind(user_id)
            .bind(headroom)
            .execute(conn)
            .await?;
    trace!("🗃️ Credited {amount} to user #{user_id}. {} rows affected", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

/// Moves `amount` from `current` to `withdrawn`, but only if `current` covers it. The check and the update are one
/// statement, so there is no window for a concurrent debit to slip in between them.
///
/// Returns false, and changes nothing, if the balance is insufficient, the user has no balance row, or `withdrawn`
/// would overflow.
pub async fn try_debit_balance(
    user_id: i64,
    amount: Points,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE balances
        SET current = current - ?, withdrawn = withdrawn + ?, updated_at = ?
        WHERE user_id = ? AND current >= ? AND withdrawn <= ?"#,
    )
    .bind(amount)
    .bind(amount)
    .bind(Utc::now())
    .bind(user_id)
    .bind(amount)
    .bind(i64::MAX.saturating_sub(amount.value()))
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
