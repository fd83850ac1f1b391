use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{NewUser, User, UserCredentials};

/// Inserts the user. Returns `None` if the login is already taken.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (login, password_hash, created_at) VALUES (?, ?, ?)
        ON CONFLICT (login) DO NOTHING
        RETURNING id, login, created_at"#,
    )
    .bind(user.login)
    .bind(user.password_hash)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

pub async fn fetch_user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>("SELECT id, login, created_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>("SELECT id, login, created_at FROM users WHERE login = ?")
        .bind(login)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_credentials(
    login: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    let creds = sqlx::query_as::<_, UserCredentials>(
        "SELECT id AS user_id, login, password_hash FROM users WHERE login = ?",
    )
    .bind(login)
    .fetch_optional(conn)
    .await?;
    Ok(creds)
}
