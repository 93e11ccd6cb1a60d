//! Competition user persistence.

use anyhow::Result;
use interop_core::Principal;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// A stored user together with their session token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub session_token: String,
    pub is_superuser: bool,
}

impl UserRow {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.clone(),
            is_superuser: self.is_superuser,
        }
    }
}

/// Insert a user and return its principal.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    session_token: &str,
    is_superuser: bool,
) -> Result<Principal> {
    let result = sqlx::query(
        "INSERT INTO users (username, session_token, is_superuser) VALUES (?1, ?2, ?3)",
    )
    .bind(username)
    .bind(session_token)
    .bind(is_superuser)
    .execute(pool)
    .await?;

    Ok(Principal {
        user_id: result.last_insert_rowid(),
        username: username.to_string(),
        is_superuser,
    })
}

/// Insert a user, or update the token and role of an existing username.
/// The row id is kept, so earlier access records stay attached.
pub async fn upsert_user_tx(
    tx: &mut Transaction<'_, Sqlite>,
    username: &str,
    session_token: &str,
    is_superuser: bool,
) -> Result<Principal> {
    let (user_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, session_token, is_superuser) VALUES (?1, ?2, ?3)
        ON CONFLICT(username) DO UPDATE SET
            session_token = excluded.session_token,
            is_superuser = excluded.is_superuser
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(session_token)
    .bind(is_superuser)
    .fetch_one(&mut **tx)
    .await?;

    Ok(Principal {
        user_id,
        username: username.to_string(),
        is_superuser,
    })
}

/// Load all users.
pub async fn load_all_users(pool: &SqlitePool) -> Result<Vec<UserRow>> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, session_token, is_superuser FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
