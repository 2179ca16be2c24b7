//! User persistence
//!
//! Users exist only so an upload can be attributed to an owner. A user is
//! identified on the wire by an opaque bearer token.

use sqlx::{Row, SqlitePool};

use super::models::User;
use crate::{time, uuid_utils, Error, Result};

/// Create a user with a freshly generated token
pub async fn create_user(pool: &SqlitePool, username: &str) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::InvalidInput("Username must not be empty".to_string()));
    }

    let user = User {
        guid: uuid_utils::generate_id(),
        username: username.to_string(),
        token: uuid_utils::generate_token(),
        created_at: time::now(),
    };

    let result = sqlx::query(
        "INSERT INTO users (guid, username, token, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&user.guid)
    .bind(&user.username)
    .bind(&user.token)
    .bind(time::to_db_string(&user.created_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
            Error::InvalidInput(format!("Username already taken: {}", user.username)),
        ),
        Err(e) => Err(e.into()),
    }
}

/// Resolve a bearer token to its user
pub async fn find_user_by_token(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT guid, username, token, created_at FROM users WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let created_at: String = row.get("created_at");
            Ok(Some(User {
                guid: row.get("guid"),
                username: row.get("username"),
                token: row.get("token"),
                created_at: time::from_db_string(&created_at)?,
            }))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let pool = init_memory_database().await.unwrap();

        let user = create_user(&pool, "alice").await.unwrap();
        let found = find_user_by_token(&pool, &user.token).await.unwrap();

        assert_eq!(found.as_ref().map(|u| u.guid.as_str()), Some(user.guid.as_str()));
        assert_eq!(found.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let pool = init_memory_database().await.unwrap();
        assert!(find_user_by_token(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let pool = init_memory_database().await.unwrap();
        create_user(&pool, "bob").await.unwrap();

        let err = create_user(&pool, "bob").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_blank_username_rejected() {
        let pool = init_memory_database().await.unwrap();
        assert!(matches!(
            create_user(&pool, "   ").await,
            Err(Error::InvalidInput(_))
        ));
    }
}
