//! User account repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use diary_core::{Error, Result, User, UserCredentials, UserRepository};

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
    }
}

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, password_hash, magic_link_token
            FROM users
            WHERE email = $1 OR name = $1
            ORDER BY (email = $1) DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| UserCredentials {
            user: user_from_row(&row),
            password_hash: row.get("password_hash"),
            magic_link_token: row.get("magic_link_token"),
        }))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, name FROM users WHERE magic_link_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn set_token(&self, user_id: i64, token: &str) -> Result<()> {
        sqlx::query("UPDATE users SET magic_link_token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn create(&self, email: &str, name: Option<&str>, password_hash: &str) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = Error::Database(e);
            if err.is_unique_violation() {
                Error::Conflict(format!("User {} already exists", email))
            } else {
                err
            }
        })?;

        Ok(user_from_row(&row))
    }
}
