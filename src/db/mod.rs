pub mod error;
#[cfg(test)]
pub mod memory;
pub mod models;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

pub use error::StoreError;
pub use models::{UserRecord, UserUpdate};

/// Store-side normalization, kept in lockstep with `directory::normalize`.
const NORMALIZED_PHONE: &str = "REGEXP_REPLACE(phone, '[^0-9]', '', 'g')";

/// The backing directory the reconciler reads and writes through.
///
/// Every `normalized` argument is a digits-only phone; implementations match it
/// against the normalized form of the stored phone, never the raw column.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_by_phone(&self, normalized: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Returns [`StoreError::Conflict`] when the phone is already taken.
    async fn insert(
        &self,
        phone: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserRecord, StoreError>;

    /// Returns the number of rows changed.
    async fn update(&self, normalized: &str, update: &UserUpdate) -> Result<u64, StoreError>;

    /// Returns the number of rows removed.
    async fn delete(&self, normalized: &str) -> Result<u64, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Newest rows first.
    async fn list(&self, limit: i64) -> Result<Vec<UserRecord>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // One statement per query; Postgres rejects multiple commands in a prepared statement.

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                phone TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_users_phone_digits \
             ON users ((REGEXP_REPLACE(phone, '[^0-9]', '', 'g')))",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// `UPDATE` touching only the fields set in `update`, matched by normalized phone.
fn update_query(normalized: &str, update: &UserUpdate) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new("UPDATE users SET ");
    {
        let mut fields = qb.separated(", ");
        if let Some(first_name) = &update.first_name {
            fields.push("first_name = ").push_bind_unseparated(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            fields.push("last_name = ").push_bind_unseparated(last_name.clone());
        }
        if let Some(phone) = &update.phone {
            fields.push("phone = ").push_bind_unseparated(phone.clone());
        }
    }
    qb.push(format!(" WHERE {NORMALIZED_PHONE} = "))
        .push_bind(normalized.to_string())
        .push(" RETURNING id");
    qb
}

#[async_trait]
impl DirectoryStore for Database {
    async fn find_by_phone(&self, normalized: &str) -> Result<Option<UserRecord>, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT id, phone, first_name, last_name, created_at FROM users \
             WHERE {NORMALIZED_PHONE} = $1 ORDER BY id LIMIT 1"
        ))
        .bind(normalized)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(
        &self,
        phone: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserRecord, StoreError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (phone, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING id, phone, first_name, last_name, created_at
            "#,
        )
        .bind(phone)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, normalized: &str, update: &UserUpdate) -> Result<u64, StoreError> {
        let mut qb = update_query(normalized, update);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, normalized: &str) -> Result<u64, StoreError> {
        let result = sqlx::query(&format!(
            "DELETE FROM users WHERE {NORMALIZED_PHONE} = $1 RETURNING phone"
        ))
        .bind(normalized)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn list(&self, limit: i64) -> Result<Vec<UserRecord>, StoreError> {
        let users = sqlx::query_as::<_, UserRecord>(
            "SELECT id, phone, first_name, last_name, created_at FROM users \
             ORDER BY id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
