use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{StoreError, User};

/// Access to the `users` table. Emails are passed in already lowercased.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new account. A uniqueness violation on `email` must surface as
    /// [`StoreError::DuplicateEmail`] and leave no row behind.
    async fn create(&self, name: &str, email: &str, password_hash: &str)
        -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            other => StoreError::Database(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a reachable Postgres in DATABASE_URL; run with `--ignored`.
    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn unique_violation_maps_to_duplicate_email(pool: PgPool) {
        let store = PgUserStore::new(pool);

        let created = store.create("Amina", "amina@x.co", "hash").await.unwrap();
        assert_eq!(created.email, "amina@x.co");

        let err = store.create("Other", "amina@x.co", "hash").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        let found = store.find_by_email("amina@x.co").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Amina");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn concurrent_inserts_with_same_email_keep_one_row(pool: PgPool) {
        let store = PgUserStore::new(pool.clone());

        let (a, b) = tokio::join!(
            store.create("A", "race@x.co", "h1"),
            store.create("B", "race@x.co", "h2"),
        );
        let dupes = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(StoreError::DuplicateEmail)))
            .count();
        assert_eq!((a.is_ok() as usize + b.is_ok() as usize, dupes), (1, 1));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind("race@x.co")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
