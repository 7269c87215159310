use crate::pool::DbPool;
use async_trait::async_trait;
use services::user::ports::{User, UserRepository};
use services::UserId;

pub struct PostgresUserRepository {
    pool: DbPool,
}

impl PostgresUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn upsert_user(
        &self,
        user_id: &UserId,
        email: Option<&str>,
        name: Option<&str>,
    ) -> anyhow::Result<User> {
        let client = self.pool.get().await?;

        // COALESCE keeps the existing cached values when the caller passes None
        let row = client
            .query_one(
                "INSERT INTO users (id, email, name)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (id)
                 DO UPDATE SET
                     email = COALESCE(EXCLUDED.email, users.email),
                     name = COALESCE(EXCLUDED.name, users.name),
                     updated_at = NOW()
                 RETURNING id, email, name, created_at, updated_at",
                &[&user_id, &email, &name],
            )
            .await?;

        Ok(User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn get_user(&self, user_id: &UserId) -> anyhow::Result<Option<User>> {
        let client = self.pool.get().await?;

        let row = client
            .query_opt(
                "SELECT id, email, name, created_at, updated_at
                 FROM users
                 WHERE id = $1",
                &[&user_id],
            )
            .await?;

        Ok(row.map(|r| User {
            id: r.get("id"),
            email: r.get("email"),
            name: r.get("name"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }
}
