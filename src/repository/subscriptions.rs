//! Newsletter subscriptions repository

use sqlx::{Pool, Postgres};

use crate::{error::AppResult, models::subscription::Subscription};

#[derive(Clone)]
pub struct SubscriptionsRepository {
    pool: Pool<Postgres>,
}

impl SubscriptionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn active_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE LOWER(email) = LOWER($1) AND is_active)",
        )
        .bind(email.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Subscribe an email, linking the member with the same email when no member is given
    pub async fn create(&self, email: &str, member_id: Option<i32>) -> AppResult<Subscription> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (email, member_id)
            VALUES (
                $1,
                COALESCE($2, (SELECT id FROM members WHERE LOWER(email) = LOWER($1)))
            )
            RETURNING *
            "#,
        )
        .bind(email.trim())
        .bind(member_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(subscription)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<(Vec<Subscription>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions")
            .fetch_one(&self.pool)
            .await?;

        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions ORDER BY subscribed_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((subscriptions, total))
    }
}
