//! PostgreSQL Storage Adapter
//!
//! `Store` implementation over a shared `PgPool`. Queries are bound at
//! runtime and decoded through `sqlx::FromRow`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::store::{Store, StoreResult};
use crate::models::{HeartRateRecord, NewHeartRate, NewUser, ProfileChanges, User};

const USER_COLUMNS: &str = "id, username, email, hashed_password, age, health_issues";
const HEART_RATE_COLUMNS: &str = "id, user_id, bpm, recorded_at, created_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get connection pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, hashed_password) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: &ProfileChanges) -> StoreResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                age = COALESCE($4, age),
                health_issues = COALESCE($5, health_issues)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.username.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.age)
            .bind(changes.health_issues.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn insert_heart_rate(&self, record: NewHeartRate) -> StoreResult<HeartRateRecord> {
        let sql = format!(
            r#"
            INSERT INTO heart_rate_records (id, user_id, bpm, recorded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            HEART_RATE_COLUMNS
        );

        let created = sqlx::query_as::<_, HeartRateRecord>(&sql)
            .bind(&record.id)
            .bind(record.user_id)
            .bind(record.bpm)
            .bind(record.recorded_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_heart_rate(&self, user_id: i64, id: &str) -> StoreResult<Option<HeartRateRecord>> {
        let sql = format!(
            "SELECT {} FROM heart_rate_records WHERE id = $1 AND user_id = $2",
            HEART_RATE_COLUMNS
        );

        let record = sqlx::query_as::<_, HeartRateRecord>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list_heart_rates(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HeartRateRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM heart_rate_records
            WHERE user_id = $1
            ORDER BY recorded_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
            HEART_RATE_COLUMNS
        );

        let records = sqlx::query_as::<_, HeartRateRecord>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn delete_heart_rate(&self, user_id: i64, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM heart_rate_records WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_heart_rates(&self, user_id: i64, ids: &[String]) -> StoreResult<u64> {
        let result =
            sqlx::query("DELETE FROM heart_rate_records WHERE user_id = $1 AND id = ANY($2)")
                .bind(user_id)
                .bind(ids)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn revoke_token(
        &self,
        jti: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool> {
        let revoked: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?;

        Ok(revoked)
    }

    async fn purge_expired_revocations(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::StoreError;
    use chrono::{Duration, TimeZone};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            hashed_password: "$2b$04$placeholder".to_string(),
        }
    }

    fn sample(id: &str, user_id: i64, minute: u32) -> NewHeartRate {
        NewHeartRate {
            id: id.to_string(),
            user_id,
            bpm: 60 + minute as i32,
            recorded_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, minute, 0).unwrap(),
        }
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_user_uniqueness(pool: PgPool) {
        let store = PgStore::new(pool);
        store.insert_user(new_user("ann", "ann@example.com")).await.unwrap();

        let duplicate_email = store.insert_user(new_user("other", "ann@example.com")).await;
        assert!(matches!(duplicate_email, Err(StoreError::Conflict(c)) if c == "users_email_key"));

        let duplicate_name = store.insert_user(new_user("ann", "other@example.com")).await;
        assert!(matches!(duplicate_name, Err(StoreError::Conflict(c)) if c == "users_username_key"));
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_partial_update(pool: PgPool) {
        let store = PgStore::new(pool);
        let user = store.insert_user(new_user("ann", "ann@example.com")).await.unwrap();

        let changes = ProfileChanges {
            age: Some(33),
            ..Default::default()
        };
        let updated = store.update_user(user.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.age, Some(33));
        assert_eq!(updated.username, "ann");

        assert!(store.update_user(user.id + 1000, &changes).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_heart_rate_lifecycle(pool: PgPool) {
        let store = PgStore::new(pool);
        let ann = store.insert_user(new_user("ann", "ann@example.com")).await.unwrap();
        let bob = store.insert_user(new_user("bob", "bob@example.com")).await.unwrap();

        for (id, minute) in [("a", 1), ("b", 3), ("c", 2)] {
            store.insert_heart_rate(sample(id, ann.id, minute)).await.unwrap();
        }

        let listed = store.list_heart_rates(ann.id, 10, 0).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        assert!(matches!(
            store.insert_heart_rate(sample("a", bob.id, 5)).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(store.find_heart_rate(bob.id, "a").await.unwrap().is_none());
        assert!(!store.delete_heart_rate(bob.id, "a").await.unwrap());

        let removed = store
            .delete_heart_rates(ann.id, &["a".to_string(), "b".to_string(), "zzz".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.delete_heart_rate(ann.id, "c").await.unwrap());
    }

    #[sqlx::test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_token_revocation(pool: PgPool) {
        let store = PgStore::new(pool);
        let ann = store.insert_user(new_user("ann", "ann@example.com")).await.unwrap();

        store
            .revoke_token("live", ann.id, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .revoke_token("live", ann.id, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .revoke_token("stale", ann.id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(store.purge_expired_revocations().await.unwrap(), 1);
        assert!(store.is_token_revoked("live").await.unwrap());
        assert!(!store.is_token_revoked("stale").await.unwrap());
    }
}
