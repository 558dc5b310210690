//! In-Memory Storage Adapter
//!
//! Keeps every table in process behind one async mutex. Enforces the same
//! uniqueness rules and constraint names as the PostgreSQL schema, so the
//! services behave identically on top of it. Not for production use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::store::{
    Store, StoreError, StoreResult, HEART_RATE_RECORDS_PKEY, USERS_EMAIL_KEY, USERS_USERNAME_KEY,
};
use crate::models::{HeartRateRecord, NewHeartRate, NewUser, ProfileChanges, RevokedToken, User};
use crate::utils::security::is_expired;

#[derive(Default)]
struct Tables {
    next_user_id: i64,
    users: Vec<User>,
    heart_rates: HashMap<String, HeartRateRecord>,
    revoked: HashMap<String, RevokedToken>,
}

impl Tables {
    fn find_conflict(&self, except_id: Option<i64>, username: &str, email: &str) -> Option<&'static str> {
        self.users
            .iter()
            .filter(|u| Some(u.id) != except_id)
            .find_map(|u| {
                if u.email == email {
                    Some(USERS_EMAIL_KEY)
                } else if u.username == username {
                    Some(USERS_USERNAME_KEY)
                } else {
                    None
                }
            })
    }
}

/// Process-local store
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the database: every operation fails as unavailable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        if let Some(constraint) = tables.find_conflict(None, &user.username, &user.email) {
            return Err(StoreError::Conflict(constraint.to_string()));
        }

        tables.next_user_id += 1;
        let created = User {
            id: tables.next_user_id,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            age: None,
            health_issues: None,
        };
        tables.users.push(created.clone());

        Ok(created)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i64, changes: &ProfileChanges) -> StoreResult<Option<User>> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        let Some(current) = tables.users.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };

        let mut updated = current;
        changes.apply_to(&mut updated);

        if let Some(constraint) = tables.find_conflict(Some(id), &updated.username, &updated.email) {
            return Err(StoreError::Conflict(constraint.to_string()));
        }

        if let Some(slot) = tables.users.iter_mut().find(|u| u.id == id) {
            *slot = updated.clone();
        }

        Ok(Some(updated))
    }

    async fn insert_heart_rate(&self, record: NewHeartRate) -> StoreResult<HeartRateRecord> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        if tables.heart_rates.contains_key(&record.id) {
            return Err(StoreError::Conflict(HEART_RATE_RECORDS_PKEY.to_string()));
        }

        let created = HeartRateRecord {
            id: record.id,
            user_id: record.user_id,
            bpm: record.bpm,
            recorded_at: record.recorded_at,
            created_at: Utc::now(),
        };
        tables
            .heart_rates
            .insert(created.id.clone(), created.clone());

        Ok(created)
    }

    async fn find_heart_rate(&self, user_id: i64, id: &str) -> StoreResult<Option<HeartRateRecord>> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .heart_rates
            .get(id)
            .filter(|r| r.user_id == user_id)
            .cloned())
    }

    async fn list_heart_rates(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<HeartRateRecord>> {
        self.check_online()?;
        let tables = self.tables.lock().await;

        let mut records: Vec<HeartRateRecord> = tables
            .heart_rates
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn delete_heart_rate(&self, user_id: i64, id: &str) -> StoreResult<bool> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        let owned = tables
            .heart_rates
            .get(id)
            .is_some_and(|r| r.user_id == user_id);
        if owned {
            tables.heart_rates.remove(id);
        }

        Ok(owned)
    }

    async fn delete_heart_rates(&self, user_id: i64, ids: &[String]) -> StoreResult<u64> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        let mut deleted = 0;
        for id in ids {
            let owned = tables
                .heart_rates
                .get(id)
                .is_some_and(|r| r.user_id == user_id);
            if owned {
                tables.heart_rates.remove(id);
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn revoke_token(
        &self,
        jti: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        tables
            .revoked
            .entry(jti.to_string())
            .or_insert_with(|| RevokedToken {
                jti: jti.to_string(),
                user_id,
                expires_at,
            });

        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.revoked.contains_key(jti))
    }

    async fn purge_expired_revocations(&self) -> StoreResult<u64> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;

        let before = tables.revoked.len();
        tables.revoked.retain(|_, token| !is_expired(token.expires_at));

        Ok((before - tables.revoked.len()) as u64)
    }
}
