//! Heart Rate Service
//!
//! Recording, listing and deleting a user's heart rate samples.

use std::sync::Arc;
use thiserror::Error;

use crate::database::{Store, StoreError};
use crate::models::{
    requests::{BatchDeleteRequest, BatchDeleteResponse, CreateHeartRateRequest, ListHeartRateQuery},
    HeartRateResponse, NewHeartRate,
};
use crate::utils::{error::AppError, security::generate_record_id};

/// Errors raised by the heart rate service
#[derive(Error, Debug)]
pub enum HeartRateServiceError {
    /// The id is already used by another user's sample
    #[error("Duplicate entry")]
    DuplicateEntry,

    /// No sample with this id belongs to the user
    #[error("Record not found")]
    RecordNotFound,

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<HeartRateServiceError> for AppError {
    fn from(err: HeartRateServiceError) -> Self {
        match err {
            HeartRateServiceError::DuplicateEntry => {
                AppError::Conflict("Duplicate entry".to_string())
            }
            HeartRateServiceError::RecordNotFound => {
                AppError::NotFound("Record not found".to_string())
            }
            HeartRateServiceError::Store(e) => AppError::from(e),
        }
    }
}

/// Result type for heart rate operations
pub type HeartRateServiceResult<T> = Result<T, HeartRateServiceError>;

/// Heart rate sample management
#[derive(Clone)]
pub struct HeartRateService {
    store: Arc<dyn Store>,
}

impl HeartRateService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Store a sample.
    ///
    /// Retrying with an id the user already recorded returns the stored
    /// sample untouched, so clients can resend after a lost response.
    pub async fn create(
        &self,
        user_id: i64,
        request: CreateHeartRateRequest,
    ) -> HeartRateServiceResult<HeartRateResponse> {
        let id = request.id.unwrap_or_else(generate_record_id);

        let record = NewHeartRate {
            id: id.clone(),
            user_id,
            bpm: request.bpm,
            recorded_at: request.recorded_at,
        };

        match self.store.insert_heart_rate(record).await {
            Ok(created) => {
                log::info!("Recorded heart rate {} for user {}", created.id, user_id);
                Ok(created.into())
            }
            Err(StoreError::Conflict(_)) => match self.store.find_heart_rate(user_id, &id).await? {
                Some(existing) => {
                    log::debug!("Heart rate {} already recorded for user {}", id, user_id);
                    Ok(existing.into())
                }
                None => Err(HeartRateServiceError::DuplicateEntry),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Page through the user's samples, newest first
    pub async fn list(
        &self,
        user_id: i64,
        query: ListHeartRateQuery,
    ) -> HeartRateServiceResult<Vec<HeartRateResponse>> {
        let records = self
            .store
            .list_heart_rates(user_id, query.limit, query.offset)
            .await?;

        Ok(records.into_iter().map(HeartRateResponse::from).collect())
    }

    /// Delete one of the user's samples
    pub async fn delete(&self, user_id: i64, id: &str) -> HeartRateServiceResult<()> {
        if !self.store.delete_heart_rate(user_id, id).await? {
            return Err(HeartRateServiceError::RecordNotFound);
        }

        log::info!("Deleted heart rate {} for user {}", id, user_id);
        Ok(())
    }

    /// Delete several samples; ids the user does not own are skipped
    pub async fn batch_delete(
        &self,
        user_id: i64,
        request: BatchDeleteRequest,
    ) -> HeartRateServiceResult<BatchDeleteResponse> {
        let deleted = self.store.delete_heart_rates(user_id, &request.ids).await?;

        log::info!(
            "Batch deleted {} of {} heart rate samples for user {}",
            deleted,
            request.ids.len(),
            user_id
        );
        Ok(BatchDeleteResponse { deleted })
    }
}
