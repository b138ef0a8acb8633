//! Capabilities the reconciliation layer needs from a Moira backend.
//!
//! Reads and writes are split so a component that only looks triggers up
//! cannot modify them.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::model::{Trigger, WriteResponse};

/// Read access to stored triggers.
#[async_trait]
pub trait TriggerReader: Send + Sync {
    /// Looks a trigger up by its identifier.
    ///
    /// Returns `None` if the trigger does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures or malformed responses,
    /// never for a missing trigger.
    async fn fetch_by_id(&self, id: &str) -> ApiResult<Option<Trigger>>;
}

/// Write access to stored triggers.
#[async_trait]
pub trait TriggerWriter: Send + Sync {
    /// Stores a new trigger under `trigger.id`.
    async fn create(&self, trigger: &Trigger) -> ApiResult<WriteResponse>;

    /// Overwrites the stored trigger with the same id.
    ///
    /// There is no version check: the last writer wins.
    async fn update(&self, trigger: &Trigger) -> ApiResult<WriteResponse>;

    /// Deletes a trigger by identifier.
    async fn delete(&self, id: &str) -> ApiResult<()>;
}
