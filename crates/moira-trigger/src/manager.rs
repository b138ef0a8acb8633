//! Create, update and delete one trigger so the stored state matches the preimage.
//!
//! Every operation performs at most one lookup followed by at most one write.
//! There is no retry and no version check before overwriting: each invocation
//! is assumed to be the only writer for its identifier.

use moira_client::{ApiError, TriggerReader, TriggerWriter};
use serde_json::{Map, Value};

use crate::entity::MoiraTrigger;
use crate::params::Desired;

/// Errors raised while reconciling a trigger.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("stored trigger {0} was not loaded")]
    ImageNotLoaded(String),
}

impl ReconcileError {
    /// Category name reported as `failed.error`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Api(err) => err.kind(),
            Self::ImageNotLoaded(_) => "RuntimeError",
        }
    }

    /// Raw response text for errors returned by the API.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Api(err) => err.response_body(),
            Self::ImageNotLoaded(_) => None,
        }
    }
}

/// A failed manager operation.
#[derive(Debug, thiserror::Error)]
#[error("{method} failed: {source}")]
pub struct OperationError {
    /// Name of the operation that failed (`edit` or `remove`).
    pub method: &'static str,
    #[source]
    pub source: ReconcileError,
}

impl OperationError {
    fn new(method: &'static str, source: ReconcileError) -> Self {
        Self { method, source }
    }
}

/// What happened to the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotFound,
    Removed,
    Created,
    Updated,
    Unchanged,
}

impl Status {
    pub fn message(self) -> &'static str {
        match self {
            Self::NotFound => "no id found for trigger",
            Self::Removed => "trigger has been removed",
            Self::Created => "trigger has been created",
            Self::Updated => "trigger has been updated",
            Self::Unchanged => "trigger has not been updated, it is already consistent",
        }
    }
}

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub id: String,
    pub status: Status,
    /// Check-result warnings returned by the API on write.
    pub warnings: Vec<Value>,
}

impl Outcome {
    fn new(id: &str, status: Status) -> Self {
        Self {
            id: id.to_string(),
            status,
            warnings: Vec::new(),
        }
    }

    fn with_warnings(mut self, warnings: Vec<Value>) -> Self {
        self.warnings = warnings;
        self
    }

    /// The `result` map of the output document.
    ///
    /// `{"<id>": "<message>"}`, plus a `WARN` list when the API reported
    /// check-result warnings.
    pub fn to_result(&self) -> Value {
        let mut map = Map::new();
        if !self.warnings.is_empty() {
            map.insert("WARN".to_string(), Value::Array(self.warnings.clone()));
        }
        map.insert(
            self.id.clone(),
            Value::String(self.status.message().to_string()),
        );
        Value::Object(map)
    }
}

/// Applies a desired state to a trigger.
pub struct TriggerManager<'a, W: TriggerWriter + ?Sized> {
    writer: &'a W,
    dry_run: bool,
    changed: bool,
}

impl<'a, W: TriggerWriter + ?Sized> TriggerManager<'a, W> {
    /// In dry-run mode no write is issued but the same messages are reported.
    pub fn new(writer: &'a W, dry_run: bool) -> Self {
        Self {
            writer,
            dry_run,
            changed: false,
        }
    }

    /// Whether any write has been performed.
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub async fn define_state<R: TriggerReader + ?Sized>(
        &mut self,
        desired: Desired,
        trigger: &mut MoiraTrigger<'_, R>,
    ) -> Result<Outcome, OperationError> {
        match desired {
            Desired::Present => self.edit(trigger).await,
            Desired::Absent => self.remove(trigger).await,
        }
    }

    /// Deletes the trigger if it exists.
    pub async fn remove<R: TriggerReader + ?Sized>(
        &mut self,
        trigger: &mut MoiraTrigger<'_, R>,
    ) -> Result<Outcome, OperationError> {
        self.try_remove(trigger)
            .await
            .map_err(|e| OperationError::new("remove", e))
    }

    /// Creates the trigger, or updates it if the stored record differs.
    pub async fn edit<R: TriggerReader + ?Sized>(
        &mut self,
        trigger: &mut MoiraTrigger<'_, R>,
    ) -> Result<Outcome, OperationError> {
        self.try_edit(trigger)
            .await
            .map_err(|e| OperationError::new("edit", e))
    }

    async fn try_remove<R: TriggerReader + ?Sized>(
        &mut self,
        trigger: &mut MoiraTrigger<'_, R>,
    ) -> Result<Outcome, ReconcileError> {
        if !trigger.has_image().await? {
            return Ok(Outcome::new(trigger.id(), Status::NotFound));
        }

        if self.dry_run {
            tracing::info!(trigger_id = %trigger.id(), "dry run, skipping delete");
        } else {
            self.writer.delete(trigger.id()).await?;
            self.changed = true;
            tracing::info!(trigger_id = %trigger.id(), "trigger deleted");
        }

        Ok(Outcome::new(trigger.id(), Status::Removed))
    }

    async fn try_edit<R: TriggerReader + ?Sized>(
        &mut self,
        trigger: &mut MoiraTrigger<'_, R>,
    ) -> Result<Outcome, ReconcileError> {
        if !trigger.has_image().await? {
            let outcome = Outcome::new(trigger.id(), Status::Created);
            if self.dry_run {
                tracing::info!(trigger_id = %trigger.id(), "dry run, skipping create");
                return Ok(outcome);
            }
            let response = self.writer.create(&trigger.preimage().to_trigger()).await?;
            self.changed = true;
            tracing::info!(trigger_id = %trigger.id(), "trigger created");
            return Ok(outcome.with_warnings(response.warnings()));
        }

        let mut image = trigger
            .take_image()
            .ok_or_else(|| ReconcileError::ImageNotLoaded(trigger.id().to_string()))?;

        if !trigger.merge_with(&mut image) {
            tracing::info!(trigger_id = %trigger.id(), "trigger already consistent");
            return Ok(Outcome::new(trigger.id(), Status::Unchanged));
        }

        let outcome = Outcome::new(trigger.id(), Status::Updated);
        if self.dry_run {
            tracing::info!(trigger_id = %trigger.id(), "dry run, skipping update");
            return Ok(outcome);
        }
        let response = self.writer.update(&image).await?;
        self.changed = true;
        tracing::info!(trigger_id = %trigger.id(), "trigger updated");
        Ok(outcome.with_warnings(response.warnings()))
    }
}

#[cfg(test)]
mod tests {
    use moira_client::TriggerType;
    use serde_json::json;

    use super::*;
    use crate::preimage::Preimage;
    use crate::testing::{FakeMoira, params};

    fn preimage() -> Preimage {
        Preimage::from_params(&params("trigger_1"))
    }

    #[tokio::test]
    async fn test_remove_missing_trigger() {
        let api = FakeMoira::empty();
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let outcome = manager.remove(&mut trigger).await.unwrap();
        assert_eq!(outcome.to_result(), json!({"trigger_1": "no id found for trigger"}));
        assert!(!manager.changed());
        assert_eq!(FakeMoira::count(&api.deletes), 0);
    }

    #[tokio::test]
    async fn test_remove_existing_trigger() {
        let api = FakeMoira::with(preimage().to_trigger());
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let outcome = manager.remove(&mut trigger).await.unwrap();
        assert_eq!(outcome.status, Status::Removed);
        assert!(manager.changed());
        assert_eq!(FakeMoira::count(&api.deletes), 1);
        assert!(api.stored().is_none());
    }

    #[tokio::test]
    async fn test_remove_in_dry_run_reports_removed() {
        let api = FakeMoira::with(preimage().to_trigger());
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, true);

        let outcome = manager.remove(&mut trigger).await.unwrap();
        assert_eq!(outcome.to_result(), json!({"trigger_1": "trigger has been removed"}));
        assert!(!manager.changed());
        assert_eq!(FakeMoira::count(&api.deletes), 0);
        assert!(api.stored().is_some());
    }

    #[tokio::test]
    async fn test_edit_creates_missing_trigger() {
        let api = FakeMoira::empty();
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let outcome = manager.edit(&mut trigger).await.unwrap();
        assert_eq!(outcome.to_result(), json!({"trigger_1": "trigger has been created"}));
        assert!(manager.changed());
        assert_eq!(FakeMoira::count(&api.creates), 1);
        assert_eq!(FakeMoira::count(&api.updates), 0);
        assert_eq!(api.stored().as_ref(), Some(preimage().record()));
    }

    #[tokio::test]
    async fn test_edit_create_in_dry_run() {
        let api = FakeMoira::empty();
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, true);

        let outcome = manager.edit(&mut trigger).await.unwrap();
        assert_eq!(outcome.status, Status::Created);
        assert!(!manager.changed());
        assert_eq!(FakeMoira::count(&api.creates), 0);
    }

    #[tokio::test]
    async fn test_edit_consistent_trigger() {
        let mut stored = preimage().to_trigger();
        stored.tags.reverse();
        let api = FakeMoira::with(stored);
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let outcome = manager.edit(&mut trigger).await.unwrap();
        assert_eq!(
            outcome.to_result(),
            json!({"trigger_1": "trigger has not been updated, it is already consistent"})
        );
        assert!(!manager.changed());
        assert_eq!(FakeMoira::count(&api.updates), 0);
    }

    #[tokio::test]
    async fn test_edit_updates_differing_trigger() {
        let mut stored = preimage().to_trigger();
        stored.warn_value = Some(1.0);
        stored.desc = "outdated".into();
        let api = FakeMoira::with(stored);
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let outcome = manager.edit(&mut trigger).await.unwrap();
        assert_eq!(outcome.status, Status::Updated);
        assert!(manager.changed());
        assert_eq!(FakeMoira::count(&api.updates), 1);
        assert_eq!(api.stored().as_ref(), Some(preimage().record()));
    }

    #[tokio::test]
    async fn test_edit_update_in_dry_run() {
        let mut stored = preimage().to_trigger();
        stored.ttl = 30;
        let api = FakeMoira::with(stored);
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, true);

        let outcome = manager.edit(&mut trigger).await.unwrap();
        assert_eq!(outcome.status, Status::Updated);
        assert!(!manager.changed());
        assert_eq!(FakeMoira::count(&api.updates), 0);
        assert_eq!(api.stored().map(|t| t.ttl), Some(30));
    }

    #[tokio::test]
    async fn test_classification_only_difference_is_not_written() {
        let mut stored = preimage().to_trigger();
        stored.trigger_type = Some(TriggerType::Rising);
        let api = FakeMoira::with(stored);
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let outcome = manager.edit(&mut trigger).await.unwrap();
        assert_eq!(outcome.status, Status::Unchanged);
        assert_eq!(FakeMoira::count(&api.updates), 0);
    }

    #[tokio::test]
    async fn test_check_result_is_attached() {
        let api = FakeMoira::empty().with_check_result(json!({"targets": ["t1 is invalid"]}));
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let outcome = manager.edit(&mut trigger).await.unwrap();
        assert_eq!(
            outcome.to_result(),
            json!({
                "trigger_1": "trigger has been created",
                "WARN": [{"targets": ["t1 is invalid"]}]
            })
        );
    }

    #[tokio::test]
    async fn test_empty_check_result_is_dropped() {
        let api = FakeMoira::empty().with_check_result(json!(""));
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let outcome = manager.edit(&mut trigger).await.unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_names_operation() {
        let api = FakeMoira::empty().failing_writes(500, "{\"error\":\"storage unavailable\"}");
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let err = manager
            .define_state(Desired::Present, &mut trigger)
            .await
            .unwrap_err();
        assert_eq!(err.method, "edit");
        assert_eq!(err.source.kind(), "ResponseStatusError");
        assert_eq!(
            err.source.response_body(),
            Some("{\"error\":\"storage unavailable\"}")
        );
        assert!(!manager.changed());
    }

    #[tokio::test]
    async fn test_define_state_dispatch() {
        let api = FakeMoira::empty();
        let mut trigger = MoiraTrigger::new(&api, preimage());
        let mut manager = TriggerManager::new(&api, false);

        let created = manager
            .define_state(Desired::Present, &mut trigger)
            .await
            .unwrap();
        assert_eq!(created.status, Status::Created);

        let again = manager
            .define_state(Desired::Present, &mut trigger)
            .await
            .unwrap();
        assert_eq!(again.status, Status::Unchanged);

        let removed = manager
            .define_state(Desired::Absent, &mut trigger)
            .await
            .unwrap();
        assert_eq!(removed.status, Status::Removed);
        assert!(manager.changed());
        assert_eq!(FakeMoira::count(&api.fetches), 3);
    }
}
