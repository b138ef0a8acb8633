//! In-memory Moira backend for unit tests.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use moira_client::{
    ApiError, ApiResult, Trigger, TriggerReader, TriggerWriter, TtlState, WriteResponse,
};
use serde_json::Value;

use crate::params::{Desired, TriggerParams};

pub(crate) fn params(id: &str) -> TriggerParams {
    TriggerParams {
        api_url: "http://localhost/api/".into(),
        auth_custom: None,
        auth_user: None,
        auth_pass: None,
        login: None,
        timeout_secs: 30,
        state: Desired::Present,
        id: id.into(),
        name: "Trigger 1".into(),
        tags: vec!["Service".into(), "Project".into()],
        targets: vec!["prefix.target1.postfix".into()],
        warn_value: Some(300.0),
        error_value: Some(600.0),
        trigger_type: None,
        expression: String::new(),
        ttl: 600,
        ttl_state: TtlState::Nodata,
        is_remote: false,
        trigger_source: None,
        cluster_id: None,
        desc: "trigger test description".into(),
        mute_new_metrics: false,
        disabled_days: BTreeSet::new(),
        timezone_offset: 0,
        start_hour: 0,
        start_minute: 0,
        end_hour: 23,
        end_minute: 59,
        alone_metrics: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeMoira {
    stored: Mutex<Option<Trigger>>,
    fail_writes: Option<(u16, String)>,
    check_result: Option<Value>,
    pub fetches: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl FakeMoira {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(trigger: Trigger) -> Self {
        Self {
            stored: Mutex::new(Some(trigger)),
            ..Self::default()
        }
    }

    pub fn failing_writes(mut self, status: u16, body: &str) -> Self {
        self.fail_writes = Some((status, body.to_string()));
        self
    }

    pub fn with_check_result(mut self, check_result: Value) -> Self {
        self.check_result = Some(check_result);
        self
    }

    pub fn stored(&self) -> Option<Trigger> {
        self.stored.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check_failure(&self, url: &str) -> ApiResult<()> {
        match &self.fail_writes {
            Some((status, body)) => Err(ApiError::Status {
                url: url.to_string(),
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }

    fn response(&self, id: &str) -> WriteResponse {
        WriteResponse {
            id: Some(id.to_string()),
            check_result: self.check_result.clone(),
        }
    }
}

#[async_trait]
impl TriggerReader for FakeMoira {
    async fn fetch_by_id(&self, id: &str) -> ApiResult<Option<Trigger>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let stored = self.stored.lock().unwrap();
        Ok(stored.as_ref().filter(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl TriggerWriter for FakeMoira {
    async fn create(&self, trigger: &Trigger) -> ApiResult<WriteResponse> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check_failure("fake://trigger")?;
        *self.stored.lock().unwrap() = Some(trigger.clone());
        Ok(self.response(&trigger.id))
    }

    async fn update(&self, trigger: &Trigger) -> ApiResult<WriteResponse> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.check_failure(&format!("fake://trigger/{}", trigger.id))?;
        *self.stored.lock().unwrap() = Some(trigger.clone());
        Ok(self.response(&trigger.id))
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_failure(&format!("fake://trigger/{id}"))?;
        self.stored.lock().unwrap().take();
        Ok(())
    }
}
