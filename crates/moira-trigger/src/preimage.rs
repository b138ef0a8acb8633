//! Desired state of a trigger, built once per invocation from its parameters.

use moira_client::{Trigger, TriggerSource};

use crate::params::TriggerParams;
use crate::schedule::build_schedule;

/// The caller-declared record for one trigger.
///
/// `cluster_id` and `alone_metrics` stay `None` when the caller did not set
/// them; such fields are left alone on the stored trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Preimage {
    record: Trigger,
}

impl Preimage {
    pub fn from_params(params: &TriggerParams) -> Self {
        let mut tags = params.tags.clone();
        tags.sort();
        tags.dedup();

        let trigger_source = params
            .trigger_source
            .unwrap_or_else(|| TriggerSource::from_is_remote(params.is_remote));

        let record = Trigger {
            id: params.id.clone(),
            name: params.name.clone(),
            desc: params.desc.clone(),
            targets: params.targets.clone(),
            warn_value: params.warn_value,
            error_value: params.error_value,
            trigger_type: params.trigger_type,
            tags,
            ttl_state: params.ttl_state,
            ttl: params.ttl,
            expression: params.expression.clone(),
            is_remote: trigger_source == TriggerSource::GraphiteRemote,
            trigger_source: Some(trigger_source),
            cluster_id: params.cluster_id.clone(),
            mute_new_metrics: params.mute_new_metrics,
            alone_metrics: params.alone_metrics.clone(),
            sched: build_schedule(
                &params.disabled_days,
                (params.start_hour, params.start_minute),
                (params.end_hour, params.end_minute),
                params.timezone_offset,
            ),
        };

        Self { record }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn record(&self) -> &Trigger {
        &self.record
    }

    /// Full outgoing record for a create call.
    pub fn to_trigger(&self) -> Trigger {
        self.record.clone()
    }
}
