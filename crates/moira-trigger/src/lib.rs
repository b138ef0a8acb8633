//! Declarative reconciliation of a single Moira trigger.
//!
//! One invocation builds a [`Preimage`] from its [`TriggerParams`], looks the
//! stored trigger up and then creates, updates or deletes it so the Moira API
//! matches the desired state. See [`execute`].

pub mod cli;
pub mod entity;
pub mod manager;
pub mod observability;
pub mod output;
pub mod params;
pub mod preimage;
pub mod schedule;

#[cfg(test)]
mod testing;

use moira_client::{TriggerReader, TriggerWriter};

pub use entity::{MoiraTrigger, TriggerField};
pub use manager::{OperationError, Outcome, ReconcileError, Status, TriggerManager};
pub use output::{FailureDocument, Report, ResultDocument};
pub use params::{Desired, ParamsError, TriggerParams, load_params};
pub use preimage::Preimage;

/// Runs one reconciliation against `api` and reports the outcome.
///
/// Failures are reported in the returned [`Report`], never raised.
pub async fn execute<A>(api: &A, params: &TriggerParams, dry_run: bool) -> Report
where
    A: TriggerReader + TriggerWriter + ?Sized,
{
    let mut trigger = MoiraTrigger::new(api, Preimage::from_params(params));
    let mut manager = TriggerManager::new(api, dry_run);

    let outcome = manager.define_state(params.state, &mut trigger).await;
    if let Err(err) = &outcome {
        tracing::error!(trigger_id = %params.id, error = %err, "reconciliation failed");
    }
    Report::from_outcome(outcome, manager.changed())
}
