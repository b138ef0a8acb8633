//! A trigger as seen by one invocation: the desired preimage plus the
//! stored image, once fetched.

use moira_client::{ApiResult, Trigger, TriggerReader};

use crate::preimage::Preimage;

/// Fields of a trigger that take part in reconciliation.
///
/// The identifier is the stable key and never appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerField {
    Name,
    Desc,
    Targets,
    WarnValue,
    ErrorValue,
    TriggerType,
    Tags,
    TtlState,
    Ttl,
    Expression,
    IsRemote,
    TriggerSource,
    ClusterId,
    MuteNewMetrics,
    AloneMetrics,
    Sched,
}

impl TriggerField {
    pub const ALL: [TriggerField; 16] = [
        TriggerField::Name,
        TriggerField::Desc,
        TriggerField::Targets,
        TriggerField::WarnValue,
        TriggerField::ErrorValue,
        TriggerField::TriggerType,
        TriggerField::Tags,
        TriggerField::TtlState,
        TriggerField::Ttl,
        TriggerField::Expression,
        TriggerField::IsRemote,
        TriggerField::TriggerSource,
        TriggerField::ClusterId,
        TriggerField::MuteNewMetrics,
        TriggerField::AloneMetrics,
        TriggerField::Sched,
    ];

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Desc => "desc",
            Self::Targets => "targets",
            Self::WarnValue => "warn_value",
            Self::ErrorValue => "error_value",
            Self::TriggerType => "trigger_type",
            Self::Tags => "tags",
            Self::TtlState => "ttl_state",
            Self::Ttl => "ttl",
            Self::Expression => "expression",
            Self::IsRemote => "is_remote",
            Self::TriggerSource => "trigger_source",
            Self::ClusterId => "cluster_id",
            Self::MuteNewMetrics => "mute_new_metrics",
            Self::AloneMetrics => "alone_metrics",
            Self::Sched => "sched",
        }
    }

    /// The classification is copied on merge but never makes a trigger "changed".
    pub fn counts_as_change(self) -> bool {
        self != Self::TriggerType
    }

    /// Copies the field from `desired` into `image` if they differ.
    ///
    /// Returns whether `image` was overwritten. Tags are compared as sets:
    /// the image's tags are sorted in place first.
    pub fn merge(self, desired: &Trigger, image: &mut Trigger) -> bool {
        match self {
            Self::Name => sync(&mut image.name, &desired.name),
            Self::Desc => sync(&mut image.desc, &desired.desc),
            Self::Targets => sync(&mut image.targets, &desired.targets),
            Self::WarnValue => sync(&mut image.warn_value, &desired.warn_value),
            Self::ErrorValue => sync(&mut image.error_value, &desired.error_value),
            Self::TriggerType => sync(&mut image.trigger_type, &desired.trigger_type),
            Self::Tags => {
                image.tags.sort();
                sync(&mut image.tags, &desired.tags)
            }
            Self::TtlState => sync(&mut image.ttl_state, &desired.ttl_state),
            Self::Ttl => sync(&mut image.ttl, &desired.ttl),
            Self::Expression => sync(&mut image.expression, &desired.expression),
            Self::IsRemote => sync(&mut image.is_remote, &desired.is_remote),
            Self::TriggerSource => sync(&mut image.trigger_source, &desired.trigger_source),
            Self::ClusterId => sync_if_set(&mut image.cluster_id, &desired.cluster_id),
            Self::MuteNewMetrics => sync(&mut image.mute_new_metrics, &desired.mute_new_metrics),
            Self::AloneMetrics => sync_if_set(&mut image.alone_metrics, &desired.alone_metrics),
            Self::Sched => sync(&mut image.sched, &desired.sched),
        }
    }
}

fn sync<T: PartialEq + Clone>(current: &mut T, desired: &T) -> bool {
    if current == desired {
        return false;
    }
    current.clone_from(desired);
    true
}

fn sync_if_set<T: PartialEq + Clone>(current: &mut Option<T>, desired: &Option<T>) -> bool {
    if desired.is_none() {
        return false;
    }
    sync(current, desired)
}

/// Reconciliation view of a single trigger.
pub struct MoiraTrigger<'a, R: TriggerReader + ?Sized> {
    reader: &'a R,
    preimage: Preimage,
    image: Option<Trigger>,
}

impl<'a, R: TriggerReader + ?Sized> MoiraTrigger<'a, R> {
    pub fn new(reader: &'a R, preimage: Preimage) -> Self {
        Self {
            reader,
            preimage,
            image: None,
        }
    }

    pub fn id(&self) -> &str {
        self.preimage.id()
    }

    pub fn preimage(&self) -> &Preimage {
        &self.preimage
    }

    /// Looks the stored trigger up and keeps the result.
    ///
    /// Every call hits the API again so changes made by someone else during
    /// the invocation are seen.
    pub async fn has_image(&mut self) -> ApiResult<bool> {
        self.image = self.reader.fetch_by_id(self.preimage.id()).await?;
        tracing::debug!(
            trigger_id = %self.preimage.id(),
            found = self.image.is_some(),
            "looked up stored trigger"
        );
        Ok(self.image.is_some())
    }

    /// Stored trigger from the last lookup.
    pub fn image(&self) -> Option<&Trigger> {
        self.image.as_ref()
    }

    pub fn take_image(&mut self) -> Option<Trigger> {
        self.image.take()
    }

    /// Copies every differing preimage field into `image`.
    ///
    /// Returns true iff at least one field other than the classification differed.
    pub fn merge_with(&self, image: &mut Trigger) -> bool {
        let desired = self.preimage.record();
        let mut score = 0usize;

        for field in TriggerField::ALL {
            if field.merge(desired, image) {
                tracing::debug!(
                    trigger_id = %desired.id,
                    field = field.name(),
                    "stored trigger differs"
                );
                if field.counts_as_change() {
                    score += 1;
                }
            }
        }

        score != 0
    }
}
