//! Async client for the trigger endpoints of the Moira alerting API.
//!
//! The crate exposes the wire model of a trigger, the [`TriggerReader`] and
//! [`TriggerWriter`] capabilities used by the reconciliation layer, and
//! [`MoiraClient`], their HTTP implementation.

pub mod auth;
pub mod client;
pub mod error;
pub mod model;
pub mod traits;

pub use auth::AuthConfig;
pub use client::{DEFAULT_TIMEOUT, MoiraClient};
pub use error::{ApiError, ApiResult};
pub use model::{
    Day, Schedule, Trigger, TriggerSource, TriggerType, TtlState, Weekday, WriteResponse,
};
pub use traits::{TriggerReader, TriggerWriter};
