//! Gateway and orchestrator error types.

use std::time::Duration;

use thiserror::Error;

use capsule_core::{JobId, NetworkJobs};

/// Errors returned by a [`crate::JobScheduler`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("job {job} rejected by scheduler: {reason}")]
    InvalidJob { job: JobId, reason: String },

    #[error("job {job} did not reach running state within {after:?}")]
    StartTimeout { job: JobId, after: Duration },

    #[error("job {job} is unhealthy: {reason}")]
    Unhealthy { job: JobId, reason: String },

    #[error("scheduler transport error for job {job}: {reason}")]
    Transport { job: JobId, reason: String },

    #[error("canceled")]
    Canceled,
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors of the start/stop protocols.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to run pre start job {name}: {source}")]
    PreStartFailed { name: JobId, source: GatewayError },

    #[error("failed to run {name}: {source}")]
    DependencyFailed { name: JobId, source: GatewayError },

    #[error("cannot stop nomad job {job:?}: {source}")]
    StopFailed { job: JobId, source: GatewayError },

    #[error("canceled")]
    Canceled,
}

pub type RunnerResult<T> = Result<T, RunnerError>;

/// A failed start together with every job whose launch was attempted.
///
/// Stopping is idempotent, so the whole partial record can be handed to
/// [`crate::JobRunner::stop_network`].
#[derive(Debug, Error)]
#[error("failed to start network: {source}")]
pub struct StartNetworkError {
    pub partial: NetworkJobs,
    #[source]
    pub source: RunnerError,
}
