//! Scheduler capability consumed by the orchestrator.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::GatewayResult;
use crate::job::Job;

/// Boxed future alias for scheduler calls.
pub type GatewayFuture<'a> = Pin<Box<dyn Future<Output = GatewayResult<()>> + Send + 'a>>;

/// Submit and stop jobs on a workload scheduler.
///
/// Implementations must return promptly with
/// [`crate::GatewayError::Canceled`] once `cancel` fires.
pub trait JobScheduler: Send + Sync {
    /// Submit `job` and resolve once the scheduler reports it running.
    fn run_and_wait<'a>(&'a self, job: &'a Job, cancel: &'a CancellationToken) -> GatewayFuture<'a>;

    /// Stop `job_id`, removing its record when `purge` is set. Stopping an
    /// unknown job succeeds.
    fn stop<'a>(
        &'a self,
        job_id: &'a str,
        purge: bool,
        cancel: &'a CancellationToken,
    ) -> GatewayFuture<'a>;
}
