//! JobRunner: starts and stops a network on the scheduler.
//!
//! Start happens in two phases: every pre-start container first, then
//! faucet, wallet and node sets together. Within a phase all jobs are
//! submitted concurrently in a [`CancelScope`], so the first failure
//! cancels the remaining waits. Nothing is retried and nothing is stopped
//! automatically; a failed start hands the partial [`NetworkJobs`] back to
//! the caller.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use capsule_core::config::FaucetConfig;
use capsule_core::{Config, GeneratedServices, JobId, NetworkJobs, NodeSet};

use crate::error::{GatewayError, RunnerError, RunnerResult, StartNetworkError};
use crate::gateway::JobScheduler;
use crate::job::Job;
use crate::scope::CancelScope;

/// Runs network jobs through a [`JobScheduler`].
#[derive(Clone)]
pub struct JobRunner {
    scheduler: Arc<dyn JobScheduler>,
}

impl JobRunner {
    pub fn new(scheduler: Arc<dyn JobScheduler>) -> Self {
        Self { scheduler }
    }

    /// Start the whole network.
    ///
    /// On success every recorded job is running. On failure the returned
    /// error carries every job whose launch was attempted, which the caller
    /// is expected to pass to [`JobRunner::stop_network`].
    pub async fn start_network(
        &self,
        cancel: &CancellationToken,
        conf: &Config,
        services: &GeneratedServices,
    ) -> Result<NetworkJobs, StartNetworkError> {
        let result = Arc::new(Mutex::new(NetworkJobs::default()));

        // ── Pre-start phase ────────────────────────────────────────
        let pre_start = &conf.network.pre_start.docker;
        let mut scope = CancelScope::<RunnerError>::new(cancel);
        for dc in pre_start {
            let job = Job::docker(dc);
            let scheduler = self.scheduler.clone();
            let result = result.clone();
            scope.spawn(move |token| async move {
                scheduler
                    .run_and_wait(&job, &token)
                    .await
                    .map_err(|source| RunnerError::PreStartFailed {
                        name: job.id.clone(),
                        source,
                    })?;
                result.lock().await.extra_job_ids.insert(job.id);
                Ok(())
            });
        }
        if !scope.is_empty() {
            debug!(jobs = scope.len(), "waiting for pre-start jobs");
        }
        if let Err(e) = scope.wait().await {
            let mut partial = std::mem::take(&mut *result.lock().await);
            partial
                .extra_job_ids
                .extend(pre_start.iter().map(|dc| dc.name.clone()));
            return Err(start_failure(cancel, partial, e));
        }

        // ── Dependency services phase ──────────────────────────────
        let wallet_job = match (&services.wallet, &conf.network.wallet) {
            (Some(wallet), Some(wallet_conf)) => Some(Job::wallet(wallet_conf, wallet)),
            (Some(wallet), None) => {
                let partial = std::mem::take(&mut *result.lock().await);
                return Err(StartNetworkError {
                    partial,
                    source: RunnerError::DependencyFailed {
                        name: wallet.name.clone(),
                        source: GatewayError::InvalidJob {
                            job: wallet.name.clone(),
                            reason: "network has no wallet config".to_string(),
                        },
                    },
                });
            }
            (None, _) => None,
        };
        let faucet_job = services.faucet.as_ref().map(|faucet| {
            let faucet_conf = conf.network.faucet.clone().unwrap_or_else(|| FaucetConfig {
                name: faucet.name.clone(),
            });
            Job::faucet(&conf.vega_binary_path, &faucet_conf, faucet)
        });

        let mut attempted = NetworkJobs::default();
        let mut scope = CancelScope::<RunnerError>::new(cancel);

        if let Some(job) = faucet_job {
            attempted.faucet_job_id = job.id.clone();
            let scheduler = self.scheduler.clone();
            let result = result.clone();
            scope.spawn(move |token| async move {
                scheduler
                    .run_and_wait(&job, &token)
                    .await
                    .map_err(|source| RunnerError::DependencyFailed {
                        name: job.id.clone(),
                        source,
                    })?;
                result.lock().await.faucet_job_id = job.id;
                Ok(())
            });
        }

        if let Some(job) = wallet_job {
            attempted.wallet_job_id = job.id.clone();
            let scheduler = self.scheduler.clone();
            let result = result.clone();
            scope.spawn(move |token| async move {
                scheduler
                    .run_and_wait(&job, &token)
                    .await
                    .map_err(|source| RunnerError::DependencyFailed {
                        name: job.id.clone(),
                        source,
                    })?;
                result.lock().await.wallet_job_id = job.id;
                Ok(())
            });
        }

        let node_set_jobs = build_node_set_jobs(&conf.vega_binary_path, &services.node_sets);
        attempted
            .node_set_job_ids
            .extend(node_set_jobs.iter().map(|j| j.id.clone()));
        {
            let scheduler = self.scheduler.clone();
            let result = result.clone();
            scope.spawn(move |token| async move {
                let jobs = launch_node_sets(scheduler, &token, node_set_jobs).await?;
                result
                    .lock()
                    .await
                    .node_set_job_ids
                    .extend(jobs.into_iter().map(|j| j.id));
                Ok(())
            });
        }

        if let Err(e) = scope.wait().await {
            let mut partial = std::mem::take(&mut *result.lock().await);
            partial.node_set_job_ids.extend(attempted.node_set_job_ids);
            if partial.faucet_job_id.is_empty() {
                partial.faucet_job_id = attempted.faucet_job_id;
            }
            if partial.wallet_job_id.is_empty() {
                partial.wallet_job_id = attempted.wallet_job_id;
            }
            return Err(start_failure(cancel, partial, e));
        }

        let jobs = std::mem::take(&mut *result.lock().await);
        info!(
            node_sets = jobs.node_set_job_ids.len(),
            extra = jobs.extra_job_ids.len(),
            faucet = !jobs.faucet_job_id.is_empty(),
            wallet = !jobs.wallet_job_id.is_empty(),
            "network started"
        );
        Ok(jobs)
    }

    /// Build and run one job per node set, all at once.
    ///
    /// Returns the submitted jobs once every one of them is running. On
    /// failure, jobs already submitted stay on the scheduler.
    pub async fn run_node_sets(
        &self,
        cancel: &CancellationToken,
        vega_binary: &str,
        node_sets: &[NodeSet],
    ) -> RunnerResult<Vec<Job>> {
        let jobs = build_node_set_jobs(vega_binary, node_sets);
        launch_node_sets(self.scheduler.clone(), cancel, jobs)
            .await
            .map_err(|e| canceled_or(cancel, e))
    }

    /// Stop the jobs of a started network. `nodes_only` keeps pre-start,
    /// faucet and wallet jobs running.
    pub async fn stop_network(
        &self,
        cancel: &CancellationToken,
        jobs: Option<&NetworkJobs>,
        nodes_only: bool,
    ) -> RunnerResult<()> {
        // no jobs, no network started
        let Some(jobs) = jobs else {
            return Ok(());
        };

        let mut ids: Vec<JobId> = Vec::new();
        if !nodes_only {
            ids.extend(jobs.extra_job_ids.iter().cloned());
            ids.push(jobs.wallet_job_id.clone());
            ids.push(jobs.faucet_job_id.clone());
        }
        ids.extend(jobs.node_set_job_ids.iter().cloned());

        self.stop_jobs(cancel, &ids).await?;
        info!(nodes_only, "network stopped");
        Ok(())
    }

    /// Stop and purge the given jobs concurrently. Empty ids are skipped.
    pub async fn stop_jobs(&self, cancel: &CancellationToken, job_ids: &[JobId]) -> RunnerResult<()> {
        let mut scope = CancelScope::<RunnerError>::new(cancel);
        for job_id in job_ids.iter().filter(|id| !id.is_empty()) {
            let job_id = job_id.clone();
            let scheduler = self.scheduler.clone();
            scope.spawn(move |token| async move {
                scheduler
                    .stop(&job_id, true, &token)
                    .await
                    .map_err(|source| RunnerError::StopFailed {
                        job: job_id.clone(),
                        source,
                    })
            });
        }

        if scope.is_empty() {
            return Ok(());
        }
        debug!(jobs = scope.len(), "stopping jobs");
        scope.wait().await.map_err(|e| canceled_or(cancel, e))
    }
}

fn build_node_set_jobs(vega_binary: &str, node_sets: &[NodeSet]) -> Vec<Job> {
    node_sets
        .iter()
        .map(|ns| Job::node_set(vega_binary, ns))
        .collect()
}

async fn launch_node_sets(
    scheduler: Arc<dyn JobScheduler>,
    cancel: &CancellationToken,
    jobs: Vec<Job>,
) -> RunnerResult<Vec<Job>> {
    let mut scope = CancelScope::<RunnerError>::new(cancel);
    for job in jobs.iter().cloned() {
        let scheduler = scheduler.clone();
        scope.spawn(move |token| async move {
            scheduler
                .run_and_wait(&job, &token)
                .await
                .map_err(|source| RunnerError::DependencyFailed {
                    name: job.id.clone(),
                    source,
                })
        });
    }
    if let Err(e) = scope.wait().await {
        warn!(error = %e, "failed to wait for node sets");
        return Err(e);
    }
    Ok(jobs)
}

/// Report cancellation of the caller's token as such, whatever task
/// noticed it first.
fn canceled_or(cancel: &CancellationToken, e: RunnerError) -> RunnerError {
    if cancel.is_cancelled() {
        RunnerError::Canceled
    } else {
        e
    }
}

fn start_failure(cancel: &CancellationToken, partial: NetworkJobs, e: RunnerError) -> StartNetworkError {
    let source = canceled_or(cancel, e);
    warn!(error = %source, "network start failed");
    StartNetworkError { partial, source }
}
