use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use capsule_core::NetworkJobs;
use capsule_nomad::{ClientConfig, JobRunner, NomadClient};
use capsule_state::NetworkState;

#[derive(Args, Debug)]
pub struct NomadArgs {
    /// Nomad agent address
    #[arg(long, env = "NOMAD_ADDR", default_value = "127.0.0.1:4646")]
    pub nomad_address: String,

    /// Seconds a job may take to reach running state
    #[arg(long, default_value = "120")]
    pub start_timeout: u64,
}

impl NomadArgs {
    fn runner(&self) -> JobRunner {
        let config = ClientConfig {
            start_timeout: Duration::from_secs(self.start_timeout),
            ..ClientConfig::default().with_address(&self.nomad_address)
        };
        JobRunner::new(Arc::new(NomadClient::new(config)))
    }
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Stop only the node sets, keeping pre-start jobs, faucet and wallet
    #[arg(long)]
    pub nodes_only: bool,

    #[command(flatten)]
    pub nomad: NomadArgs,
}

#[derive(Args, Debug)]
pub struct StopJobsArgs {
    /// Job id to stop. Repeatable or comma separated.
    #[arg(long = "id", required = true, value_delimiter = ',')]
    pub ids: Vec<String>,

    #[command(flatten)]
    pub nomad: NomadArgs,
}

pub async fn start(home: &Path, args: NomadArgs, cancel: &CancellationToken) -> anyhow::Result<()> {
    let mut state = NetworkState::load(home).context("failed to load network state")?;
    let config = state.config()?.clone();
    let services = state.services()?.clone();

    if state.running_jobs.as_ref().is_some_and(|jobs| !jobs.is_empty()) {
        bail!("network is already running, stop it first");
    }

    let runner = args.runner();
    let jobs = match runner.start_network(cancel, &config, &services).await {
        Ok(jobs) => jobs,
        Err(err) => {
            warn!(jobs = ?err.partial.all_ids(), "stopping partially started network");
            // The caller's token may already be canceled.
            if let Err(e) = runner
                .stop_network(&CancellationToken::new(), Some(&err.partial), false)
                .await
            {
                warn!(error = %e, "failed to stop partially started network");
            }
            return Err(err.into());
        }
    };

    state.running_jobs = Some(jobs);
    state.save().context("failed to save network state")?;
    info!(home = %home.display(), "network running");
    Ok(())
}

pub async fn stop(home: &Path, args: StopArgs, cancel: &CancellationToken) -> anyhow::Result<()> {
    let mut state = NetworkState::load(home).context("failed to load network state")?;

    let runner = args.nomad.runner();
    runner
        .stop_network(cancel, state.running_jobs.as_ref(), args.nodes_only)
        .await?;

    state.running_jobs = match state.running_jobs.take() {
        Some(mut jobs) if args.nodes_only => {
            jobs.node_set_job_ids.clear();
            (!jobs.is_empty()).then_some(jobs)
        }
        _ => None,
    };
    if !state.empty() {
        state.save().context("failed to save network state")?;
    }
    Ok(())
}

pub async fn stop_jobs(
    home: &Path,
    args: StopJobsArgs,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let runner = args.nomad.runner();
    runner.stop_jobs(cancel, &args.ids).await?;

    let mut state = NetworkState::load(home).context("failed to load network state")?;
    if let Some(jobs) = state.running_jobs.as_mut() {
        forget_jobs(jobs, &args.ids);
        if jobs.is_empty() {
            state.running_jobs = None;
        }
        state.save().context("failed to save network state")?;
    }
    Ok(())
}

/// Drop stopped ids from the recorded jobs.
fn forget_jobs(jobs: &mut NetworkJobs, ids: &[String]) {
    for id in ids {
        jobs.node_set_job_ids.remove(id);
        jobs.extra_job_ids.remove(id);
        if jobs.faucet_job_id == *id {
            jobs.faucet_job_id.clear();
        }
        if jobs.wallet_job_id == *id {
            jobs.wallet_job_id.clear();
        }
    }
}
