//! Network start/stop against an in-memory scheduler.
//!
//! The fake scheduler keeps an event log of submissions, running
//! transitions and stops so the tests can assert on phase ordering and
//! on the exact set of jobs touched.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use capsule_core::config::{
    DockerConfig, FaucetConfig, NetworkConfig, PreStartConfig, WalletConfig,
};
use capsule_core::{
    Config, DataNode, Faucet, GeneratedServices, NetworkJobs, NodeMode, NodeSet, TendermintNode,
    VegaNode, Wallet,
};
use capsule_nomad::{GatewayError, GatewayFuture, Job, JobRunner, JobScheduler, RunnerError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Submitted(String),
    Running(String),
    Stopped(String),
}

#[derive(Default)]
struct FakeScheduler {
    events: Mutex<Vec<Event>>,
    jobs: Mutex<BTreeMap<String, Job>>,
    /// Rejected on submit.
    reject: HashSet<String>,
    /// Never reach running; return once canceled.
    hang: HashSet<String>,
    delay: Duration,
}

impl FakeScheduler {
    fn rejecting(id: &str) -> Self {
        Self {
            reject: [id.to_string()].into(),
            ..Default::default()
        }
    }

    fn hanging(id: &str) -> Self {
        Self {
            hang: [id.to_string()].into(),
            ..Default::default()
        }
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn submitted(&self) -> BTreeSet<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Submitted(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn stopped(&self) -> BTreeSet<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Stopped(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn running(&self) -> BTreeSet<String> {
        self.jobs.lock().unwrap().keys().cloned().collect()
    }

    fn job(&self, id: &str) -> Option<Job> {
        self.jobs.lock().unwrap().get(id).cloned()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl JobScheduler for FakeScheduler {
    fn run_and_wait<'a>(&'a self, job: &'a Job, cancel: &'a CancellationToken) -> GatewayFuture<'a> {
        Box::pin(async move {
            self.push(Event::Submitted(job.id.clone()));
            if self.reject.contains(&job.id) {
                return Err(GatewayError::InvalidJob {
                    job: job.id.clone(),
                    reason: "400: job validation failed".to_string(),
                });
            }
            if self.hang.contains(&job.id) {
                cancel.cancelled().await;
                return Err(GatewayError::Canceled);
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(GatewayError::Canceled),
                _ = tokio::time::sleep(self.delay) => {}
            }
            self.jobs.lock().unwrap().insert(job.id.clone(), job.clone());
            self.push(Event::Running(job.id.clone()));
            Ok(())
        })
    }

    fn stop<'a>(
        &'a self,
        job_id: &'a str,
        _purge: bool,
        _cancel: &'a CancellationToken,
    ) -> GatewayFuture<'a> {
        Box::pin(async move {
            self.jobs.lock().unwrap().remove(job_id);
            self.push(Event::Stopped(job_id.to_string()));
            Ok(())
        })
    }
}

fn node_set(index: usize, name: &str, with_data_node: bool) -> NodeSet {
    NodeSet {
        index,
        name: name.to_string(),
        group_name: "validators".to_string(),
        mode: NodeMode::Validator,
        vega: VegaNode {
            name: format!("vega-{name}"),
            home_dir: format!("/net/{name}/vega"),
            node_wallet_pass_file_path: format!("/net/{name}/pass"),
        },
        tendermint: TendermintNode {
            name: format!("tendermint-{name}"),
            home_dir: format!("/net/{name}/tm"),
            genesis_file_path: format!("/net/{name}/tm/genesis.json"),
            node_id: format!("id-{index}"),
        },
        data_node: with_data_node.then(|| DataNode {
            name: format!("data-node-{name}"),
            home_dir: format!("/net/{name}/dn"),
            binary_path: "/bin/data-node".to_string(),
        }),
        visor: None,
    }
}

fn pg() -> DockerConfig {
    DockerConfig {
        name: "pg".to_string(),
        image: "postgres:14".to_string(),
        command: None,
        args: vec![],
        static_port: None,
        env: BTreeMap::new(),
    }
}

fn config(pre_start: Vec<DockerConfig>) -> Config {
    Config {
        vega_binary_path: "/bin/vega".to_string(),
        network: NetworkConfig {
            name: "testnet".to_string(),
            ethereum_endpoint: None,
            pre_start: PreStartConfig { docker: pre_start },
            faucet: None,
            wallet: None,
        },
    }
}

fn two_node_sets() -> GeneratedServices {
    GeneratedServices {
        node_sets: vec![node_set(0, "n0", true), node_set(1, "n1", false)],
        faucet: None,
        wallet: None,
    }
}

fn with_faucet_and_wallet(conf: &mut Config, services: &mut GeneratedServices) {
    conf.network.faucet = Some(FaucetConfig {
        name: "faucet-1".to_string(),
    });
    conf.network.wallet = Some(WalletConfig {
        name: "wallet".to_string(),
        binary: "/bin/vegawallet".to_string(),
    });
    services.faucet = Some(Faucet {
        name: "faucet".to_string(),
        home_dir: "/net/faucet".to_string(),
        public_key: "pk".to_string(),
        config_file_path: "/net/faucet/config.toml".to_string(),
        wallet_file_path: "/net/faucet/wallet".to_string(),
        wallet_pass_file_path: "/net/faucet/pass".to_string(),
    });
    services.wallet = Some(Wallet {
        name: "wallet".to_string(),
        home_dir: "/net/wallet".to_string(),
        network: "testnet".to_string(),
        service_config_file_path: "/net/wallet/config.toml".to_string(),
        public_key_file_path: "/net/wallet/pub".to_string(),
        private_key_file_path: "/net/wallet/priv".to_string(),
    });
}

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn start_and_stop_network() {
    let scheduler = Arc::new(FakeScheduler::default());
    let runner = JobRunner::new(scheduler.clone());
    let cancel = CancellationToken::new();

    let jobs = runner
        .start_network(&cancel, &config(vec![pg()]), &two_node_sets())
        .await
        .unwrap();

    assert_eq!(jobs.extra_job_ids, ids(&["pg"]));
    assert_eq!(jobs.node_set_job_ids, ids(&["n0", "n1"]));
    assert_eq!(jobs.faucet_job_id, "");
    assert_eq!(jobs.wallet_job_id, "");
    assert_eq!(scheduler.running(), ids(&["n0", "n1", "pg"]));

    // Node set jobs carry two or three tasks.
    assert_eq!(scheduler.job("n0").unwrap().task_groups[0].tasks.len(), 3);
    assert_eq!(scheduler.job("n1").unwrap().task_groups[0].tasks.len(), 2);

    runner.stop_network(&cancel, Some(&jobs), false).await.unwrap();
    assert_eq!(scheduler.stopped(), ids(&["n0", "n1", "pg"]));
    assert!(scheduler.running().is_empty());
}

#[tokio::test]
async fn stop_nodes_only_keeps_extra_jobs() {
    let scheduler = Arc::new(FakeScheduler::default());
    let runner = JobRunner::new(scheduler.clone());
    let cancel = CancellationToken::new();

    let mut conf = config(vec![pg()]);
    let mut services = two_node_sets();
    with_faucet_and_wallet(&mut conf, &mut services);

    let jobs = runner.start_network(&cancel, &conf, &services).await.unwrap();
    runner.stop_network(&cancel, Some(&jobs), true).await.unwrap();

    assert_eq!(scheduler.stopped(), ids(&["n0", "n1"]));
    assert_eq!(scheduler.running(), ids(&["faucet", "pg", "wallet"]));
}

#[tokio::test]
async fn pre_start_failure_aborts_startup() {
    let scheduler = Arc::new(FakeScheduler::rejecting("pg"));
    let runner = JobRunner::new(scheduler.clone());

    let mut conf = config(vec![pg()]);
    let mut services = two_node_sets();
    with_faucet_and_wallet(&mut conf, &mut services);

    let err = runner
        .start_network(&CancellationToken::new(), &conf, &services)
        .await
        .unwrap_err();

    assert!(matches!(&err.source, RunnerError::PreStartFailed { name, .. } if name == "pg"));
    assert!(err.to_string().contains("pg"));
    assert_eq!(scheduler.submitted(), ids(&["pg"]));
    assert_eq!(err.partial.extra_job_ids, ids(&["pg"]));
    assert!(err.partial.node_set_job_ids.is_empty());
}

#[tokio::test]
async fn pre_start_jobs_run_before_dependencies() {
    let scheduler = Arc::new(FakeScheduler {
        delay: Duration::from_millis(20),
        ..Default::default()
    });
    let runner = JobRunner::new(scheduler.clone());

    let mut redis = pg();
    redis.name = "redis".to_string();
    let mut conf = config(vec![pg(), redis]);
    let mut services = two_node_sets();
    with_faucet_and_wallet(&mut conf, &mut services);

    runner
        .start_network(&CancellationToken::new(), &conf, &services)
        .await
        .unwrap();

    let events = scheduler.events();
    let last_pre_start_running = events
        .iter()
        .rposition(|e| matches!(e, Event::Running(id) if id == "pg" || id == "redis"))
        .unwrap();
    let first_dependency_submit = events
        .iter()
        .position(|e| matches!(e, Event::Submitted(id) if id != "pg" && id != "redis"))
        .unwrap();
    assert!(last_pre_start_running < first_dependency_submit);
}

#[tokio::test]
async fn every_recorded_job_is_running() {
    let scheduler = Arc::new(FakeScheduler::default());
    let runner = JobRunner::new(scheduler.clone());

    let mut conf = config(vec![pg()]);
    let mut services = two_node_sets();
    with_faucet_and_wallet(&mut conf, &mut services);

    let jobs = runner
        .start_network(&CancellationToken::new(), &conf, &services)
        .await
        .unwrap();

    assert_eq!(jobs.faucet_job_id, "faucet");
    assert_eq!(jobs.wallet_job_id, "wallet");
    let recorded: BTreeSet<String> = jobs.all_ids().into_iter().collect();
    assert_eq!(recorded, scheduler.running());
}

#[tokio::test]
async fn empty_network_starts_nothing() {
    let scheduler = Arc::new(FakeScheduler::default());
    let runner = JobRunner::new(scheduler.clone());

    let jobs = runner
        .start_network(
            &CancellationToken::new(),
            &config(vec![]),
            &GeneratedServices::default(),
        )
        .await
        .unwrap();

    assert_eq!(jobs, NetworkJobs::default());
    assert!(scheduler.events().is_empty());
}

#[tokio::test]
async fn node_set_failure_returns_partial_record() {
    let scheduler = Arc::new(FakeScheduler::rejecting("n1"));
    let runner = JobRunner::new(scheduler.clone());
    let cancel = CancellationToken::new();

    let err = runner
        .start_network(&cancel, &config(vec![pg()]), &two_node_sets())
        .await
        .unwrap_err();

    assert!(matches!(&err.source, RunnerError::DependencyFailed { name, .. } if name == "n1"));
    assert_eq!(err.partial.extra_job_ids, ids(&["pg"]));
    assert_eq!(err.partial.node_set_job_ids, ids(&["n0", "n1"]));

    // The partial record tears down whatever made it to the scheduler.
    runner
        .stop_network(&cancel, Some(&err.partial), false)
        .await
        .unwrap();
    assert!(scheduler.running().is_empty());
}

#[tokio::test]
async fn missing_wallet_config_fails_before_submitting() {
    let scheduler = Arc::new(FakeScheduler::default());
    let runner = JobRunner::new(scheduler.clone());

    let mut conf = config(vec![]);
    let mut services = two_node_sets();
    with_faucet_and_wallet(&mut conf, &mut services);
    conf.network.wallet = None;

    let err = runner
        .start_network(&CancellationToken::new(), &conf, &services)
        .await
        .unwrap_err();

    assert!(matches!(&err.source, RunnerError::DependencyFailed { name, .. } if name == "wallet"));
    assert!(scheduler.submitted().is_empty());
}

#[tokio::test]
async fn cancel_interrupts_start() {
    let scheduler = Arc::new(FakeScheduler::hanging("n0"));
    let runner = JobRunner::new(scheduler.clone());
    let cancel = CancellationToken::new();

    let start = {
        let cancel = cancel.clone();
        let runner = runner.clone();
        tokio::spawn(async move {
            runner
                .start_network(&cancel, &config(vec![]), &two_node_sets())
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let err = tokio::time::timeout(Duration::from_secs(5), start)
        .await
        .expect("start should return once canceled")
        .unwrap()
        .unwrap_err();
    assert!(matches!(err.source, RunnerError::Canceled));
    assert!(err.partial.node_set_job_ids.contains("n0"));
}

#[tokio::test]
async fn run_node_sets_returns_submitted_jobs() {
    let scheduler = Arc::new(FakeScheduler::default());
    let runner = JobRunner::new(scheduler.clone());

    let node_sets = two_node_sets().node_sets;
    let jobs = runner
        .run_node_sets(&CancellationToken::new(), "/bin/vega", &node_sets)
        .await
        .unwrap();

    let names: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(names, vec!["n0", "n1"]);
    for job in &jobs {
        assert_eq!(job.task_groups.len(), 1);
        assert_eq!(job.task_groups[0].restart_policy.attempts, 0);
    }
}

#[tokio::test]
async fn stop_jobs_twice_is_idempotent() {
    let scheduler = Arc::new(FakeScheduler::default());
    let runner = JobRunner::new(scheduler.clone());
    let cancel = CancellationToken::new();

    runner
        .start_network(&cancel, &config(vec![pg()]), &two_node_sets())
        .await
        .unwrap();

    let targets = vec!["pg".to_string(), "n0".to_string()];
    runner.stop_jobs(&cancel, &targets).await.unwrap();
    let after_first = scheduler.running();
    runner.stop_jobs(&cancel, &targets).await.unwrap();

    assert_eq!(after_first, ids(&["n1"]));
    assert_eq!(scheduler.running(), after_first);
}
