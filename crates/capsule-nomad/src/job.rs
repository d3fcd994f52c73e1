//! Nomad job descriptors and the builders for every workload shape.
//!
//! Field names follow the Nomad HTTP API (`PascalCase`). Every job built
//! here has exactly one task group, a restart policy of zero attempts in
//! `fail` mode, and the job id equal to the workload's logical name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use capsule_core::config::{DockerConfig, FaucetConfig, WalletConfig};
use capsule_core::{Faucet, JobId, NodeSet, Wallet};

pub const DATACENTER: &str = "dc1";
pub const TASK_CPU_MHZ: u32 = 500;
pub const TASK_MEMORY_MB: u32 = 512;
pub const DOCKER_TASK_MEMORY_MB: u32 = 768;

/// Task group name shared by node set and wallet jobs.
const VEGA_GROUP: &str = "vega";
const WALLET_TASK: &str = "wallet-1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    #[serde(rename = "ID")]
    pub id: JobId,
    pub name: String,
    pub datacenters: Vec<String>,
    pub task_groups: Vec<TaskGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TaskGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<NetworkResource>,
    pub restart_policy: RestartPolicy,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkResource {
    pub reserved_ports: Vec<Port>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Port {
    pub label: String,
    pub value: u16,
    pub to: u16,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RestartPolicy {
    pub attempts: u32,
    pub mode: RestartMode,
}

impl RestartPolicy {
    /// No restarts: a crashed task fails its job.
    pub const FAIL_FAST: RestartPolicy = RestartPolicy {
        attempts: 0,
        mode: RestartMode::Fail,
    };
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RestartMode {
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    pub name: String,
    pub driver: Driver,
    pub config: TaskConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    pub resources: Resources,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    Docker,
    RawExec,
}

/// Driver specific task configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TaskConfig {
    Docker {
        image: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
        args: Vec<String>,
        ports: Vec<String>,
    },
    RawExec {
        command: String,
        args: Vec<String>,
    },
}

impl TaskConfig {
    pub fn command(&self) -> Option<&str> {
        match self {
            TaskConfig::Docker { command, .. } => command.as_deref(),
            TaskConfig::RawExec { command, .. } => Some(command),
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            TaskConfig::Docker { args, .. } | TaskConfig::RawExec { args, .. } => args,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resources {
    #[serde(rename = "CPU")]
    pub cpu: u32,
    #[serde(rename = "MemoryMB")]
    pub memory_mb: u32,
}

impl Resources {
    fn task() -> Self {
        Self {
            cpu: TASK_CPU_MHZ,
            memory_mb: TASK_MEMORY_MB,
        }
    }
}

impl Job {
    /// Pre-start auxiliary container.
    pub fn docker(conf: &DockerConfig) -> Self {
        let mut networks = Vec::new();
        let mut port_labels = Vec::new();
        if let Some(port) = conf.static_port {
            let label = format!("{}-port", conf.name);
            networks.push(NetworkResource {
                reserved_ports: vec![Port {
                    label: label.clone(),
                    value: port.value,
                    to: port.to,
                }],
            });
            port_labels.push(label);
        }

        let task = Task {
            name: conf.name.clone(),
            driver: Driver::Docker,
            config: TaskConfig::Docker {
                image: conf.image.clone(),
                command: conf.command.clone(),
                args: conf.args.clone(),
                ports: port_labels,
            },
            env: conf.env.clone(),
            resources: Resources {
                cpu: TASK_CPU_MHZ,
                memory_mb: DOCKER_TASK_MEMORY_MB,
            },
        };

        single_group(&conf.name, &conf.name, networks, vec![task])
    }

    /// Tendermint, vega and the optional data node of one node set.
    pub fn node_set(vega_binary: &str, ns: &NodeSet) -> Self {
        let mut tasks = Vec::with_capacity(3);
        tasks.push(raw_exec(
            &ns.tendermint.name,
            vega_binary,
            ["tm", "node", "--home", ns.tendermint.home_dir.as_str()],
        ));
        tasks.push(raw_exec(
            &ns.vega.name,
            vega_binary,
            [
                "node",
                "--home",
                ns.vega.home_dir.as_str(),
                "--nodewallet-passphrase-file",
                ns.vega.node_wallet_pass_file_path.as_str(),
            ],
        ));
        if let Some(dn) = &ns.data_node {
            tasks.push(raw_exec(
                &dn.name,
                &dn.binary_path,
                ["node", "--home", dn.home_dir.as_str()],
            ));
        }

        single_group(&ns.name, VEGA_GROUP, Vec::new(), tasks)
    }

    pub fn faucet(vega_binary: &str, conf: &FaucetConfig, faucet: &Faucet) -> Self {
        let task = raw_exec(
            &conf.name,
            vega_binary,
            [
                "faucet",
                "run",
                "--passphrase-file",
                faucet.wallet_pass_file_path.as_str(),
                "--home",
                faucet.home_dir.as_str(),
            ],
        );
        single_group(&faucet.name, &conf.name, Vec::new(), vec![task])
    }

    pub fn wallet(conf: &WalletConfig, wallet: &Wallet) -> Self {
        let task = raw_exec(
            WALLET_TASK,
            &conf.binary,
            [
                "service",
                "run",
                "--network",
                wallet.network.as_str(),
                "--automatic-consent",
                "--no-version-check",
                "--output",
                "json",
                "--home",
                wallet.home_dir.as_str(),
            ],
        );
        single_group(&wallet.name, VEGA_GROUP, Vec::new(), vec![task])
    }

    /// The job's only task group.
    pub fn task_group(&self) -> Option<&TaskGroup> {
        self.task_groups.first()
    }
}

fn raw_exec<'a>(name: &str, command: &str, args: impl IntoIterator<Item = &'a str>) -> Task {
    Task {
        name: name.to_string(),
        driver: Driver::RawExec,
        config: TaskConfig::RawExec {
            command: command.to_string(),
            args: args.into_iter().map(str::to_string).collect(),
        },
        env: BTreeMap::new(),
        resources: Resources::task(),
    }
}

fn single_group(
    id: &str,
    group_name: &str,
    networks: Vec<NetworkResource>,
    tasks: Vec<Task>,
) -> Job {
    Job {
        id: id.to_string(),
        name: id.to_string(),
        datacenters: vec![DATACENTER.to_string()],
        task_groups: vec![TaskGroup {
            name: group_name.to_string(),
            networks,
            restart_policy: RestartPolicy::FAIL_FAST,
            tasks,
        }],
    }
}
