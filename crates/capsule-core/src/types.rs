//! Domain types for a generated network.
//!
//! These types describe the artifacts produced when a network is
//! bootstrapped (node sets, faucet, wallet) and the job ids recorded
//! once those artifacts are running on the scheduler. All types are
//! serializable to/from JSON for the persisted network state.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduler job identifier. Always equal to the descriptor name.
pub type JobId = String;

// ── Node sets ──────────────────────────────────────────────────────

/// Operational mode of a node set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeMode {
    /// Signs blocks.
    Validator,
    /// Only observes the chain.
    Full,
}

impl fmt::Display for NodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeMode::Validator => f.write_str("validator"),
            NodeMode::Full => f.write_str("full"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VegaNode {
    /// Task name inside the node set job.
    pub name: String,
    pub home_dir: String,
    pub node_wallet_pass_file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TendermintNode {
    pub name: String,
    pub home_dir: String,
    pub genesis_file_path: String,
    pub node_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataNode {
    pub name: String,
    pub home_dir: String,
    pub binary_path: String,
}

/// Upgrade manager attached to a node set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisorNode {
    pub home_dir: String,
    pub binary_path: String,
}

/// One consensus process, one application process and optionally an
/// indexer, co-located under a shared name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSet {
    pub index: usize,
    pub name: String,
    pub group_name: String,
    pub mode: NodeMode,
    pub vega: VegaNode,
    pub tendermint: TendermintNode,
    pub data_node: Option<DataNode>,
    #[serde(default)]
    pub visor: Option<VisorNode>,
}

impl NodeSet {
    /// Check the per-mode invariants of this node set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName(self.index));
        }
        if self.mode == NodeMode::Validator {
            if self.vega.home_dir.is_empty() {
                return Err(ValidationError::MissingSubnode {
                    node_set: self.name.clone(),
                    subnode: "vega",
                });
            }
            if self.tendermint.home_dir.is_empty() {
                return Err(ValidationError::MissingSubnode {
                    node_set: self.name.clone(),
                    subnode: "tendermint",
                });
            }
        }
        Ok(())
    }
}

// ── Services ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Faucet {
    pub name: String,
    pub home_dir: String,
    pub public_key: String,
    pub config_file_path: String,
    pub wallet_file_path: String,
    pub wallet_pass_file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wallet {
    pub name: String,
    pub home_dir: String,
    pub network: String,
    pub service_config_file_path: String,
    pub public_key_file_path: String,
    pub private_key_file_path: String,
}

/// Everything produced by bootstrapping a network.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneratedServices {
    /// Ordered by `NodeSet::index`.
    pub node_sets: Vec<NodeSet>,
    pub faucet: Option<Faucet>,
    pub wallet: Option<Wallet>,
}

impl GeneratedServices {
    /// Validate every node set and the uniqueness of their names.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for ns in &self.node_sets {
            ns.validate()?;
            if !seen.insert(ns.name.as_str()) {
                return Err(ValidationError::DuplicateName(ns.name.clone()));
            }
        }
        Ok(())
    }

    pub fn node_set_by_index(&self, index: usize) -> Option<&NodeSet> {
        self.node_sets.iter().find(|ns| ns.index == index)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("node set {0} has an empty name")]
    EmptyName(usize),

    #[error("node set name is not unique: {0}")]
    DuplicateName(String),

    #[error("validator node set {node_set} is missing its {subnode} node")]
    MissingSubnode {
        node_set: String,
        subnode: &'static str,
    },
}

// ── Jobs ───────────────────────────────────────────────────────────

/// Job ids of a started network.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkJobs {
    pub node_set_job_ids: BTreeSet<JobId>,
    pub extra_job_ids: BTreeSet<JobId>,
    /// Empty when no faucet runs.
    #[serde(default)]
    pub faucet_job_id: JobId,
    /// Empty when no wallet runs.
    #[serde(default)]
    pub wallet_job_id: JobId,
}

impl NetworkJobs {
    pub fn is_empty(&self) -> bool {
        self.node_set_job_ids.is_empty()
            && self.extra_job_ids.is_empty()
            && self.faucet_job_id.is_empty()
            && self.wallet_job_id.is_empty()
    }

    /// Every recorded id, skipping the empty faucet/wallet slots.
    pub fn all_ids(&self) -> Vec<JobId> {
        self.extra_job_ids
            .iter()
            .chain(self.node_set_job_ids.iter())
            .chain([&self.faucet_job_id, &self.wallet_job_id])
            .filter(|id| !id.is_empty())
            .cloned()
            .collect()
    }
}

// ── Template kinds ─────────────────────────────────────────────────

/// Kind of per-node-set configuration artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    #[serde(rename = "vega")]
    Vega,
    #[serde(rename = "tendermint")]
    Tendermint,
    #[serde(rename = "data-node")]
    DataNode,
    #[serde(rename = "visor-run")]
    VisorRun,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Vega,
        TemplateKind::Tendermint,
        TemplateKind::DataNode,
        TemplateKind::VisorRun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Vega => "vega",
            TemplateKind::Tendermint => "tendermint",
            TemplateKind::DataNode => "data-node",
            TemplateKind::VisorRun => "visor-run",
        }
    }

    /// On-disk config file of this kind for the given node set, if the
    /// node set carries the matching subnode.
    pub fn config_path(&self, ns: &NodeSet) -> Option<std::path::PathBuf> {
        use std::path::Path;
        match self {
            TemplateKind::Vega => Some(Path::new(&ns.vega.home_dir).join("config/node/config.toml")),
            TemplateKind::Tendermint => {
                Some(Path::new(&ns.tendermint.home_dir).join("config/config.toml"))
            }
            TemplateKind::DataNode => ns
                .data_node
                .as_ref()
                .map(|dn| Path::new(&dn.home_dir).join("config/data-node/config.toml")),
            TemplateKind::VisorRun => ns
                .visor
                .as_ref()
                .map(|v| Path::new(&v.home_dir).join("genesis/run-config.toml")),
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown template type {0:?}, expected one of: vega, tendermint, data-node, visor-run")]
pub struct UnknownTemplateKind(pub String);

impl FromStr for TemplateKind {
    type Err = UnknownTemplateKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTemplateKind(s.to_string()))
    }
}
