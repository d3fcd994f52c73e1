//! NetworkState: JSON-backed persistence for a bootstrapped network.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use capsule_core::{Config, GeneratedServices, NetworkJobs, NodeSet, TemplateKind};

use crate::error::{StateError, StateResult};

/// File name of the persisted state inside the network home directory.
pub const STATE_FILE_NAME: &str = "network-state.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkState {
    pub config: Option<Config>,
    pub generated_services: Option<GeneratedServices>,
    /// Jobs of the running network, if it was started.
    pub running_jobs: Option<NetworkJobs>,
    #[serde(skip)]
    home: PathBuf,
}

impl NetworkState {
    /// Create a bootstrapped state rooted at `home`. Nothing is written
    /// until [`NetworkState::save`] is called.
    pub fn new(home: &Path, config: Config, generated_services: GeneratedServices) -> Self {
        Self {
            config: Some(config),
            generated_services: Some(generated_services),
            running_jobs: None,
            home: home.to_path_buf(),
        }
    }

    /// Load the state stored under `home`. A missing file is an empty state.
    pub fn load(home: &Path) -> StateResult<Self> {
        let path = home.join(STATE_FILE_NAME);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "no network state found");
                return Ok(Self {
                    home: home.to_path_buf(),
                    ..Self::default()
                });
            }
            Err(source) => return Err(StateError::Read { path, source }),
        };

        let mut state: NetworkState =
            serde_json::from_slice(&content).map_err(|e| StateError::Deserialize {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        state.home = home.to_path_buf();

        if let Some(services) = &state.generated_services {
            services.validate()?;
        }

        debug!(?path, "network state loaded");
        Ok(state)
    }

    /// Persist the state under its home directory.
    pub fn save(&self) -> StateResult<()> {
        let path = self.home.join(STATE_FILE_NAME);
        let content =
            serde_json::to_vec_pretty(self).map_err(|e| StateError::Serialize(e.to_string()))?;
        write_file(&path, &content)?;
        debug!(?path, "network state saved");
        Ok(())
    }

    /// True iff the network has not been bootstrapped.
    pub fn empty(&self) -> bool {
        self.config.is_none() || self.generated_services.is_none()
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Config of a bootstrapped network.
    pub fn config(&self) -> StateResult<&Config> {
        self.config.as_ref().ok_or(StateError::NotBootstrapped)
    }

    /// Generated services of a bootstrapped network.
    pub fn services(&self) -> StateResult<&GeneratedServices> {
        self.generated_services
            .as_ref()
            .ok_or(StateError::NotBootstrapped)
    }

    /// Node sets in index order; empty when not bootstrapped.
    pub fn node_sets(&self) -> &[NodeSet] {
        self.generated_services
            .as_ref()
            .map(|s| s.node_sets.as_slice())
            .unwrap_or_default()
    }

    /// Replace the on-disk `kind` config of the node set at `node_index`.
    pub fn update_node_config(
        &self,
        kind: TemplateKind,
        node_index: usize,
        content: &[u8],
    ) -> StateResult<PathBuf> {
        let ns = self
            .services()?
            .node_set_by_index(node_index)
            .ok_or(StateError::NodeSetNotFound(node_index))?;

        let path = kind
            .config_path(ns)
            .ok_or_else(|| StateError::MissingSubnode {
                node_set: ns.name.clone(),
                kind: kind.to_string(),
            })?;

        write_file(&path, content)?;
        debug!(node_set = %ns.name, %kind, ?path, "node config updated");
        Ok(path)
    }
}

/// Truncate-create-write, creating parent directories as needed.
fn write_file(path: &Path, content: &[u8]) -> StateResult<()> {
    let write_err = |source| StateError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, content).map_err(write_err)
}
