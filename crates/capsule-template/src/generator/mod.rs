//! Config generators, one per template kind.
//!
//! A generator turns a node set into the context its template renders
//! against. Merging the rendered text into the node's existing config is
//! shared by every kind.

mod context;
pub mod datanode;
pub mod tendermint;
pub mod vega;
pub mod visor;

use std::fs;

use serde::Serialize;

use capsule_core::{Config, GeneratedServices, NodeSet, TemplateKind};

use crate::error::{TemplateError, TemplateResult};
use crate::merge::merge_toml;
use crate::template::ConfigTemplate;

pub use datanode::DataNodeGenerator;
pub use tendermint::TendermintGenerator;
pub use vega::VegaGenerator;
pub use visor::VisorGenerator;

pub trait ConfigGenerator {
    fn kind(&self) -> TemplateKind;

    /// Render `tmpl` for a single node set.
    fn render(&self, ns: &NodeSet, tmpl: &ConfigTemplate) -> TemplateResult<Vec<u8>>;

    /// Render `tmpl` and merge the result over the node set's current
    /// on-disk config of this kind.
    fn render_and_merge(&self, ns: &NodeSet, tmpl: &ConfigTemplate) -> TemplateResult<Vec<u8>> {
        let rendered = self.render(ns, tmpl)?;
        let path = self
            .kind()
            .config_path(ns)
            .ok_or_else(|| render_error(ns, format!("node set has no {} config", self.kind())))?;
        let existing = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;

        let rendered = String::from_utf8_lossy(&rendered);
        merge_toml(&existing, &rendered)
            .map(String::into_bytes)
            .map_err(|reason| TemplateError::Merge {
                index: ns.index,
                name: ns.name.clone(),
                reason,
            })
    }
}

/// Generator of each template kind.
pub enum Generator {
    Vega(VegaGenerator),
    Tendermint(TendermintGenerator),
    DataNode(DataNodeGenerator),
    VisorRun(VisorGenerator),
}

impl Generator {
    pub fn new(
        kind: TemplateKind,
        config: &Config,
        services: &GeneratedServices,
    ) -> TemplateResult<Self> {
        let generator = match kind {
            TemplateKind::Vega => Generator::Vega(VegaGenerator::new(config, services.faucet.as_ref())?),
            TemplateKind::Tendermint => {
                Generator::Tendermint(TendermintGenerator::new(&services.node_sets)?)
            }
            TemplateKind::DataNode => {
                Generator::DataNode(DataNodeGenerator::new(config, &services.node_sets)?)
            }
            TemplateKind::VisorRun => {
                Generator::VisorRun(VisorGenerator::new(config, &services.node_sets)?)
            }
        };
        Ok(generator)
    }

    fn inner(&self) -> &dyn ConfigGenerator {
        match self {
            Generator::Vega(g) => g,
            Generator::Tendermint(g) => g,
            Generator::DataNode(g) => g,
            Generator::VisorRun(g) => g,
        }
    }
}

impl ConfigGenerator for Generator {
    fn kind(&self) -> TemplateKind {
        self.inner().kind()
    }

    fn render(&self, ns: &NodeSet, tmpl: &ConfigTemplate) -> TemplateResult<Vec<u8>> {
        self.inner().render(ns, tmpl)
    }

    fn render_and_merge(&self, ns: &NodeSet, tmpl: &ConfigTemplate) -> TemplateResult<Vec<u8>> {
        self.inner().render_and_merge(ns, tmpl)
    }
}

fn render_error(ns: &NodeSet, reason: impl Into<String>) -> TemplateError {
    TemplateError::Render {
        index: ns.index,
        name: ns.name.clone(),
        reason: reason.into(),
    }
}

fn render_context<T: Serialize>(
    ns: &NodeSet,
    tmpl: &ConfigTemplate,
    context: &T,
) -> TemplateResult<Vec<u8>> {
    tmpl.render(context).map_err(|reason| render_error(ns, reason))
}

fn init_error(kind: TemplateKind, reason: impl Into<String>) -> TemplateError {
    TemplateError::GeneratorInit {
        kind,
        reason: reason.into(),
    }
}
