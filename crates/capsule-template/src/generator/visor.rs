//! Visor run config: which binaries the upgrade manager starts for a
//! node set and with which home directories.

use serde::Serialize;

use capsule_core::{Config, NodeSet, TemplateKind};

use super::context::NodeSetContext;
use super::{ConfigGenerator, init_error, render_context, render_error};
use crate::error::TemplateResult;
use crate::template::ConfigTemplate;

pub struct VisorGenerator {
    vega_binary_path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VisorContext<'a> {
    node_set: NodeSetContext<'a>,
    visor_home_dir: &'a str,
    visor_binary_path: &'a str,
    vega_binary_path: &'a str,
    vega_home_dir: &'a str,
    node_wallet_pass_file_path: &'a str,
    tendermint_home_dir: &'a str,
    data_node_home_dir: Option<&'a str>,
    data_node_binary_path: Option<&'a str>,
}

impl VisorGenerator {
    pub fn new(config: &Config, node_sets: &[NodeSet]) -> TemplateResult<Self> {
        if !node_sets.iter().any(|ns| ns.visor.is_some()) {
            return Err(init_error(TemplateKind::VisorRun, "no node set runs visor"));
        }
        Ok(Self {
            vega_binary_path: config.vega_binary_path.clone(),
        })
    }
}

impl ConfigGenerator for VisorGenerator {
    fn kind(&self) -> TemplateKind {
        TemplateKind::VisorRun
    }

    fn render(&self, ns: &NodeSet, tmpl: &ConfigTemplate) -> TemplateResult<Vec<u8>> {
        let visor = ns
            .visor
            .as_ref()
            .ok_or_else(|| render_error(ns, "node set has no visor"))?;
        let context = VisorContext {
            node_set: NodeSetContext::from(ns),
            visor_home_dir: &visor.home_dir,
            visor_binary_path: &visor.binary_path,
            vega_binary_path: &self.vega_binary_path,
            vega_home_dir: &ns.vega.home_dir,
            node_wallet_pass_file_path: &ns.vega.node_wallet_pass_file_path,
            tendermint_home_dir: &ns.tendermint.home_dir,
            data_node_home_dir: ns.data_node.as_ref().map(|dn| dn.home_dir.as_str()),
            data_node_binary_path: ns.data_node.as_ref().map(|dn| dn.binary_path.as_str()),
        };
        render_context(ns, tmpl, &context)
    }
}
