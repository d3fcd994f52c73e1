use serde::Serialize;

use capsule_core::{NodeMode, NodeSet, TemplateKind};

use super::context::NodeSetContext;
use super::{ConfigGenerator, init_error, render_context};
use crate::error::TemplateResult;
use crate::template::ConfigTemplate;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Peer {
    name: String,
    #[serde(rename = "NodeID")]
    node_id: String,
    validator: bool,
}

/// Generates tendermint configs. Every node sees the other node sets of
/// the network as peers.
pub struct TendermintGenerator {
    peers: Vec<Peer>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TendermintContext<'a> {
    node_set: NodeSetContext<'a>,
    node_mode: NodeMode,
    #[serde(rename = "NodeID")]
    node_id: &'a str,
    node_home_dir: &'a str,
    genesis_file_path: &'a str,
    validator: bool,
    peers: Vec<&'a Peer>,
    validators_count: usize,
}

impl TendermintGenerator {
    pub fn new(node_sets: &[NodeSet]) -> TemplateResult<Self> {
        let peers = node_sets
            .iter()
            .map(|ns| {
                if ns.tendermint.node_id.is_empty() {
                    return Err(init_error(
                        TemplateKind::Tendermint,
                        format!("node set {} has no tendermint node id", ns.name),
                    ));
                }
                Ok(Peer {
                    name: ns.name.clone(),
                    node_id: ns.tendermint.node_id.clone(),
                    validator: ns.mode == NodeMode::Validator,
                })
            })
            .collect::<TemplateResult<Vec<_>>>()?;
        Ok(Self { peers })
    }
}

impl ConfigGenerator for TendermintGenerator {
    fn kind(&self) -> TemplateKind {
        TemplateKind::Tendermint
    }

    fn render(&self, ns: &NodeSet, tmpl: &ConfigTemplate) -> TemplateResult<Vec<u8>> {
        let context = TendermintContext {
            node_set: NodeSetContext::from(ns),
            node_mode: ns.mode,
            node_id: &ns.tendermint.node_id,
            node_home_dir: &ns.tendermint.home_dir,
            genesis_file_path: &ns.tendermint.genesis_file_path,
            validator: ns.mode == NodeMode::Validator,
            peers: self.peers.iter().filter(|p| p.name != ns.name).collect(),
            validators_count: self.peers.iter().filter(|p| p.validator).count(),
        };
        render_context(ns, tmpl, &context)
    }
}
