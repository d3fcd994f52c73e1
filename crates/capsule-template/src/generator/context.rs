//! Template-facing view of a node set.
//!
//! Templates address node set fields in PascalCase (`{{NodeSet.Name}}`,
//! `{{NodeSet.Vega.HomeDir}}`). The persisted `NodeSet` keeps its own
//! field names, so generators render against this borrowed view instead.

use serde::Serialize;

use capsule_core::{DataNode, NodeMode, NodeSet, TendermintNode, VegaNode, VisorNode};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct NodeSetContext<'a> {
    index: usize,
    name: &'a str,
    group_name: &'a str,
    mode: NodeMode,
    vega: VegaContext<'a>,
    tendermint: TendermintContext<'a>,
    data_node: Option<DataNodeContext<'a>>,
    visor: Option<VisorContext<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VegaContext<'a> {
    name: &'a str,
    home_dir: &'a str,
    node_wallet_pass_file_path: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TendermintContext<'a> {
    name: &'a str,
    home_dir: &'a str,
    genesis_file_path: &'a str,
    #[serde(rename = "NodeID")]
    node_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DataNodeContext<'a> {
    name: &'a str,
    home_dir: &'a str,
    binary_path: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VisorContext<'a> {
    home_dir: &'a str,
    binary_path: &'a str,
}

impl<'a> From<&'a NodeSet> for NodeSetContext<'a> {
    fn from(ns: &'a NodeSet) -> Self {
        Self {
            index: ns.index,
            name: &ns.name,
            group_name: &ns.group_name,
            mode: ns.mode,
            vega: VegaContext::from(&ns.vega),
            tendermint: TendermintContext::from(&ns.tendermint),
            data_node: ns.data_node.as_ref().map(DataNodeContext::from),
            visor: ns.visor.as_ref().map(VisorContext::from),
        }
    }
}

impl<'a> From<&'a VegaNode> for VegaContext<'a> {
    fn from(node: &'a VegaNode) -> Self {
        Self {
            name: &node.name,
            home_dir: &node.home_dir,
            node_wallet_pass_file_path: &node.node_wallet_pass_file_path,
        }
    }
}

impl<'a> From<&'a TendermintNode> for TendermintContext<'a> {
    fn from(node: &'a TendermintNode) -> Self {
        Self {
            name: &node.name,
            home_dir: &node.home_dir,
            genesis_file_path: &node.genesis_file_path,
            node_id: &node.node_id,
        }
    }
}

impl<'a> From<&'a DataNode> for DataNodeContext<'a> {
    fn from(node: &'a DataNode) -> Self {
        Self {
            name: &node.name,
            home_dir: &node.home_dir,
            binary_path: &node.binary_path,
        }
    }
}

impl<'a> From<&'a VisorNode> for VisorContext<'a> {
    fn from(node: &'a VisorNode) -> Self {
        Self {
            home_dir: &node.home_dir,
            binary_path: &node.binary_path,
        }
    }
}
