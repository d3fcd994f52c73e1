use serde::Serialize;

use capsule_core::{Config, Faucet, NodeMode, NodeSet, TemplateKind};

use super::context::NodeSetContext;
use super::{ConfigGenerator, init_error, render_context};
use crate::error::TemplateResult;
use crate::template::ConfigTemplate;

/// Generates vega node configs. Holds the network faucet so every node
/// can be pointed at it.
pub struct VegaGenerator {
    network_name: String,
    vega_binary_path: String,
    eth_endpoint: String,
    faucet: Option<Faucet>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VegaContext<'a> {
    network_name: &'a str,
    node_set: NodeSetContext<'a>,
    node_mode: NodeMode,
    node_home_dir: &'a str,
    tendermint_home_dir: &'a str,
    node_wallet_pass_file_path: &'a str,
    vega_binary_path: &'a str,
    #[serde(rename = "ETHEndpoint")]
    eth_endpoint: &'a str,
    faucet_public_key: &'a str,
}

impl VegaGenerator {
    pub fn new(config: &Config, faucet: Option<&Faucet>) -> TemplateResult<Self> {
        if config.vega_binary_path.is_empty() {
            return Err(init_error(TemplateKind::Vega, "vega binary path is not set"));
        }
        Ok(Self {
            network_name: config.network.name.clone(),
            vega_binary_path: config.vega_binary_path.clone(),
            eth_endpoint: config.network.ethereum_endpoint.clone().unwrap_or_default(),
            faucet: faucet.cloned(),
        })
    }
}

impl ConfigGenerator for VegaGenerator {
    fn kind(&self) -> TemplateKind {
        TemplateKind::Vega
    }

    fn render(&self, ns: &NodeSet, tmpl: &ConfigTemplate) -> TemplateResult<Vec<u8>> {
        let context = VegaContext {
            network_name: &self.network_name,
            node_set: NodeSetContext::from(ns),
            node_mode: ns.mode,
            node_home_dir: &ns.vega.home_dir,
            tendermint_home_dir: &ns.tendermint.home_dir,
            node_wallet_pass_file_path: &ns.vega.node_wallet_pass_file_path,
            vega_binary_path: &self.vega_binary_path,
            eth_endpoint: &self.eth_endpoint,
            faucet_public_key: self
                .faucet
                .as_ref()
                .map(|f| f.public_key.as_str())
                .unwrap_or_default(),
        };
        render_context(ns, tmpl, &context)
    }
}
