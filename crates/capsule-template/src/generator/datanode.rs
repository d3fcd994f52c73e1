use serde::Serialize;

use capsule_core::{Config, NodeMode, NodeSet, TemplateKind};

use super::context::NodeSetContext;
use super::{ConfigGenerator, init_error, render_context, render_error};
use crate::error::TemplateResult;
use crate::template::ConfigTemplate;

pub struct DataNodeGenerator {
    network_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DataNodeContext<'a> {
    network_name: &'a str,
    node_set: NodeSetContext<'a>,
    node_mode: NodeMode,
    node_number: usize,
    node_home_dir: &'a str,
    data_node_binary_path: &'a str,
    vega_home_dir: &'a str,
}

impl DataNodeGenerator {
    pub fn new(config: &Config, node_sets: &[NodeSet]) -> TemplateResult<Self> {
        if !node_sets.iter().any(|ns| ns.data_node.is_some()) {
            return Err(init_error(
                TemplateKind::DataNode,
                "no node set runs a data node",
            ));
        }
        Ok(Self {
            network_name: config.network.name.clone(),
        })
    }
}

impl ConfigGenerator for DataNodeGenerator {
    fn kind(&self) -> TemplateKind {
        TemplateKind::DataNode
    }

    fn render(&self, ns: &NodeSet, tmpl: &ConfigTemplate) -> TemplateResult<Vec<u8>> {
        let dn = ns
            .data_node
            .as_ref()
            .ok_or_else(|| render_error(ns, "node set has no data node"))?;
        let context = DataNodeContext {
            network_name: &self.network_name,
            node_set: NodeSetContext::from(ns),
            node_mode: ns.mode,
            node_number: ns.index,
            node_home_dir: &dn.home_dir,
            data_node_binary_path: &dn.binary_path,
            vega_home_dir: &ns.vega.home_dir,
        };
        render_context(ns, tmpl, &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::generator::tests::{config, node_set};
    use std::path::Path;

    #[test]
    fn renders_data_node_home() {
        let ns = node_set(Path::new("/net"), 3, "f0", "full");
        let generator = DataNodeGenerator::new(&config(), std::slice::from_ref(&ns)).unwrap();
        let tmpl = ConfigTemplate::parse(
            TemplateKind::DataNode,
            "[API]\nPort = 30{{NodeNumber}}7\nHome = \"{{NodeHomeDir}}\"",
        )
        .unwrap();
        let out = String::from_utf8(generator.render(&ns, &tmpl).unwrap()).unwrap();
        assert_eq!(out, "[API]\nPort = 3037\nHome = \"/net/f0/data-node\"");
    }

    #[test]
    fn node_set_without_data_node_fails_render() {
        let home = Path::new("/net");
        let node_sets = vec![node_set(home, 0, "v0", "validators"), node_set(home, 1, "f0", "full")];
        let generator = DataNodeGenerator::new(&config(), &node_sets).unwrap();
        let tmpl = ConfigTemplate::parse(TemplateKind::DataNode, "x = 1").unwrap();
        assert!(matches!(
            generator.render(&node_sets[0], &tmpl),
            Err(TemplateError::Render { index: 0, .. })
        ));
    }

    #[test]
    fn network_without_data_nodes_fails_init() {
        let ns = node_set(Path::new("/net"), 0, "v0", "validators");
        assert!(matches!(
            DataNodeGenerator::new(&config(), &[ns]),
            Err(TemplateError::GeneratorInit { .. })
        ));
    }
}
