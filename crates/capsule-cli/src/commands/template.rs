use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use tracing::info;

use capsule_core::TemplateKind;
use capsule_state::NetworkState;
use capsule_template::{TemplateRequest, template_node_sets};

#[derive(Args, Debug)]
pub struct NodeSetsArgs {
    /// Template type, one of: vega, tendermint, data-node, visor-run
    #[arg(long = "type")]
    pub kind: TemplateKind,

    /// Path to the template file
    #[arg(long)]
    pub path: PathBuf,

    /// Template the given node sets. Takes a comma separated list.
    #[arg(long = "nodeset-name", value_delimiter = ',')]
    pub node_set_names: Vec<String>,

    /// Template every node set of the given groups. Takes a comma separated list.
    #[arg(long = "nodeset-group-name", value_delimiter = ',')]
    pub node_set_group_names: Vec<String>,

    /// Merge the templated config with the one generated at bootstrap
    #[arg(long)]
    pub with_merge: bool,

    /// Write the result into the network instead of the output directory
    #[arg(long)]
    pub update_network: bool,

    /// Output directory (default: <home>/templates)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

pub fn node_sets(home: &Path, args: NodeSetsArgs) -> anyhow::Result<()> {
    let template = read_template(&args.path)?;
    let state = NetworkState::load(home).context("failed to load network state")?;

    let request = TemplateRequest {
        kind: args.kind,
        template,
        node_set_names: args.node_set_names,
        node_set_group_names: args.node_set_group_names,
        with_merge: args.with_merge,
        update_network: args.update_network,
        out_dir: args.out_dir.unwrap_or_else(|| home.join("templates")),
    };

    let written = template_node_sets(&state, &request)?;
    for path in &written {
        info!(path = %path.display(), "config written");
    }
    Ok(())
}

/// Read a template file as raw bytes. Only UTF-8 text is accepted.
fn read_template(path: &Path) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read template {}", path.display()))?;
    String::from_utf8(bytes)
        .with_context(|| format!("template {} is not valid UTF-8", path.display()))
}
