//! Template node sets selected by name or group.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use capsule_core::{NodeSet, NodeSetFilter, TemplateKind, filter_node_sets};
use capsule_state::NetworkState;

use crate::error::{TemplateError, TemplateResult};
use crate::generator::{ConfigGenerator, Generator};
use crate::template::ConfigTemplate;

/// One `template node-sets` invocation.
#[derive(Debug, Clone)]
pub struct TemplateRequest {
    pub kind: TemplateKind,
    pub template: String,
    pub node_set_names: Vec<String>,
    pub node_set_group_names: Vec<String>,
    /// Merge the rendered output into the node's current config.
    pub with_merge: bool,
    /// Write the result into the network instead of `out_dir`.
    pub update_network: bool,
    pub out_dir: PathBuf,
}

impl TemplateRequest {
    /// File written for `ns` when the network is not updated.
    pub fn output_path(&self, ns: &NodeSet) -> PathBuf {
        self.out_dir.join(format!("{}-{}.conf", self.kind, ns.name))
    }
}

/// Render the request's template for every selected node set.
///
/// Returns the written paths in node set order. A failure aborts the run;
/// files written for earlier node sets are kept.
pub fn template_node_sets(
    state: &NetworkState,
    request: &TemplateRequest,
) -> TemplateResult<Vec<PathBuf>> {
    let (Some(config), Some(services)) = (&state.config, &state.generated_services) else {
        return Err(TemplateError::NotBootstrapped);
    };

    let node_sets = select_node_sets(
        &services.node_sets,
        &request.node_set_names,
        &request.node_set_group_names,
    )?;

    let tmpl = ConfigTemplate::parse(request.kind, &request.template)?;
    let generator = Generator::new(request.kind, config, services)?;

    let mut written = Vec::with_capacity(node_sets.len());
    for ns in &node_sets {
        let content = if request.with_merge {
            generator.render_and_merge(ns, &tmpl)?
        } else {
            generator.render(ns, &tmpl)?
        };

        let path = if request.update_network {
            state
                .update_node_config(request.kind, ns.index, &content)
                .map_err(|source| TemplateError::State {
                    index: ns.index,
                    source,
                })?
        } else {
            let path = request.output_path(ns);
            write_output(&path, &content)?;
            path
        };
        debug!(node_set = %ns.name, ?path, "node set templated");
        written.push(path);
    }

    info!(
        kind = %request.kind,
        node_sets = written.len(),
        merged = request.with_merge,
        updated_network = request.update_network,
        "templating finished"
    );
    Ok(written)
}

/// Filter node sets by name and group name.
///
/// Both lists empty is a [`TemplateError::NoSelector`]; an empty selection
/// is a [`TemplateError::NoMatch`].
pub fn select_node_sets(
    node_sets: &[NodeSet],
    names: &[String],
    group_names: &[String],
) -> TemplateResult<Vec<NodeSet>> {
    if names.is_empty() && group_names.is_empty() {
        return Err(TemplateError::NoSelector);
    }

    let mut filters = Vec::with_capacity(2);
    if !names.is_empty() {
        filters.push(NodeSetFilter::Names(names.to_vec()));
    }
    if !group_names.is_empty() {
        filters.push(NodeSetFilter::GroupNames(group_names.to_vec()));
    }

    let selected = filter_node_sets(node_sets, &filters);
    if selected.is_empty() {
        return Err(TemplateError::NoMatch {
            names: names.to_vec(),
            groups: group_names.to_vec(),
        });
    }
    Ok(selected)
}

fn write_output(path: &Path, content: &[u8]) -> TemplateResult<()> {
    let io_err = |source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, content).map_err(io_err)
}
