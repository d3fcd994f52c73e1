//! Templating error types.

use std::path::PathBuf;

use thiserror::Error;

use capsule_core::TemplateKind;
use capsule_state::StateError;

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("network not bootstrapped: cannot template node sets")]
    NotBootstrapped,

    #[error("either of 'nodeset-name', 'nodeset-group-name' must be given to template node sets")]
    NoSelector,

    #[error("node sets with given criteria [names: {names:?}, group names: {groups:?}] not found")]
    NoMatch {
        names: Vec<String>,
        groups: Vec<String>,
    },

    #[error("failed to parse {kind} template: {reason}")]
    TemplateParse { kind: TemplateKind, reason: String },

    #[error("failed to create {kind} config generator: {reason}")]
    GeneratorInit { kind: TemplateKind, reason: String },

    #[error("failed to render template for node {index} ({name}): {reason}")]
    Render {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("failed to merge config for node {index} ({name}): {reason}")]
    Merge {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to update template for node {index}: {source}")]
    State {
        index: usize,
        #[source]
        source: StateError,
    },
}
