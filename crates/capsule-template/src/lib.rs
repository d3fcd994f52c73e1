//! Config templating for node sets.
//!
//! A template kind selects both the template and the generator that
//! supplies its data:
//!
//! ```text
//! TemplateRequest ──► filter node sets ──► ConfigTemplate::parse(kind)
//!                                      ──► Generator::new(kind, state)
//!                                      ──► render / render_and_merge per node set
//!                                      ──► <out_dir>/<kind>-<name>.conf  or  NetworkState::update_node_config
//! ```

pub mod dispatch;
pub mod error;
pub mod generator;
pub mod merge;
pub mod template;

pub use dispatch::{TemplateRequest, select_node_sets, template_node_sets};
pub use error::{TemplateError, TemplateResult};
pub use generator::{ConfigGenerator, Generator};
pub use template::ConfigTemplate;
