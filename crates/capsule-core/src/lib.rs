pub mod config;
pub mod filter;
pub mod types;

pub use config::Config;
pub use filter::{NodeSetFilter, filter_node_sets};
pub use types::*;
