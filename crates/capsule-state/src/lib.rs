//! capsule-state: persisted state of a bootstrapped network.
//!
//! The state is a single JSON document under the network home directory.
//! It holds the declarative `Config`, the `GeneratedServices` produced at
//! bootstrap and, once the network runs, the `NetworkJobs` record.
//!
//! A missing state file loads as an empty (not bootstrapped) state.

pub mod error;
pub mod state;

pub use error::{StateError, StateResult};
pub use state::{NetworkState, STATE_FILE_NAME};
