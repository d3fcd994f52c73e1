//! capsule-nomad: network lifecycle on top of a Nomad scheduler.
//!
//! Turns a network definition plus its generated services into running
//! Nomad jobs and tears them down again. The crate:
//!
//! - Builds one job descriptor per workload (pre-start container, node
//!   set, faucet, wallet)
//! - Submits them through a [`JobScheduler`] that only reports success
//!   once a job is running
//! - Starts the network in dependency order with fail-fast fan-out
//! - Stops recorded jobs in a single parallel fan-out
//!
//! # Architecture
//!
//! ```text
//! JobRunner
//!   ├── job builders (docker / node set / faucet / wallet)
//!   ├── CancelScope (spawn N, first error cancels the rest)
//!   └── Arc<dyn JobScheduler>
//!       └── NomadClient (submit, poll summary, stop)
//! ```

pub mod client;
pub mod error;
pub mod gateway;
pub mod job;
pub mod runner;
pub mod scope;

pub use client::{ClientConfig, NomadClient};
pub use error::{GatewayError, GatewayResult, RunnerError, RunnerResult, StartNetworkError};
pub use gateway::{GatewayFuture, JobScheduler};
pub use job::Job;
pub use runner::JobRunner;
pub use scope::CancelScope;
