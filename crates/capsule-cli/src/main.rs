//! capsule: run a local network on Nomad and template its node configs.
//!
//! # Usage
//!
//! ```text
//! capsule network start
//! capsule template node-sets --type vega --path vega.tmpl --nodeset-group-name validators
//! capsule network stop --nodes-only
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::network::{NomadArgs, StopArgs, StopJobsArgs};
use commands::template::NodeSetsArgs;

#[derive(Parser)]
#[command(
    name = "capsule",
    about = "Capsule: local network lifecycle on Nomad",
    version,
    propagate_version = true
)]
struct Cli {
    /// Network home directory (default: ~/.vegacapsule/testnet).
    #[arg(long, global = true, env = "CAPSULE_HOME")]
    home_path: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Render config templates for a bootstrapped network
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Start and stop the network jobs
    Network {
        #[command(subcommand)]
        action: NetworkAction,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// Run config templating for vega, tendermint, data node or visor node sets
    NodeSets(NodeSetsArgs),
}

#[derive(Subcommand)]
enum NetworkAction {
    /// Start every job of the bootstrapped network
    Start(NomadArgs),
    /// Stop the running network
    Stop(StopArgs),
    /// Stop individual jobs by id
    StopJobs(StopJobsArgs),
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,capsule=debug"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

/// `~/.vegacapsule/testnet`, or `./testnet` without a home directory.
fn default_home_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".vegacapsule").join("testnet"),
        None => PathBuf::from("testnet"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let home = cli.home_path.unwrap_or_else(default_home_path);

    match cli.command {
        Commands::Template { action } => match action {
            TemplateAction::NodeSets(args) => commands::template::node_sets(&home, args),
        },
        Commands::Network { action } => {
            let cancel = commands::cancel_on_ctrl_c();
            match action {
                NetworkAction::Start(args) => commands::network::start(&home, args, &cancel).await,
                NetworkAction::Stop(args) => commands::network::stop(&home, args, &cancel).await,
                NetworkAction::StopJobs(args) => {
                    commands::network::stop_jobs(&home, args, &cancel).await
                }
            }
        }
    }
}
