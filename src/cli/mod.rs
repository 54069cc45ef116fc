//! Command line definition

pub mod deploy;

use clap::Parser;

/// Retainer - a simple CI step for Portainer
///
/// Pulls an image on Portainer-managed nodes and restarts the Swarm services
/// that use it. Every option can also be given through its environment
/// variable; command line values take precedence.
#[derive(Parser, Debug)]
#[command(name = "retainer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub deploy: deploy::DeployArgs,
}
