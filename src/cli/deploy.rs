//! Pull-and-restart command implementation

use crate::config::{DeployConfig, NodeSelection};
use crate::workflow;
use clap::Args;
use tracing::info;

/// Arguments for a deployment run
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Portainer URL address
    #[arg(short = 'U', long, env = "PORTAINER_URL")]
    pub url: String,

    /// Portainer user name
    #[arg(short, long, env = "PORTAINER_USERNAME")]
    pub username: String,

    /// Portainer password
    #[arg(short, long, env = "PORTAINER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Docker image to pull
    #[arg(short, long, env = "DOCKER_IMAGE")]
    pub image: String,

    /// Portainer endpoint id (zero, negative or unset uses the first endpoint available)
    #[arg(short, long, env = "PORTAINER_ENDPOINT", allow_negative_numbers = true)]
    pub endpoint: Option<i64>,

    /// Comma-separated Portainer nodes (unset uses the default node, "*" uses all nodes)
    #[arg(short, long, env = "PORTAINER_NODES")]
    pub nodes: Option<String>,

    /// Portainer registry id to pull with (unset picks the registry matching the image)
    #[arg(short = 'R', long, env = "PORTAINER_REGISTRY", allow_negative_numbers = true)]
    pub registry: Option<i64>,

    /// Restart services after pull (only for Swarm clusters, default)
    #[arg(short, long, overrides_with = "no_restart")]
    pub restart: bool,

    /// Do not restart services after pull
    #[arg(long, overrides_with = "restart")]
    pub no_restart: bool,

    /// Do not print the pull progress
    #[arg(short, long)]
    pub quiet: bool,
}

impl DeployArgs {
    /// Resolve the arguments into a run configuration
    pub fn to_config(&self) -> DeployConfig {
        let nodes = self
            .nodes
            .as_deref()
            .map(NodeSelection::from)
            .unwrap_or_default();

        DeployConfig {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            image: self.image.clone(),
            endpoint: self.endpoint,
            nodes,
            registry: self.registry,
            restart: !self.no_restart,
        }
    }
}

/// Execute a deployment run
pub async fn execute(args: DeployArgs) -> anyhow::Result<()> {
    let config = args.to_config();

    let report = workflow::run(&config, |line| {
        if !args.quiet {
            println!("{}", line);
        }
    })
    .await?;

    info!(
        endpoint = report.endpoint,
        pulls = report.pulled_nodes.len(),
        restarted = report.restarted.len(),
        "Operation complete!"
    );

    Ok(())
}
