//! The deployment run: authenticate, pull, restart
//!
//! Stages run strictly in order and every request is awaited before the next
//! one is sent. The first error ends the run; nothing is retried.

use crate::config::{DeployConfig, NodeSelection};
use crate::portainer::PortainerClient;
use crate::Result;
use tracing::info;

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub endpoint: i64,
    /// One entry per pull, `None` being the endpoint's default node
    pub pulled_nodes: Vec<Option<String>>,
    /// Ids of the services that were force-updated
    pub restarted: Vec<String>,
}

/// Run a full deployment against the configured Portainer instance
///
/// Every pull progress line is handed to `on_progress` as it arrives.
pub async fn run(config: &DeployConfig, mut on_progress: impl FnMut(&str)) -> Result<DeployReport> {
    info!(
        "Trying to authenticate in {} with username \"{}\"...",
        config.url, config.username
    );
    let mut client = PortainerClient::new(&config.url)?;
    client.authenticate(&config.username, &config.password).await?;
    client.refresh_registries().await?;

    let endpoint = match config.explicit_endpoint() {
        Some(id) => id,
        None => client.resolve_first_endpoint().await?,
    };

    let targets = resolve_targets(&client, endpoint, &config.nodes).await?;
    let registry = config.explicit_registry();

    for node in &targets {
        match node {
            Some(node) => {
                info!(endpoint, "Pulling image \"{}\" on {}...", config.image, node)
            }
            None => info!(endpoint, "Pulling image \"{}\" on default node...", config.image),
        }

        let progress = client
            .pull_image(endpoint, &config.image, node.as_deref(), registry)
            .await?;
        progress.forward(&mut on_progress).await?;
    }

    let mut restarted = Vec::new();
    if config.restart {
        info!(
            endpoint,
            "Restarting Swarm services using the image \"{}\"...", config.image
        );
        for (service, _) in client
            .restart_services_using_image(endpoint, &config.image, true)
            .await?
        {
            restarted.push(service.id);
        }
    }

    Ok(DeployReport {
        endpoint,
        pulled_nodes: targets,
        restarted,
    })
}

/// Expand the node selection into the list of pull targets
async fn resolve_targets(
    client: &PortainerClient,
    endpoint: i64,
    nodes: &NodeSelection,
) -> Result<Vec<Option<String>>> {
    Ok(match nodes {
        NodeSelection::Default => vec![None],
        NodeSelection::All => client
            .list_nodes(endpoint)
            .await?
            .into_iter()
            .map(Some)
            .collect(),
        NodeSelection::Explicit(nodes) => nodes.iter().cloned().map(Some).collect(),
    })
}
