//! Resolved run configuration

/// Which nodes of the endpoint receive the pull
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// One pull without a target header, handled by the endpoint's default node
    #[default]
    Default,
    /// Every node reported by the endpoint, in server order
    All,
    /// The listed nodes, in the given order and without validation
    Explicit(Vec<String>),
}

impl From<&str> for NodeSelection {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value == "*" {
            return Self::All;
        }

        let nodes: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|node| !node.is_empty())
            .map(String::from)
            .collect();

        if nodes.is_empty() {
            Self::Default
        } else {
            Self::Explicit(nodes)
        }
    }
}

/// Everything a deployment run needs, fixed before the first request
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub image: String,
    /// Endpoint id; `None` picks the first endpoint
    pub endpoint: Option<i64>,
    pub nodes: NodeSelection,
    /// Registry id forced on every pull; `None` infers it from the image
    pub registry: Option<i64>,
    /// Force-update the services running the image after the pulls
    pub restart: bool,
}

impl DeployConfig {
    /// Endpoint id to use, if one was configured explicitly
    pub fn explicit_endpoint(&self) -> Option<i64> {
        self.endpoint.filter(|id| *id > 0)
    }

    /// Registry id to force, if one was configured explicitly
    pub fn explicit_registry(&self) -> Option<i64> {
        self.registry.filter(|id| *id > 0)
    }
}
