//! Portainer HTTP API client

use crate::portainer::progress::PullProgress;
use crate::portainer::registry_auth::{self, REGISTRY_AUTH_HEADER};
use crate::portainer::types::{
    AuthRequest, AuthResponse, Endpoint, Node, Registry, Service, ServiceUpdateResponse,
};
use crate::{RetainerError, Result, APP_NAME, VERSION};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN};
use reqwest::{Method, RequestBuilder, Response};
use tracing::{debug, info, warn};

/// Header routing a Docker API call to a specific agent node
pub const AGENT_TARGET_HEADER: &str = "x-portaineragent-target";

/// Client for one Portainer instance
///
/// Holds the session token obtained by [`PortainerClient::authenticate`] and
/// a snapshot of the configured registries used to pick pull credentials.
pub struct PortainerClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    registries: Vec<Registry>,
}

impl PortainerClient {
    /// Create a client for the Portainer instance at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RetainerError::Config("Portainer URL is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&base_url)
                .map_err(|_| RetainerError::InvalidHeader(base_url.clone()))?,
        );

        let client = reqwest::Client::builder()
            .user_agent(format!("{}/{}", APP_NAME, VERSION))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
            registries: Vec::new(),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session token, once authenticated
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Registries cached by the last [`PortainerClient::refresh_registries`]
    pub fn registries(&self) -> &[Registry] {
        &self.registries
    }

    /// Exchange credentials for a JWT and use it for every following call
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<String> {
        let response = self
            .request(Method::POST, "api/auth")
            .json(&AuthRequest { username, password })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RetainerError::Authentication { status, body });
        }

        let auth: AuthResponse = response.json().await?;
        self.token = Some(auth.jwt.clone());
        Ok(auth.jwt)
    }

    /// List the registries configured in Portainer
    pub async fn list_registries(&self) -> Result<Vec<Registry>> {
        let response = self.send(self.request(Method::GET, "api/registries")).await?;
        Ok(response.json().await?)
    }

    /// Reload the registry cache consulted by [`PortainerClient::pull_image`]
    pub async fn refresh_registries(&mut self) -> Result<&[Registry]> {
        self.registries = self.list_registries().await?;
        debug!(count = self.registries.len(), "Cached registries");
        Ok(&self.registries)
    }

    /// Id of the first endpoint, in the order the server lists them
    pub async fn resolve_first_endpoint(&self) -> Result<i64> {
        let response = self.send(self.request(Method::GET, "api/endpoints")).await?;
        let endpoints: Vec<Endpoint> = response.json().await?;

        endpoints
            .first()
            .map(|endpoint| endpoint.id)
            .ok_or(RetainerError::NoEndpoint)
    }

    /// Hostnames of the Swarm nodes of an endpoint
    pub async fn list_nodes(&self, endpoint: i64) -> Result<Vec<String>> {
        let path = format!("api/endpoints/{}/docker/nodes", endpoint);
        let response = self.send(self.request(Method::GET, &path)).await?;
        let nodes: Vec<Node> = response.json().await?;

        Ok(nodes
            .into_iter()
            .map(|node| node.description.hostname)
            .collect())
    }

    /// Ask the endpoint's Docker daemon to pull `image`
    ///
    /// `node` routes the pull to one agent. An explicit `registry_id` above
    /// zero selects the credentials; otherwise the cached registries are
    /// searched for one matching the image, and no match means an anonymous
    /// pull.
    pub async fn pull_image(
        &self,
        endpoint: i64,
        image: &str,
        node: Option<&str>,
        registry_id: Option<i64>,
    ) -> Result<PullProgress> {
        let mut headers = HeaderMap::new();

        if let Some(node) = node {
            headers.insert(
                AGENT_TARGET_HEADER,
                HeaderValue::from_str(node)
                    .map_err(|_| RetainerError::InvalidHeader(node.to_string()))?,
            );
        }

        if let Some(id) = registry_auth::select(registry_id, &self.registries, image) {
            debug!(registry = id, "Using registry credentials");
            let value = registry_auth::encode(id)?;
            headers.insert(
                REGISTRY_AUTH_HEADER,
                HeaderValue::from_str(&value).map_err(|_| RetainerError::InvalidHeader(value))?,
            );
        }

        let path = format!("api/endpoints/{}/docker/images/create", endpoint);
        let request = self
            .request(Method::POST, &path)
            .query(&[("fromImage", image)])
            .headers(headers);

        let response = self.send(request).await?;
        Ok(PullProgress::new(response))
    }

    /// Services of an endpoint whose container image is exactly `image`
    pub async fn find_services_by_image(&self, endpoint: i64, image: &str) -> Result<Vec<Service>> {
        let path = format!("api/endpoints/{}/docker/services", endpoint);
        let response = self.send(self.request(Method::GET, &path)).await?;
        let services: Vec<Service> = response.json().await?;

        Ok(services
            .into_iter()
            .filter(|service| service.uses_image(image))
            .collect())
    }

    /// Submit the service's spec back with the version it was read at
    ///
    /// With `pull_latest` the spec's `ForceUpdate` counter is bumped so Swarm
    /// redeploys the tasks and pulls the image again. A stale version is
    /// rejected by the server and surfaces as a transport error.
    pub async fn restart_service(
        &self,
        endpoint: i64,
        service: &Service,
        pull_latest: bool,
    ) -> Result<ServiceUpdateResponse> {
        let spec = service.update_spec(pull_latest);
        let path = format!(
            "api/endpoints/{}/docker/services/{}/update",
            endpoint, service.id
        );
        let request = self
            .request(Method::POST, &path)
            .query(&[("version", service.version.index)])
            .json(&spec);

        let response = self.send(request).await?;
        let update: ServiceUpdateResponse = response.json().await?;

        for warning in update.warnings.iter().flatten() {
            warn!(service = %service.id, "{}", warning);
        }

        Ok(update)
    }

    /// Restart every service running `image`, one after the other
    pub async fn restart_services_using_image(
        &self,
        endpoint: i64,
        image: &str,
        pull_latest: bool,
    ) -> Result<Vec<(Service, ServiceUpdateResponse)>> {
        let services = self.find_services_by_image(endpoint, image).await?;
        let mut restarted = Vec::with_capacity(services.len());

        for service in services {
            info!(
                service = %service.id,
                "Restarting service {} ({})...",
                service.spec.name,
                service.id
            );
            let update = self.restart_service(endpoint, &service, pull_latest).await?;
            restarted.push((service, update));
        }

        Ok(restarted)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(method = method.as_str(), path, "Portainer request");

        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path));

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RetainerError::Transport { status, body });
        }

        Ok(response)
    }
}
