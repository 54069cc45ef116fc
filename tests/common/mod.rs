//! In-process fake of the Portainer API for integration tests.
//!
//! The fake answers the handful of routes Retainer uses from a canned
//! [`Scenario`] and records every request it receives, in order, so tests can
//! assert on the exact sequence of calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use retainer::config::{DeployConfig, NodeSelection};

pub const TOKEN: &str = "test-token";

/// Progress events streamed back by every successful pull
pub const PULL_EVENTS: [&str; 3] = [
    r#"{"status":"Pulling from x/y","id":"tag"}"#,
    r#"{"status":"Downloading","progressDetail":{"current":1,"total":2}}"#,
    r#"{"status":"Status: Downloaded newer image for x/y:tag"}"#,
];

/// Canned server state
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub reject_login: bool,
    pub endpoints: Vec<i64>,
    pub nodes: Vec<String>,
    pub registries: Vec<Value>,
    pub services: Vec<Value>,
    /// Pulls targeted at this node answer 500
    pub failing_node: Option<String>,
    /// Service updates answer 409
    pub reject_updates: bool,
}

/// One request as seen by the fake
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub target: Option<String>,
    pub registry_auth: Option<String>,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub origin: Option<String>,
    pub user_agent: Option<String>,
    pub body: Option<Value>,
}

impl Call {
    /// "METHOD path" shorthand for order assertions
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Decoded `X-Registry-Auth` header
    pub fn registry_auth_json(&self) -> Option<Value> {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        self.registry_auth.as_ref().map(|value| {
            let raw = STANDARD.decode(value).expect("registry auth is base64");
            serde_json::from_slice(&raw).expect("registry auth is JSON")
        })
    }
}

struct Shared {
    scenario: Scenario,
    calls: Mutex<Vec<Call>>,
}

/// Running fake server
pub struct FakePortainer {
    pub url: String,
    shared: Arc<Shared>,
}

impl FakePortainer {
    pub async fn start(scenario: Scenario) -> Self {
        let shared = Arc::new(Shared {
            scenario,
            calls: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(handle).with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake portainer");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            shared,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn routes(&self) -> Vec<String> {
        self.calls().iter().map(Call::route).collect()
    }

    /// Pull requests only, in order
    pub fn pulls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.path.ends_with("/docker/images/create"))
            .collect()
    }

    /// Configuration pointing at this server
    pub fn config(&self, image: &str, nodes: NodeSelection) -> DeployConfig {
        DeployConfig {
            url: self.url.clone(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            image: image.to_string(),
            endpoint: None,
            nodes,
            registry: None,
            restart: true,
        }
    }
}

/// Service payload as the Docker API returns it
pub fn service(id: &str, name: &str, image: &str, index: u64, force_update: u64) -> Value {
    json!({
        "ID": id,
        "Version": { "Index": index },
        "Spec": {
            "Name": name,
            "Labels": {},
            "TaskTemplate": {
                "ForceUpdate": force_update,
                "ContainerSpec": { "Image": image }
            }
        }
    })
}

pub fn registry(id: i64, url: &str, name: &str) -> Value {
    json!({ "Id": id, "URL": url, "Name": name, "Type": 3 })
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches('/').to_string();
    let call = Call {
        method: method.to_string(),
        path: path.clone(),
        query,
        target: header(&headers, "x-portaineragent-target"),
        registry_auth: header(&headers, "x-registry-auth"),
        authorization: header(&headers, "authorization"),
        accept: header(&headers, "accept"),
        content_type: header(&headers, "content-type"),
        origin: header(&headers, "origin"),
        user_agent: header(&headers, "user-agent"),
        body: serde_json::from_slice(&body).ok(),
    };
    shared.calls.lock().unwrap().push(call.clone());

    let scenario = &shared.scenario;
    let segments: Vec<&str> = path.split('/').collect();

    if segments == ["api", "auth"] && method == Method::POST {
        if scenario.reject_login {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "Invalid credentials" })),
            )
                .into_response();
        }
        return Json(json!({ "jwt": TOKEN })).into_response();
    }

    let expected = format!("Bearer {}", TOKEN);
    if call.authorization.as_deref() != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["api", "registries"]) => Json(json!(scenario.registries)).into_response(),
        ("GET", ["api", "endpoints"]) => {
            let endpoints: Vec<Value> = scenario
                .endpoints
                .iter()
                .map(|id| json!({ "Id": id, "Name": format!("env-{}", id) }))
                .collect();
            Json(json!(endpoints)).into_response()
        }
        ("GET", ["api", "endpoints", _, "docker", "nodes"]) => {
            let nodes: Vec<Value> = scenario
                .nodes
                .iter()
                .map(|hostname| json!({ "ID": hostname, "Description": { "Hostname": hostname } }))
                .collect();
            Json(json!(nodes)).into_response()
        }
        ("POST", ["api", "endpoints", _, "docker", "images", "create"]) => {
            if call.target.is_some() && call.target == scenario.failing_node {
                return (StatusCode::INTERNAL_SERVER_ERROR, "pull failed").into_response();
            }
            let mut body = PULL_EVENTS.join("\n");
            body.push('\n');
            (StatusCode::OK, body).into_response()
        }
        ("GET", ["api", "endpoints", _, "docker", "services"]) => {
            Json(json!(scenario.services)).into_response()
        }
        ("POST", ["api", "endpoints", _, "docker", "services", _, "update"]) => {
            if scenario.reject_updates {
                return (
                    StatusCode::CONFLICT,
                    Json(json!({ "message": "update out of sequence" })),
                )
                    .into_response();
            }
            Json(json!({ "Warnings": null })).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
