//! Retainer - pull images through Portainer from a CI pipeline
//!
//! This crate authenticates against a Portainer management API, pulls an
//! image onto one or more nodes of an endpoint and optionally forces a
//! rolling update of the Swarm services running that image.

pub mod cli;
pub mod config;
pub mod portainer;
pub mod workflow;

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for Retainer operations
#[derive(Error, Debug)]
pub enum RetainerError {
    #[error("Authentication failed ({status}): {body}")]
    Authentication { status: StatusCode, body: String },

    #[error("No endpoints available")]
    NoEndpoint,

    #[error("Request failed ({status}): {body}")]
    Transport { status: StatusCode, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RetainerError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "retainer";
