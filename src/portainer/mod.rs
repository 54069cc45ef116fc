//! Portainer management API access

pub mod client;
pub mod progress;
pub mod registry_auth;
pub mod types;

pub use client::PortainerClient;
pub use progress::PullProgress;
pub use types::{Registry, Service, ServiceUpdateResponse};
