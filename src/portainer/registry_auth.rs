//! `X-Registry-Auth` header construction
//!
//! Portainer accepts a base64 encoded `{"registryId":<id>}` document in place
//! of Docker registry credentials and resolves the stored credentials itself.

use crate::portainer::types::Registry;
use crate::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

/// Header carrying the registry reference on image pulls
pub const REGISTRY_AUTH_HEADER: &str = "x-registry-auth";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistryAuth {
    registry_id: i64,
}

/// Encode the header value for a Portainer registry id
pub fn encode(registry_id: i64) -> Result<String> {
    let payload = serde_json::to_vec(&RegistryAuth { registry_id })?;
    Ok(STANDARD.encode(payload))
}

/// Find the first registry whose URL and name both occur in the image string
///
/// This is a plain substring check against the raw reference, so a registry
/// whose name happens to appear elsewhere in the image can match too.
pub fn infer<'a>(registries: &'a [Registry], image: &str) -> Option<&'a Registry> {
    registries
        .iter()
        .find(|registry| image.contains(&registry.url) && image.contains(&registry.name))
}

/// Pick the registry id for a pull: an explicit id wins over inference
pub fn select(explicit: Option<i64>, registries: &[Registry], image: &str) -> Option<i64> {
    match explicit {
        Some(id) if id > 0 => Some(id),
        _ => infer(registries, image).map(|registry| registry.id),
    }
}
