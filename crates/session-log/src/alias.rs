//! Viewer alias generation and persistence
//!
//! Logs are keyed by a friendly pseudonymous alias rather than anything
//! identifying. Generated once and persisted as JSON next to the logs.

use crate::LogError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

const ADJECTIVES: [&str; 20] = [
    "Blue", "Red", "Green", "Yellow", "Purple", "Orange", "Silver", "Golden", "Swift", "Silent",
    "Brave", "Clever", "Lucky", "Gentle", "Wild", "Mighty", "Happy", "Calm", "Fuzzy", "Quick",
];

const ANIMALS: [&str; 20] = [
    "Tiger", "Wolf", "Panther", "Eagle", "Fox", "Bear", "Lion", "Leopard", "Falcon", "Otter",
    "Hawk", "Dolphin", "Rabbit", "Moose", "Panda", "Swan", "Horse", "Shark", "Owl", "Lynx",
];

#[derive(Debug, Serialize, Deserialize)]
struct ViewerConfig {
    viewer_alias: String,
}

/// Load the persisted alias, or generate and persist a fresh one.
pub fn get_or_create_alias(path: &Path) -> Result<String, LogError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: ViewerConfig =
            serde_json::from_str(&content).map_err(|e| LogError::Serialization(e.to_string()))?;
        return Ok(config.viewer_alias);
    }

    let alias = generate_alias();
    info!(%alias, "generated new viewer alias");

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(&ViewerConfig {
        viewer_alias: alias.clone(),
    })
    .map_err(|e| LogError::Serialization(e.to_string()))?;
    std::fs::write(path, content)?;

    Ok(alias)
}

fn generate_alias() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let adjective = ADJECTIVES[bytes[0] as usize % ADJECTIVES.len()];
    let animal = ANIMALS[bytes[1] as usize % ANIMALS.len()];
    let number = 10 + (bytes[2] as u32 % 90);
    format!("{}{}{}", adjective, animal, number)
}
