//! Addon data model.
//!
//! An addon is a named bundle of containerized services installed from the
//! marketplace and deployed/monitored as a unit. The engine owns the
//! deployment lifecycle; the addon record itself lives in the store and the
//! engine only reads it and writes status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an addon record.
///
/// Transitions: `Installing -> {Enabled, Failed}`, `Enabled -> Failed`
/// (via the failure monitor). Nothing ever goes back to `Installing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonStatus {
    Installing,
    Enabled,
    Failed,
}

impl AddonStatus {
    /// Whether moving from `self` to `to` is a legal lifecycle transition.
    /// Self-transitions are allowed (idempotent status writes).
    pub fn can_transition(self, to: AddonStatus) -> bool {
        use AddonStatus::*;
        match (self, to) {
            (a, b) if a == b => true,
            (Installing, Enabled) | (Installing, Failed) => true,
            (Enabled, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AddonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddonStatus::Installing => write!(f, "installing"),
            AddonStatus::Enabled => write!(f, "enabled"),
            AddonStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AddonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "installing" => Ok(AddonStatus::Installing),
            "enabled" => Ok(AddonStatus::Enabled),
            "failed" => Ok(AddonStatus::Failed),
            other => Err(format!("unknown addon status '{}'", other)),
        }
    }
}

/// One containerized service within an addon.
///
/// The service name doubles as the container name, so it must be unique per
/// host. Everything here is desired state; the reconciler may augment
/// `networks` and `ports` with values inherited from a container it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Unique name within the addon, used verbatim as the container name.
    #[serde(rename = "service_name")]
    pub name: String,

    /// Image reference, e.g. `nginx:1.25`.
    #[serde(rename = "image_uri")]
    pub image: String,

    /// Command override; empty means the image default.
    #[serde(default)]
    pub command: Vec<String>,

    /// Networks to attach; empty defaults to the engine-wide default network
    /// at deploy time.
    #[serde(default)]
    pub networks: Vec<String>,

    /// Port mappings: container port key ("80/tcp") to host port.
    #[serde(default, deserialize_with = "de_port_map")]
    pub ports: BTreeMap<String, String>,

    /// Environment variables for the container.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Free-form labels; the deployer adds the ownership labels on top.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            command: Vec::new(),
            networks: Vec::new(),
            ports: BTreeMap::new(),
            environment: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }
}

/// Marketplace payloads write host ports as numbers or strings; accept both.
fn de_port_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
    let mut ports = BTreeMap::new();
    for (key, value) in raw {
        let host = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Null => continue,
            other => {
                return Err(serde::de::Error::custom(format!(
                    "invalid host port for '{}': {}",
                    key, other
                )))
            }
        };
        ports.insert(key, host);
    }
    Ok(ports)
}

/// A persisted addon record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Addon {
    /// Store-assigned opaque id.
    pub id: String,

    /// Reference into the marketplace catalog this addon was installed from.
    pub marketplace_id: String,

    pub status: AddonStatus,

    /// Service definitions, in declaration order (deployment order).
    pub services: Vec<ServiceSpec>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
