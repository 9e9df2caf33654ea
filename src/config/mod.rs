//! Environment-sourced engine configuration.
//!
//! The engine is configured entirely from environment variables, with
//! defaults chosen so a bare `addon-engine run` works on a development host.
//! Invalid numeric values are configuration errors, not silent fallbacks.

use crate::error::{Error, Result};
use std::time::Duration;
use uuid::Uuid;

/// Label key defaults for container ownership.
pub const DEFAULT_ADDON_ID_LABEL: &str = "oak.addon.id";
pub const DEFAULT_MANAGER_LABEL: &str = "oak.plugin.manager.id";
pub const DEFAULT_SERVICE_NAME_LABEL: &str = "oak.service.name";

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_PROJECT_NAME: &str = "root_orchestrator";

/// Engine configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Unique id of this engine instance; scopes container ownership when
    /// several engine instances share a host.
    pub engine_id: String,

    /// Label key carrying the owning addon's id.
    pub addon_id_label: String,

    /// Label key carrying the owning engine instance's id.
    pub manager_label: String,

    /// Label key carrying the service name.
    pub service_name_label: String,

    /// Consecutive-failure budget per container before the owning addon is
    /// marked failed.
    pub max_retries: u32,

    /// Failure monitor poll interval.
    pub poll_interval: Duration,

    /// Compose-style project name applied to every managed container.
    pub project_name: String,

    /// Network used for services that declare none.
    pub default_network: String,

    /// Marketplace base address, e.g. `http://marketplace:8080`. Optional:
    /// only the install path needs it.
    pub marketplace_addr: Option<String>,
}

impl EngineConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary lookup function. Split out of
    /// [`Self::from_env`] so tests don't have to mutate the process
    /// environment.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let engine_id = lookup("ADDON_ENGINE_ID")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let addon_id_label =
            lookup("ADDON_ID_LABEL").unwrap_or_else(|| DEFAULT_ADDON_ID_LABEL.to_string());
        let manager_label =
            lookup("ADDON_MANAGER_LABEL").unwrap_or_else(|| DEFAULT_MANAGER_LABEL.to_string());
        let service_name_label = lookup("ADDON_SERVICE_NAME_LABEL")
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME_LABEL.to_string());

        let max_retries = parse_var(&lookup, "MAX_CONTAINER_RETRIES", DEFAULT_MAX_RETRIES)?;
        let poll_secs = parse_var(
            &lookup,
            "CONTAINER_POLL_INTERVAL",
            DEFAULT_POLL_INTERVAL_SECS,
        )?;

        let project_name =
            lookup("DEFAULT_PROJECT_NAME").unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
        let default_network = format!("{}_default", project_name);

        let marketplace_addr = lookup("MARKETPLACE_ADDR").filter(|s| !s.is_empty());

        Ok(Self {
            engine_id,
            addon_id_label,
            manager_label,
            service_name_label,
            max_retries,
            poll_interval: Duration::from_secs(poll_secs),
            project_name,
            default_network,
            marketplace_addr,
        })
    }

    /// Marketplace API root. Erroring here (rather than at startup) keeps
    /// monitor-only deployments usable without a marketplace.
    pub fn marketplace_api(&self) -> Result<String> {
        let addr = self.marketplace_addr.as_ref().ok_or_else(|| {
            Error::Config("MARKETPLACE_ADDR is not set; cannot install addons".to_string())
        })?;
        Ok(format!("{}/api/v1/marketplace", addr.trim_end_matches('/')))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| Error::Config(format!("Invalid value '{}' for {}: {}", raw, key, e))),
    }
}
