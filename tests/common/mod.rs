//! Shared test doubles: an in-memory container runtime, addon store and
//! marketplace catalog.
#![allow(dead_code)]

use addon_engine::addon::{Addon, AddonStatus, ServiceSpec};
use addon_engine::docker::DockerError;
use addon_engine::error::{Error, Result};
use addon_engine::marketplace::{Catalog, CatalogAddon};
use addon_engine::runtime::{
    ContainerHandle, ContainerRuntime, ContainerState, ContainerSummary, RunSpec,
};
use addon_engine::store::{AddonPatch, AddonStore, NewAddon};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory [`ContainerRuntime`] recording every lifecycle call so tests
/// can assert on ordering.
#[derive(Default)]
pub struct FakeRuntime {
    pub containers: Mutex<BTreeMap<String, ContainerSummary>>,
    pub networks: Mutex<BTreeSet<String>>,
    /// Lifecycle events in call order: "run web", "stop web", "remove web",
    /// "restart web", "create-network front".
    pub events: Mutex<Vec<String>>,
    /// Container names whose `run_container` fails.
    pub fail_starts: Mutex<BTreeSet<String>>,
    /// Network names whose creation fails.
    pub fail_networks: Mutex<BTreeSet<String>>,
    pub removed_images: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_container(&self, summary: ContainerSummary) {
        self.containers.lock().insert(summary.name.clone(), summary);
    }

    pub fn fail_start_of(&self, name: &str) {
        self.fail_starts.lock().insert(name.to_string());
    }

    pub fn fail_network(&self, name: &str) {
        self.fail_networks.lock().insert(name.to_string());
    }

    pub fn set_exited(&self, name: &str, exit_code: i64) {
        let mut containers = self.containers.lock();
        let container = containers.get_mut(name).expect("container not in fake");
        container.state = ContainerState::Exited;
        container.exit_code = exit_code;
    }

    pub fn remove(&self, name: &str) {
        self.containers.lock().remove(name);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }

    pub fn container(&self, name: &str) -> Option<ContainerSummary> {
        self.containers.lock().get(name).cloned()
    }

    pub fn has_network(&self, name: &str) -> bool {
        self.networks.lock().contains(name)
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_labeled(&self, filter: &str) -> std::result::Result<Vec<ContainerSummary>, DockerError> {
        // Filters look like "label=key=value".
        let expr = filter.strip_prefix("label=").unwrap_or(filter);
        let (key, value) = expr.split_once('=').unwrap_or((expr, ""));
        Ok(self
            .containers
            .lock()
            .values()
            .filter(|c| c.labels.get(key).map(String::as_str) == Some(value))
            .cloned()
            .collect())
    }

    async fn get_container(&self, name: &str) -> std::result::Result<Option<ContainerSummary>, DockerError> {
        Ok(self.containers.lock().get(name).cloned())
    }

    async fn run_container(&self, spec: &RunSpec) -> std::result::Result<ContainerHandle, DockerError> {
        self.record(format!("run {}", spec.name));
        if self.fail_starts.lock().contains(&spec.name) {
            return Err(DockerError::cmd_failed(
                format!("docker run {}", spec.name),
                "simulated start failure",
                Some(125),
            ));
        }
        let summary = ContainerSummary {
            id: format!("id-{}", spec.name),
            name: spec.name.clone(),
            state: ContainerState::Running,
            exit_code: 0,
            image_tags: vec![spec.image.clone()],
            networks: spec.network.iter().cloned().collect(),
            ports: spec.ports.clone(),
            labels: spec.labels.clone(),
        };
        self.insert_container(summary);
        Ok(ContainerHandle {
            id: format!("id-{}", spec.name),
            name: spec.name.clone(),
        })
    }

    async fn stop_container(&self, name: &str) -> std::result::Result<(), DockerError> {
        self.record(format!("stop {}", name));
        let mut containers = self.containers.lock();
        match containers.get_mut(name) {
            Some(container) => {
                container.state = ContainerState::Exited;
                container.exit_code = 0;
                Ok(())
            }
            None => Err(DockerError::not_found(name)),
        }
    }

    async fn remove_container(&self, name: &str) -> std::result::Result<(), DockerError> {
        self.record(format!("remove {}", name));
        self.containers.lock().remove(name);
        Ok(())
    }

    async fn restart_container(&self, name: &str) -> std::result::Result<(), DockerError> {
        self.record(format!("restart {}", name));
        let mut containers = self.containers.lock();
        match containers.get_mut(name) {
            Some(container) => {
                container.state = ContainerState::Running;
                container.exit_code = 0;
                Ok(())
            }
            None => Err(DockerError::not_found(name)),
        }
    }

    async fn list_networks(&self) -> std::result::Result<Vec<String>, DockerError> {
        Ok(self.networks.lock().iter().cloned().collect())
    }

    async fn create_network(&self, name: &str) -> std::result::Result<(), DockerError> {
        if self.fail_networks.lock().contains(name) {
            return Err(DockerError::cmd_failed(
                format!("docker network create {}", name),
                "simulated network failure",
                Some(1),
            ));
        }
        self.record(format!("create-network {}", name));
        self.networks.lock().insert(name.to_string());
        Ok(())
    }

    async fn remove_image(&self, image: &str) -> std::result::Result<(), DockerError> {
        self.removed_images.lock().push(image.to_string());
        Ok(())
    }
}

/// In-memory [`AddonStore`] with the same transition rules as the sqlite one.
#[derive(Default)]
pub struct MemoryStore {
    pub addons: Mutex<BTreeMap<String, Addon>>,
    next_id: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Addon> {
        self.addons.lock().get(id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.addons.lock().is_empty()
    }
}

#[async_trait]
impl AddonStore for MemoryStore {
    async fn create_addon(&self, addon: NewAddon) -> Result<Addon> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let record = Addon {
            id: format!("addon-{}", n),
            marketplace_id: addon.marketplace_id,
            status: addon.status,
            services: addon.services,
            created_at: now,
            updated_at: now,
        };
        self.addons.lock().insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update_addon(&self, id: &str, patch: AddonPatch) -> Result<()> {
        let mut addons = self.addons.lock();
        let addon = addons
            .get_mut(id)
            .ok_or_else(|| Error::AddonNotFound(id.to_string()))?;
        if let Some(to) = patch.status {
            if !addon.status.can_transition(to) {
                return Err(Error::InvalidStatusTransition {
                    from: addon.status,
                    to,
                });
            }
            addon.status = to;
        }
        if let Some(services) = patch.services {
            addon.services = services;
        }
        addon.updated_at = Utc::now();
        Ok(())
    }

    async fn get_addon(&self, id: &str) -> Result<Option<Addon>> {
        Ok(self.addons.lock().get(id).cloned())
    }

    async fn find_active_addons(&self) -> Result<Vec<Addon>> {
        Ok(self
            .addons
            .lock()
            .values()
            .filter(|a| a.status != AddonStatus::Failed)
            .cloned()
            .collect())
    }
}

/// Scripted marketplace catalog.
#[derive(Default)]
pub struct FakeCatalog {
    pub entries: Mutex<BTreeMap<String, CatalogAddon>>,
    pub unavailable: Mutex<bool>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, marketplace_id: &str, services: Vec<ServiceSpec>) -> Self {
        self.entries
            .lock()
            .insert(marketplace_id.to_string(), CatalogAddon { services });
        self
    }

    pub fn set_unavailable(&self) {
        *self.unavailable.lock() = true;
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn get_addon_by_marketplace_id(&self, marketplace_id: &str) -> Result<CatalogAddon> {
        if *self.unavailable.lock() {
            return Err(Error::Config("marketplace unreachable".to_string()));
        }
        self.entries
            .lock()
            .get(marketplace_id)
            .cloned()
            .ok_or_else(|| Error::AddonNotFound(marketplace_id.to_string()))
    }
}

/// Engine context with a fixed instance id and retry budget, so tests don't
/// depend on the process environment.
pub fn engine_context(engine_id: &str, max_retries: u32) -> std::sync::Arc<addon_engine::EngineContext> {
    let id = engine_id.to_string();
    let retries = max_retries.to_string();
    let config = addon_engine::EngineConfig::from_source(|key| match key {
        "ADDON_ENGINE_ID" => Some(id.clone()),
        "MAX_CONTAINER_RETRIES" => Some(retries.clone()),
        _ => None,
    })
    .unwrap();
    std::sync::Arc::new(addon_engine::EngineContext::new(config))
}

/// Builder helpers shared by the test files.
pub fn service(name: &str, image: &str) -> ServiceSpec {
    ServiceSpec::new(name, image)
}

pub fn addon(id: &str, services: Vec<ServiceSpec>) -> Addon {
    let now = Utc::now();
    Addon {
        id: id.to_string(),
        marketplace_id: format!("mp-{}", id),
        status: AddonStatus::Installing,
        services,
        created_at: now,
        updated_at: now,
    }
}

pub fn running_container(name: &str, image: &str) -> ContainerSummary {
    ContainerSummary {
        id: format!("id-{}", name),
        name: name.to_string(),
        state: ContainerState::Running,
        exit_code: 0,
        image_tags: vec![image.to_string()],
        networks: Vec::new(),
        ports: BTreeMap::new(),
        labels: BTreeMap::new(),
    }
}

/// A running container carrying the three ownership labels.
pub fn owned_container(name: &str, engine_id: &str, addon_id: &str) -> ContainerSummary {
    let mut container = running_container(name, "x:1");
    container
        .labels
        .insert("oak.addon.id".to_string(), addon_id.to_string());
    container
        .labels
        .insert("oak.plugin.manager.id".to_string(), engine_id.to_string());
    container
        .labels
        .insert("oak.service.name".to_string(), name.to_string());
    container
}
