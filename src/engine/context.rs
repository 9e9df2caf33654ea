//! Per-instance engine identity.

use crate::addon::ServiceSpec;
use crate::config::EngineConfig;

/// Compose-style grouping labels, for parity with compose-managed stacks.
const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";
const COMPOSE_SERVICE_LABEL: &str = "com.docker.compose.service";

/// Identity of one running engine instance, constructed once at startup and
/// passed into the deployer and monitor.
///
/// Ownership labeling is the engine's only isolation mechanism: every
/// container this instance creates carries [`EngineConfig::manager_label`]
/// with this instance's id, and the monitor only ever looks at containers
/// carrying it. Two engine instances sharing a host never touch each other's
/// containers.
#[derive(Debug, Clone)]
pub struct EngineContext {
    config: EngineConfig,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine_id(&self) -> &str {
        &self.config.engine_id
    }

    /// `docker ps` filter expression selecting only containers owned by this
    /// engine instance.
    pub fn ownership_filter(&self) -> String {
        format!(
            "label={}={}",
            self.config.manager_label, self.config.engine_id
        )
    }

    /// Stamp a service with the three ownership labels plus the compose-style
    /// grouping labels. Labels already set on the service are preserved;
    /// ownership keys are always overwritten (they are not user-settable).
    pub fn apply_ownership_labels(&self, service: &mut ServiceSpec, addon_id: &str) {
        service.labels.insert(
            COMPOSE_PROJECT_LABEL.to_string(),
            self.config.project_name.clone(),
        );
        service
            .labels
            .insert(COMPOSE_SERVICE_LABEL.to_string(), service.name.clone());

        service
            .labels
            .insert(self.config.addon_id_label.clone(), addon_id.to_string());
        service.labels.insert(
            self.config.manager_label.clone(),
            self.config.engine_id.clone(),
        );
        service
            .labels
            .insert(self.config.service_name_label.clone(), service.name.clone());
    }
}
