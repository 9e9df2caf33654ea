//! Addon deployment: reconcile every service of an addon against the host's
//! containers and drive the runtime to the desired state.

use super::context::EngineContext;
use super::networks::NetworkProvisioner;
use super::reconcile::{plan_service, ReconcileAction};
use crate::addon::{Addon, ServiceSpec};
use crate::error::Result;
use crate::runtime::{ContainerHandle, ContainerRuntime, ContainerSummary, RunSpec};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Aggregate result of one `deploy` call.
///
/// A start failure for one service never aborts the batch; failed services
/// are reported here instead.
#[derive(Debug, Default)]
pub struct DeployOutcome {
    pub failed_services: Vec<ServiceSpec>,
    pub new_containers: Vec<ContainerHandle>,
}

impl DeployOutcome {
    pub fn is_fully_deployed(&self) -> bool {
        self.failed_services.is_empty()
    }
}

#[derive(Clone)]
pub struct AddonDeployer {
    runtime: Arc<dyn ContainerRuntime>,
    ctx: Arc<EngineContext>,
}

impl AddonDeployer {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, ctx: Arc<EngineContext>) -> Self {
        Self { runtime, ctx }
    }

    /// Deploy all services of an addon.
    ///
    /// Phases:
    /// 1. Plan: reconcile each service against the container of the same name.
    /// 2. Teardown: stop and remove every superseded container. This runs as
    ///    a distinct phase strictly before any start, so container names and
    ///    exclusive port bindings are free when replacements come up.
    /// 3. Start: label, provision networks and start each queued service.
    ///    Individual start failures are recorded and the batch continues.
    pub async fn deploy(&self, addon: &Addon) -> Result<DeployOutcome> {
        // Work on a copy; the caller's addon must not observe merge edits.
        let services = addon.services.clone();

        let mut to_stop: Vec<ContainerSummary> = Vec::new();
        let mut to_run: Vec<ServiceSpec> = Vec::new();

        for service in services {
            let existing = self.runtime.get_container(&service.name).await?;
            let plan = plan_service(service, existing);
            match plan.action {
                ReconcileAction::Reuse => {
                    debug!(service = %plan.service.name, "container up to date, reusing");
                }
                ReconcileAction::Replace { existing } => {
                    to_stop.push(existing);
                    to_run.push(plan.service);
                }
                ReconcileAction::Create => to_run.push(plan.service),
            }
        }

        for container in &to_stop {
            if let Err(e) = self.runtime.stop_container(&container.name).await {
                warn!(container = %container.name, error = %e, "failed to stop superseded container");
            }
            if let Err(e) = self.runtime.remove_container(&container.name).await {
                warn!(container = %container.name, error = %e, "failed to remove superseded container");
            }
        }

        let provisioner = NetworkProvisioner::new(Arc::clone(&self.runtime));
        let mut outcome = DeployOutcome::default();
        for service in to_run {
            match self.start_service(&provisioner, service, &addon.id).await {
                Ok(handle) => {
                    info!(addon = %addon.id, container = %handle.name, "started container");
                    outcome.new_containers.push(handle);
                }
                Err((service, e)) => {
                    warn!(addon = %addon.id, service = %service.name, error = %e, "failed to start service");
                    outcome.failed_services.push(service);
                }
            }
        }

        Ok(outcome)
    }

    /// Label, provision and start one service. Returns the service back with
    /// the error on failure so the caller can report it.
    async fn start_service(
        &self,
        provisioner: &NetworkProvisioner,
        mut service: ServiceSpec,
        addon_id: &str,
    ) -> std::result::Result<ContainerHandle, (ServiceSpec, crate::error::Error)> {
        self.ctx.apply_ownership_labels(&mut service, addon_id);

        if service.networks.is_empty() {
            service
                .networks
                .push(self.ctx.config().default_network.clone());
        }

        if let Err(e) = provisioner.ensure(&service.networks).await {
            return Err((service, e));
        }

        // Only the first listed network is attached at start; multi-network
        // attachment is out of scope for this deployment model.
        let network = service.networks.first().cloned();

        let spec = RunSpec {
            name: service.name.clone(),
            image: service.image.clone(),
            command: service.command.clone(),
            network,
            ports: service.ports.clone(),
            environment: service.environment.clone(),
            labels: service.labels.clone(),
        };

        match self.runtime.run_container(&spec).await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                let err = crate::error::Error::ServiceStartFailed(service.name.clone(), e.to_string());
                Err((service, err))
            }
        }
    }
}
