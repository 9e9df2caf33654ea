//! Service reconciliation: decide what to do with a desired service given
//! the container (if any) currently holding its name.
//!
//! This is a pure decision function so the policy is testable without a
//! runtime. The deployer executes the resulting plans.

use crate::addon::ServiceSpec;
use crate::runtime::ContainerSummary;

/// What the deployer should do for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// A running container with the right image already holds the name.
    /// Nothing is started or stopped.
    Reuse,
    /// A container holds the name but is stopped or runs a different image.
    /// It must be stopped and removed before the replacement starts.
    Replace { existing: ContainerSummary },
    /// No container holds the name.
    Create,
}

/// One service's reconciliation outcome: the action plus the (possibly
/// merged) service definition to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePlan {
    pub action: ReconcileAction,
    pub service: ServiceSpec,
}

impl ServicePlan {
    pub fn is_reuse(&self) -> bool {
        self.action == ReconcileAction::Reuse
    }
}

/// Decide reuse/replace/create for a service.
///
/// On replace, the existing container's attached networks are appended to the
/// service's desired networks (so an upgrade never silently drops
/// connectivity) and its published ports are inherited for any port key the
/// service doesn't configure itself; explicit configuration always wins
/// over inherited configuration.
pub fn plan_service(service: ServiceSpec, existing: Option<ContainerSummary>) -> ServicePlan {
    let Some(container) = existing else {
        return ServicePlan {
            action: ReconcileAction::Create,
            service,
        };
    };

    if container.is_running() && container.has_image_tag(&service.image) {
        return ServicePlan {
            action: ReconcileAction::Reuse,
            service,
        };
    }

    let merged = merge_from_container(service, &container);
    ServicePlan {
        action: ReconcileAction::Replace {
            existing: container,
        },
        service: merged,
    }
}

/// Fold a superseded container's networks and ports into the service spec.
fn merge_from_container(mut service: ServiceSpec, container: &ContainerSummary) -> ServiceSpec {
    for network in &container.networks {
        if !service.networks.contains(network) {
            service.networks.push(network.clone());
        }
    }

    for (port_key, host_port) in &container.ports {
        service
            .ports
            .entry(port_key.clone())
            .or_insert_with(|| host_port.clone());
    }

    service
}
