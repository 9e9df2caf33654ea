//! Reconciliation decision properties: a fresh service is created
//! unmodified, a matching running container is reused, and everything else
//! is replaced with networks and ports carried over.

mod common;

use addon_engine::engine::{plan_service, ReconcileAction};
use addon_engine::runtime::ContainerState;
use common::{running_container, service};

#[test]
fn fresh_service_is_created_with_an_unmodified_definition() {
    let mut spec = service("web", "nginx:1.25");
    spec.networks = vec!["front".into()];
    spec.ports.insert("80/tcp".into(), "8080".into());

    let plan = plan_service(spec.clone(), None);

    assert_eq!(plan.action, ReconcileAction::Create);
    assert_eq!(plan.service, spec);
}

#[test]
fn running_container_with_same_image_is_reused() {
    let plan = plan_service(
        service("web", "nginx:1.25"),
        Some(running_container("web", "nginx:1.25")),
    );
    assert_eq!(plan.action, ReconcileAction::Reuse);
}

#[test]
fn merged_networks_are_a_superset_of_the_old_containers() {
    let mut old = running_container("web", "nginx:1.25");
    old.state = ContainerState::Exited;
    old.networks = vec!["bridge".into(), "back".into()];

    let mut spec = service("web", "nginx:1.25");
    spec.networks = vec!["front".into(), "back".into()];

    let plan = plan_service(spec, Some(old.clone()));

    assert!(matches!(plan.action, ReconcileAction::Replace { .. }));
    for network in &old.networks {
        assert!(
            plan.service.networks.contains(network),
            "network '{}' was dropped by the merge",
            network
        );
    }
    // No duplicates from the overlap.
    assert_eq!(plan.service.networks, vec!["front", "back", "bridge"]);
}

#[test]
fn explicitly_configured_ports_are_never_overwritten_by_inherited_ones() {
    let mut old = running_container("web", "nginx:1.24");
    old.ports.insert("80/tcp".into(), "8080".into());
    old.ports.insert("443/tcp".into(), "8443".into());

    let mut spec = service("web", "nginx:1.25");
    spec.ports.insert("80/tcp".into(), "9090".into());

    let plan = plan_service(spec, Some(old));

    assert_eq!(plan.service.ports.get("80/tcp").unwrap(), "9090");
    assert_eq!(plan.service.ports.get("443/tcp").unwrap(), "8443");
}

#[test]
fn image_mismatch_replaces_even_a_running_container() {
    let plan = plan_service(
        service("db", "postgres:16"),
        Some(running_container("db", "postgres:15")),
    );
    assert!(matches!(plan.action, ReconcileAction::Replace { .. }));
}
