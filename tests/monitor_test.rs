//! Failure monitor: retry ledger bookkeeping, ownership scoping and the
//! bounded-restart budget. Each test drives single scan cycles explicitly
//! instead of waiting on the poll interval.

mod common;

use addon_engine::addon::AddonStatus;
use addon_engine::engine::FailureMonitor;
use addon_engine::store::{AddonStore, NewAddon};
use common::{engine_context, owned_container, service, FakeRuntime, MemoryStore};
use std::sync::Arc;

struct Fixture {
    runtime: Arc<FakeRuntime>,
    store: Arc<MemoryStore>,
    monitor: FailureMonitor,
    addon_id: String,
}

/// Monitor with budget 3, one persisted enabled addon and its container
/// running under engine "engine-a".
async fn fixture() -> Fixture {
    let runtime = Arc::new(FakeRuntime::new());
    let store = Arc::new(MemoryStore::new());
    let ctx = engine_context("engine-a", 3);

    let addon = store
        .create_addon(NewAddon {
            marketplace_id: "mp-1".to_string(),
            status: AddonStatus::Enabled,
            services: vec![service("web", "x:1")],
        })
        .await
        .unwrap();

    runtime.insert_container(owned_container("web", "engine-a", &addon.id));

    let monitor = FailureMonitor::new(runtime.clone(), store.clone(), ctx);
    Fixture {
        runtime,
        store,
        monitor,
        addon_id: addon.id,
    }
}

#[tokio::test]
async fn clean_exit_is_not_a_failure() {
    let mut f = fixture().await;
    f.runtime.set_exited("web", 0);

    f.monitor.scan_once().await.unwrap();

    assert_eq!(f.monitor.retry_count("web"), None);
    assert!(f.runtime.events().iter().all(|e| !e.starts_with("restart")));
    assert_eq!(f.store.get(&f.addon_id).unwrap().status, AddonStatus::Enabled);
}

#[tokio::test]
async fn running_container_is_never_booked() {
    let mut f = fixture().await;
    // Container hangs but never exits: no ledger entry, no restart.
    f.monitor.scan_once().await.unwrap();
    assert_eq!(f.monitor.retry_count("web"), None);
    assert!(f.runtime.events().is_empty());
}

#[tokio::test]
async fn nonzero_exit_is_booked_and_restarted_in_the_same_pass() {
    let mut f = fixture().await;
    f.runtime.set_exited("web", 1);

    f.monitor.scan_once().await.unwrap();

    assert_eq!(f.monitor.retry_count("web"), Some(1));
    assert_eq!(f.runtime.events(), vec!["restart web".to_string()]);
}

#[tokio::test]
async fn third_failure_under_budget_three_marks_the_addon_failed() {
    let mut f = fixture().await;

    for expected in 1..=2u32 {
        f.runtime.set_exited("web", 1);
        f.monitor.scan_once().await.unwrap();
        assert_eq!(f.monitor.retry_count("web"), Some(expected));
        // The restart brought it back up; it fails again before next scan.
    }

    f.runtime.set_exited("web", 1);
    f.monitor.scan_once().await.unwrap();

    // Budget exhausted: addon failed, ledger entry dropped, no restart.
    assert_eq!(f.monitor.retry_count("web"), None);
    assert_eq!(f.store.get(&f.addon_id).unwrap().status, AddonStatus::Failed);
    let restarts = f
        .runtime
        .events()
        .iter()
        .filter(|e| e.starts_with("restart"))
        .count();
    assert_eq!(restarts, 2);
}

#[tokio::test]
async fn recreated_container_starts_a_fresh_count() {
    let mut f = fixture().await;

    for _ in 0..3 {
        f.runtime.set_exited("web", 1);
        f.monitor.scan_once().await.unwrap();
    }
    assert_eq!(f.monitor.retry_count("web"), None);

    // The container is recreated (same name) and fails again: the count
    // starts over from zero rather than inheriting the exhausted budget.
    f.runtime.remove("web");
    f.runtime
        .insert_container(owned_container("web", "engine-a", &f.addon_id));
    f.runtime.set_exited("web", 1);

    f.monitor.scan_once().await.unwrap();
    assert_eq!(f.monitor.retry_count("web"), Some(1));
}

#[tokio::test]
async fn containers_of_other_engine_instances_are_invisible() {
    let mut f = fixture().await;
    let mut foreign = owned_container("other", "engine-b", &f.addon_id);
    foreign.state = addon_engine::runtime::ContainerState::Exited;
    foreign.exit_code = 1;
    f.runtime.insert_container(foreign);

    f.monitor.scan_once().await.unwrap();

    assert_eq!(f.monitor.retry_count("other"), None);
    assert!(f.runtime.events().iter().all(|e| !e.ends_with(" other")));
}

#[tokio::test]
async fn missing_addon_label_is_skipped() {
    let mut f = fixture().await;
    let mut unlabeled = owned_container("ghost", "engine-a", "unused");
    unlabeled.labels.remove("oak.addon.id");
    unlabeled.state = addon_engine::runtime::ContainerState::Exited;
    unlabeled.exit_code = 2;
    f.runtime.insert_container(unlabeled);

    f.monitor.scan_once().await.unwrap();

    assert_eq!(f.monitor.retry_count("ghost"), None);
    assert!(f.runtime.events().iter().all(|e| !e.ends_with(" ghost")));
}

#[tokio::test]
async fn tracked_containers_are_restarted_every_cycle_until_they_stabilize() {
    let mut f = fixture().await;
    f.runtime.set_exited("web", 1);
    f.monitor.scan_once().await.unwrap();

    // Still tracked while running: the restart policy keeps firing each
    // cycle until the container exits zero or disappears.
    f.monitor.scan_once().await.unwrap();
    let restarts = f
        .runtime
        .events()
        .iter()
        .filter(|e| *e == "restart web")
        .count();
    assert_eq!(restarts, 2);
    assert_eq!(f.monitor.retry_count("web"), Some(1));

    // A clean exit stabilizes it and clears the entry.
    f.runtime.set_exited("web", 0);
    f.monitor.scan_once().await.unwrap();
    assert_eq!(f.monitor.retry_count("web"), None);
}

#[tokio::test]
async fn removed_containers_are_pruned_from_the_ledger() {
    let mut f = fixture().await;
    f.runtime.set_exited("web", 1);
    f.monitor.scan_once().await.unwrap();
    assert_eq!(f.monitor.retry_count("web"), Some(1));

    f.runtime.remove("web");
    f.monitor.scan_once().await.unwrap();
    assert_eq!(f.monitor.retry_count("web"), None);
}

#[tokio::test]
async fn sibling_services_keep_independent_budgets() {
    let mut f = fixture().await;
    f.runtime
        .insert_container(owned_container("db", "engine-a", &f.addon_id));

    // "web" fails twice, "db" once; the counts never bleed into each other.
    f.runtime.set_exited("web", 1);
    f.monitor.scan_once().await.unwrap();
    f.runtime.set_exited("web", 1);
    f.runtime.set_exited("db", 1);
    f.monitor.scan_once().await.unwrap();

    assert_eq!(f.monitor.retry_count("web"), Some(2));
    assert_eq!(f.monitor.retry_count("db"), Some(1));
}
