//! Container failure monitoring with bounded automatic restart.
//!
//! The monitor owns the retry ledger: a map from container name to
//! consecutive-failure count. Keying by container identity means one
//! misbehaving service in a multi-service addon never affects the retry
//! budget of its siblings. The owning addon is re-resolved from the
//! ownership label on every scan, never cached.

use super::context::EngineContext;
use crate::addon::AddonStatus;
use crate::error::Result;
use crate::runtime::{ContainerRuntime, ContainerState};
use crate::store::{AddonPatch, AddonStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct FailureMonitor {
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<dyn AddonStore>,
    ctx: Arc<EngineContext>,
    /// Retry ledger: container name -> consecutive non-zero exits observed.
    retries: HashMap<String, u32>,
}

impl FailureMonitor {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn AddonStore>,
        ctx: Arc<EngineContext>,
    ) -> Self {
        Self {
            runtime,
            store,
            ctx,
            retries: HashMap::new(),
        }
    }

    /// Current retry count for a container, if it is being tracked.
    pub fn retry_count(&self, container: &str) -> Option<u32> {
        self.retries.get(container).copied()
    }

    /// Run one monitoring cycle:
    ///
    /// 1. List only containers owned by this engine instance.
    /// 2. Book non-zero exits into the ledger; give up and mark the owning
    ///    addon failed once a container reaches the retry budget.
    /// 3. Drop ledger entries whose container stabilized (exited zero) or
    ///    disappeared.
    /// 4. Restart every container still tracked in the ledger, including
    ///    ones booked in this same pass.
    pub async fn scan_once(&mut self) -> Result<()> {
        let owned = self
            .runtime
            .list_labeled(&self.ctx.ownership_filter())
            .await?;

        let present: HashSet<&str> = owned.iter().map(|c| c.name.as_str()).collect();

        for container in &owned {
            if container.state != ContainerState::Exited {
                continue;
            }
            if container.exit_code == 0 {
                // Clean exit is not a failure; a tracked container that
                // exits zero has stabilized.
                if self.retries.remove(&container.name).is_some() {
                    info!(container = %container.name, "container exited cleanly, dropping from retry ledger");
                }
                continue;
            }

            let addon_id_label = &self.ctx.config().addon_id_label;
            let Some(addon_id) = container.label(addon_id_label) else {
                // Without the addon label the failure cannot be attributed.
                // That is a configuration-integrity problem, not retryable.
                warn!(
                    container = %container.name,
                    "exited container has no addon id label, skipping"
                );
                continue;
            };

            self.book_failure(&container.name, addon_id, container.exit_code)
                .await;
        }

        self.retries.retain(|name, _| present.contains(name.as_str()));

        // Restart phase: every ledger entry, every cycle, until the
        // container stabilizes or its budget is exceeded.
        for name in self.retries.keys() {
            debug!(container = %name, "restarting tracked container");
            if let Err(e) = self.runtime.restart_container(name).await {
                warn!(container = %name, error = %e, "failed to restart container");
            }
        }

        Ok(())
    }

    /// Record one non-zero exit for a container. Marks the owning addon
    /// failed and forgets the container once the budget is reached.
    async fn book_failure(&mut self, container: &str, addon_id: &str, exit_code: i64) {
        warn!(
            addon = %addon_id,
            container = %container,
            exit_code,
            "container exited with non-zero code"
        );

        let failures = self.retry_count(container).unwrap_or(0) + 1;
        if failures >= self.ctx.config().max_retries {
            error!(
                addon = %addon_id,
                container = %container,
                failures,
                "container exceeded retry budget, marking addon failed"
            );
            self.retries.remove(container);
            if let Err(e) = self
                .store
                .update_addon(addon_id, AddonPatch::status(AddonStatus::Failed))
                .await
            {
                error!(addon = %addon_id, error = %e, "failed to persist failed status");
            }
        } else {
            self.retries.insert(container.to_string(), failures);
        }
    }

    /// Run the monitoring loop until cancelled. One scan per poll interval;
    /// scan errors are logged and the loop continues.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.ctx.config().poll_interval);
        // The immediate first tick would scan before anything is deployed.
        interval.tick().await;

        info!(
            engine = %self.ctx.engine_id(),
            interval_secs = self.ctx.config().poll_interval.as_secs(),
            "failure monitor started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("failure monitor shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.scan_once().await {
                        error!(error = %e, "monitor scan failed");
                    }
                }
            }
        }
    }
}
