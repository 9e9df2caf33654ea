//! Installation coordination: marketplace lookup, record creation and
//! asynchronous deployment with status write-back.

use super::deploy::AddonDeployer;
use crate::addon::{Addon, AddonStatus};
use crate::error::{Error, Result};
use crate::marketplace::Catalog;
use crate::runtime::ContainerRuntime;
use crate::store::{AddonPatch, AddonStore, NewAddon};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Result of [`InstallCoordinator::install`]: the created record, returned
/// before deployment completes, plus a handle on the deployment task. The
/// final outcome is observable via the addon's persisted status; the handle
/// exists so callers that want to block (CLI, tests) can.
#[derive(Debug)]
pub struct InstallReceipt {
    pub addon: Addon,
    pub deployment: JoinHandle<AddonStatus>,
}

pub struct InstallCoordinator {
    /// Absent when no marketplace is configured; only `install` needs it.
    catalog: Option<Arc<dyn Catalog>>,
    store: Arc<dyn AddonStore>,
    deployer: AddonDeployer,
    runtime: Arc<dyn ContainerRuntime>,
}

impl InstallCoordinator {
    pub fn new(
        store: Arc<dyn AddonStore>,
        deployer: AddonDeployer,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            catalog: None,
            store,
            deployer,
            runtime,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Install an addon from the marketplace.
    ///
    /// The catalog is consulted first; a lookup failure (or an entry with no
    /// services) aborts before anything is persisted or started. On success
    /// the record is created with status `installing` and deployment runs in
    /// a background task that writes the final status back.
    pub async fn install(&self, marketplace_id: &str) -> Result<InstallReceipt> {
        let catalog = self.catalog.as_ref().ok_or_else(|| {
            Error::Config("MARKETPLACE_ADDR is not set; cannot install addons".to_string())
        })?;

        let catalog_addon = catalog.get_addon_by_marketplace_id(marketplace_id).await?;

        if catalog_addon.services.is_empty() {
            return Err(Error::AddonHasNoServices(marketplace_id.to_string()));
        }

        let addon = self
            .store
            .create_addon(NewAddon {
                marketplace_id: marketplace_id.to_string(),
                status: AddonStatus::Installing,
                services: catalog_addon.services,
            })
            .await?;

        info!(addon = %addon.id, marketplace_id, "created addon record, deploying");

        let deployer = self.deployer.clone();
        let store = Arc::clone(&self.store);
        let task_addon = addon.clone();
        let deployment =
            tokio::spawn(async move { deploy_and_record(&deployer, &*store, &task_addon).await });

        Ok(InstallReceipt { addon, deployment })
    }

    /// Deploy (or redeploy) one addon and persist the resulting status.
    pub async fn deploy_addon(&self, addon: &Addon) -> AddonStatus {
        deploy_and_record(&self.deployer, &*self.store, addon).await
    }

    /// Redeploy every non-failed addon from the store. Run at engine startup
    /// so addons survive a host or engine restart.
    pub async fn resume_active(&self) -> Result<()> {
        let addons = self.store.find_active_addons().await?;
        if addons.is_empty() {
            return Ok(());
        }

        info!(count = addons.len(), "resuming active addons");
        for addon in addons {
            let status = deploy_and_record(&self.deployer, &*self.store, &addon).await;
            info!(addon = %addon.id, status = %status, "resumed addon");
        }
        Ok(())
    }

    /// Stop and remove every container belonging to an addon. A service
    /// whose container is already gone is logged and skipped.
    pub async fn stop_addon(&self, addon: &Addon) -> Result<()> {
        for service in &addon.services {
            match self.runtime.get_container(&service.name).await? {
                Some(container) => {
                    self.runtime.stop_container(&container.name).await?;
                    self.runtime.remove_container(&container.name).await?;
                    info!(addon = %addon.id, container = %container.name, "stopped container");
                }
                None => {
                    warn!(addon = %addon.id, service = %service.name, "container not found");
                }
            }
        }
        Ok(())
    }

    /// Best-effort removal of every service image of an addon.
    pub async fn remove_addon_images(&self, addon: &Addon) {
        for service in &addon.services {
            if let Err(e) = self.runtime.remove_image(&service.image).await {
                warn!(image = %service.image, error = %e, "failed to remove image");
            }
        }
    }
}

/// Deploy an addon and persist the resulting status. Never returns an error:
/// any failure becomes a `failed` status on the record.
pub(crate) async fn deploy_and_record(
    deployer: &AddonDeployer,
    store: &dyn AddonStore,
    addon: &Addon,
) -> AddonStatus {
    let status = match deployer.deploy(addon).await {
        Ok(outcome) if outcome.is_fully_deployed() => AddonStatus::Enabled,
        Ok(outcome) => {
            let names: Vec<&str> = outcome
                .failed_services
                .iter()
                .map(|s| s.name.as_str())
                .collect();
            error!(addon = %addon.id, failed_services = ?names, "some services failed to start");
            AddonStatus::Failed
        }
        Err(e) => {
            error!(addon = %addon.id, error = %e, "deployment failed");
            AddonStatus::Failed
        }
    };

    if let Err(e) = store
        .update_addon(&addon.id, AddonPatch::status(status))
        .await
    {
        error!(addon = %addon.id, error = %e, "failed to persist addon status");
    }

    status
}
