//! Network provisioning: make sure named networks exist before containers
//! attach to them. Networks are only ever created here, never deleted.

use crate::error::{Error, Result};
use crate::runtime::ContainerRuntime;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct NetworkProvisioner {
    runtime: Arc<dyn ContainerRuntime>,
}

impl NetworkProvisioner {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Ensure every named network exists, creating the missing ones with
    /// default settings. Returns the subset actually created.
    ///
    /// Each creation is attempted independently so one bad network doesn't
    /// block the rest; the first failure encountered is surfaced to the
    /// caller after the batch.
    pub async fn ensure(&self, desired: &[String]) -> Result<Vec<String>> {
        let existing: HashSet<String> = self.runtime.list_networks().await?.into_iter().collect();

        let mut created = Vec::new();
        let mut first_error: Option<Error> = None;

        for network in desired {
            if existing.contains(network) || created.contains(network) {
                debug!(network = %network, "network already exists");
                continue;
            }
            match self.runtime.create_network(network).await {
                Ok(()) => {
                    info!(network = %network, "created network");
                    created.push(network.clone());
                }
                Err(e) => {
                    warn!(network = %network, error = %e, "failed to create network");
                    if first_error.is_none() {
                        first_error = Some(Error::NetworkCreate {
                            network: network.clone(),
                            source: e,
                        });
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(created),
        }
    }
}
