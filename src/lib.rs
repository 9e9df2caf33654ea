//! # Addon Engine
//!
//! A container orchestration engine for "addons": named bundles of one or
//! more containerized services installed from a marketplace and deployed on a
//! single container host.
//!
//! ## What it does
//!
//! - **Install**: look up an addon in the marketplace catalog, persist a
//!   record, deploy its services asynchronously and write the final status
//!   back.
//! - **Reconcile**: for each desired service, decide whether the container
//!   of the same name can be reused, must be replaced (inheriting networks
//!   and ports so upgrades don't regress connectivity), or created fresh.
//! - **Monitor**: a background loop watches containers owned by this engine
//!   instance, restarts those that exit non-zero, and marks the owning addon
//!   failed once a per-container retry budget is exhausted.
//!
//! ## Ownership model
//!
//! Every container the engine creates carries three labels: the addon id,
//! this engine instance's id, and the service name. Instance-id labeling is
//! the sole isolation mechanism between engine instances sharing a host:
//! each instance only supervises what it created. No locks, no leader
//! election.
//!
//! ## Quick start
//!
//! ```no_run
//! use addon_engine::{
//!     AddonDeployer, EngineConfig, EngineContext, FailureMonitor, SqliteAddonStore,
//! };
//! use addon_engine::runtime::DockerRuntime;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), addon_engine::Error> {
//! let config = EngineConfig::from_env()?;
//! let ctx = Arc::new(EngineContext::new(config));
//! let runtime = Arc::new(DockerRuntime::new());
//! let store = Arc::new(SqliteAddonStore::open("addons.db").await?);
//!
//! let deployer = AddonDeployer::new(runtime.clone(), ctx.clone());
//! let monitor = FailureMonitor::new(runtime, store, ctx);
//!
//! let cancel = tokio_util::sync::CancellationToken::new();
//! tokio::spawn(monitor.run(cancel.clone()));
//! # Ok(())
//! # }
//! ```

pub mod addon;
pub mod config;
pub mod docker;
pub mod engine;
pub mod error;
pub mod marketplace;
pub mod runtime;
pub mod store;

// Re-export commonly used types
pub use addon::{Addon, AddonStatus, ServiceSpec};
pub use config::EngineConfig;
pub use engine::{
    AddonDeployer, DeployOutcome, EngineContext, FailureMonitor, InstallCoordinator,
    InstallReceipt, NetworkProvisioner,
};
pub use error::{Error, Result};
pub use marketplace::MarketplaceClient;
pub use store::{AddonPatch, AddonStore, NewAddon, SqliteAddonStore};
