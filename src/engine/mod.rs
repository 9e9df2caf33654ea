//! The orchestration core: reconciliation, deployment, network provisioning,
//! failure monitoring and installation coordination.

mod context;
mod deploy;
mod install;
mod monitor;
mod networks;
mod reconcile;

pub use context::EngineContext;
pub use deploy::{AddonDeployer, DeployOutcome};
pub use install::{InstallCoordinator, InstallReceipt};
pub use monitor::FailureMonitor;
pub use networks::NetworkProvisioner;
pub use reconcile::{plan_service, ReconcileAction, ServicePlan};
