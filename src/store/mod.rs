//! Addon record persistence.
//!
//! The engine does not own addon storage; it reads records and writes status
//! transitions through [`AddonStore`]. The shipped implementation is
//! SQLite-backed; tests substitute an in-memory store.

mod sqlite;

pub use sqlite::SqliteAddonStore;

use crate::addon::{Addon, AddonStatus, ServiceSpec};
use crate::error::Result;
use async_trait::async_trait;

/// Fields of a new addon record; the store assigns the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewAddon {
    pub marketplace_id: String,
    pub status: AddonStatus,
    pub services: Vec<ServiceSpec>,
}

/// Partial update of an addon record. Fields left `None` are untouched.
#[derive(Debug, Clone, Default)]
pub struct AddonPatch {
    pub status: Option<AddonStatus>,
    pub services: Option<Vec<ServiceSpec>>,
}

impl AddonPatch {
    pub fn status(status: AddonStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait AddonStore: Send + Sync {
    /// Persist a new addon record and return it with its assigned id.
    async fn create_addon(&self, addon: NewAddon) -> Result<Addon>;

    /// Apply a partial update. Status changes must follow the addon
    /// lifecycle ([`AddonStatus::can_transition`]); illegal transitions are
    /// rejected with [`crate::Error::InvalidStatusTransition`].
    async fn update_addon(&self, id: &str, patch: AddonPatch) -> Result<()>;

    async fn get_addon(&self, id: &str) -> Result<Option<Addon>>;

    /// All addons that are installing or enabled (not failed). These are the
    /// addons the engine redeploys at startup.
    async fn find_active_addons(&self) -> Result<Vec<Addon>>;
}
