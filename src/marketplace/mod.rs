//! Marketplace catalog client.
//!
//! The catalog is an external collaborator: a lookup failure aborts an
//! installation before any record or container is created.

use crate::addon::ServiceSpec;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// A catalog entry: the service definitions an addon is installed from.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogAddon {
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

/// Catalog lookup capability, so the install path can be exercised without a
/// live marketplace.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_addon_by_marketplace_id(&self, marketplace_id: &str) -> Result<CatalogAddon>;
}

/// HTTP client for the marketplace service.
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    api_base: String,
    http: reqwest::Client,
}

impl MarketplaceClient {
    /// `api_base` is the API root, e.g. `http://marketplace:8080/api/v1/marketplace`.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Catalog for MarketplaceClient {
    async fn get_addon_by_marketplace_id(&self, marketplace_id: &str) -> Result<CatalogAddon> {
        let url = format!("{}/{}", self.api_base, marketplace_id);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let addon = response.json::<CatalogAddon>().await?;
        Ok(addon)
    }
}
