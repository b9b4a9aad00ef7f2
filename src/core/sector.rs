//! Sector lookup abstraction

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SectorProvider: Send + Sync {
    /// Returns the sector label for `symbol`, or `None` when the provider
    /// knows the symbol but has no sector for it.
    async fn fetch_sector(&self, symbol: &str) -> Result<Option<String>>;
}
