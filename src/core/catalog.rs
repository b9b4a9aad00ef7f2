//! Builds the priced security catalog from the raw universes.
//!
//! All network lookups happen here, before the allocator runs. Lookup failures
//! never abort the run: a missing sector becomes [`UNKNOWN_SECTOR`] and a
//! missing price becomes [`PriceQuote::Unresolved`], which the price filter
//! then drops.

use crate::core::price::PriceProvider;
use crate::core::sector::SectorProvider;
use crate::core::security::{Listing, PriceQuote, Security, UNKNOWN_SECTOR, filter_priced};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Upper bound on lookups in flight at once, per resolution pass.
pub const MAX_CONCURRENT_LOOKUPS: usize = 16;

/// Priced, sectorized securities for both universes, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub mid_cap: Vec<Security>,
    pub broad_market: Vec<Security>,
}

/// Looks up the sector for `symbol`, falling back to "Unknown".
pub async fn resolve_sector(provider: &dyn SectorProvider, symbol: &str) -> String {
    match provider.fetch_sector(symbol).await {
        Ok(Some(sector)) if !sector.trim().is_empty() => sector,
        Ok(_) => {
            debug!(symbol, "No sector reported");
            UNKNOWN_SECTOR.to_string()
        }
        Err(e) => {
            warn!(symbol, error = %e, "Failed to fetch sector");
            UNKNOWN_SECTOR.to_string()
        }
    }
}

/// Tags each symbol with its sector, keeping the input order.
pub async fn resolve_sectors(
    provider: &dyn SectorProvider,
    symbols: &[String],
    on_progress: &(dyn Fn() + Sync),
) -> Vec<Listing> {
    stream::iter(symbols)
        .map(|symbol| async move {
            let sector = resolve_sector(provider, symbol).await;
            on_progress();
            Listing::new(symbol.clone(), sector)
        })
        .buffered(MAX_CONCURRENT_LOOKUPS)
        .collect()
        .await
}

/// Fetches the latest price for each distinct symbol.
pub async fn resolve_prices(
    provider: &dyn PriceProvider,
    symbols: &[String],
    on_progress: &(dyn Fn() + Sync),
) -> HashMap<String, PriceQuote> {
    let mut seen = HashSet::new();
    let distinct: Vec<&String> = symbols.iter().filter(|s| seen.insert(*s)).collect();

    stream::iter(distinct)
        .map(|symbol| async move {
            let quote = match provider.fetch_price(symbol).await {
                Ok(result) => PriceQuote::Resolved(result.price),
                Err(e) => PriceQuote::Unresolved {
                    reason: e.to_string(),
                },
            };
            on_progress();
            (symbol.clone(), quote)
        })
        .buffered(MAX_CONCURRENT_LOOKUPS)
        .collect()
        .await
}

/// Number of lookups [`build_catalog`] performs, for sizing progress bars.
pub fn lookup_count(mid_cap_symbols: &[String], broad_market: &[Listing]) -> u64 {
    let distinct: HashSet<&str> = mid_cap_symbols
        .iter()
        .map(String::as_str)
        .chain(broad_market.iter().map(|l| l.symbol.as_str()))
        .collect();
    (mid_cap_symbols.len() + distinct.len()) as u64
}

/// Resolves mid-cap sectors, prices both universes and drops unpriced symbols.
pub async fn build_catalog(
    mid_cap_symbols: &[String],
    broad_market: &[Listing],
    price_provider: &dyn PriceProvider,
    sector_provider: &dyn SectorProvider,
    on_progress: &(dyn Fn() + Sync),
) -> Catalog {
    let mid_cap = resolve_sectors(sector_provider, mid_cap_symbols, on_progress).await;

    let all_symbols: Vec<String> = mid_cap_symbols
        .iter()
        .cloned()
        .chain(broad_market.iter().map(|l| l.symbol.clone()))
        .collect();
    let prices = resolve_prices(price_provider, &all_symbols, on_progress).await;

    let catalog = Catalog {
        mid_cap: filter_priced(&mid_cap, &prices),
        broad_market: filter_priced(broad_market, &prices),
    };
    debug!(
        mid_cap = catalog.mid_cap.len(),
        broad_market = catalog.broad_market.len(),
        "Built security catalog"
    );
    catalog
}
