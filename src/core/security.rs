//! Securities and the price filter that guards the allocator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Sector label used when a symbol's sector cannot be determined.
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// A candidate symbol tagged with its sector, before any price is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub symbol: String,
    pub sector: String,
}

impl Listing {
    pub fn new(symbol: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sector: sector.into(),
        }
    }
}

/// A priced, sectorized security ready for allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    pub symbol: String,
    pub sector: String,
    pub price: f64,
}

impl Security {
    pub fn new(symbol: impl Into<String>, sector: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            sector: sector.into(),
            price,
        }
    }
}

/// Outcome of looking up the latest price for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceQuote {
    Resolved(f64),
    Unresolved { reason: String },
}

impl PriceQuote {
    /// Returns the price only when it can be used to buy whole shares.
    pub fn usable_price(&self) -> Option<f64> {
        match self {
            PriceQuote::Resolved(price) if price.is_finite() && *price > 0.0 => Some(*price),
            _ => None,
        }
    }
}

/// Attaches prices to listings, dropping every listing without a usable price.
///
/// Missing, unresolved, non-finite and non-positive quotes are all treated the
/// same way. Input order is preserved.
pub fn filter_priced(listings: &[Listing], prices: &HashMap<String, PriceQuote>) -> Vec<Security> {
    listings
        .iter()
        .filter_map(|listing| match prices.get(&listing.symbol) {
            Some(quote) => match quote.usable_price() {
                Some(price) => Some(Security::new(
                    listing.symbol.clone(),
                    listing.sector.clone(),
                    price,
                )),
                None => {
                    match quote {
                        PriceQuote::Unresolved { reason } => {
                            warn!(symbol = %listing.symbol, %reason, "Excluding symbol without price")
                        }
                        PriceQuote::Resolved(price) => {
                            warn!(symbol = %listing.symbol, price, "Excluding symbol with unusable price")
                        }
                    }
                    None
                }
            },
            None => {
                warn!(symbol = %listing.symbol, "Excluding symbol missing from price data");
                None
            }
        })
        .collect()
}
