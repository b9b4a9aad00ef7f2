//! Progress hooks fired while the allocator runs.

use crate::core::allocation::{BudgetSplit, Category, PurchaseLine};
use tracing::{debug, info};

/// Receives allocation progress. Every hook defaults to doing nothing, so an
/// implementation only overrides what it cares about.
pub trait AllocationObserver {
    fn on_split(&self, _split: &BudgetSplit) {}

    fn on_universe_start(&self, _category: Category, _budget: f64) {}

    fn on_sector_start(&self, _category: Category, _sector: &str, _sector_budget: f64) {}

    fn on_purchase(&self, _line: &PurchaseLine) {}

    fn on_budget_exhausted(&self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AllocationObserver for NoopObserver {}

/// Observer that reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl AllocationObserver for LoggingObserver {
    fn on_split(&self, split: &BudgetSplit) {
        info!(
            mid_cap = split.mid_cap,
            broad_market = split.broad_market,
            "Split budget between universes"
        );
    }

    fn on_universe_start(&self, category: Category, budget: f64) {
        info!(%category, budget, "Allocating universe");
    }

    fn on_sector_start(&self, category: Category, sector: &str, sector_budget: f64) {
        debug!(%category, sector, sector_budget, "Allocating sector bucket");
    }

    fn on_purchase(&self, line: &PurchaseLine) {
        debug!(
            symbol = %line.symbol,
            quantity = line.quantity,
            price = line.price,
            remaining = line.remaining_budget,
            "Purchased"
        );
    }

    fn on_budget_exhausted(&self) {
        info!("Budget fully utilized");
    }
}
