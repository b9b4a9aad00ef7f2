//! Greedy whole-share allocation across the mid-cap and broad-market universes.
//!
//! The budget is split between the two universes, each universe's share is
//! divided into sector buckets, and securities are funded first-fit in input
//! order until a bucket or the total budget runs out.

use crate::core::error::AllocationError;
use crate::core::observer::{AllocationObserver, NoopObserver};
use crate::core::security::Security;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Largest share count that `f64` arithmetic still counts exactly (2^53).
pub const MAX_SHARES: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    MidCap,
    BroadMarket,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::MidCap => "Mid Cap",
            Category::BroadMarket => "S&P 500",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Share of a universe's budget reserved for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorTarget {
    pub sector: String,
    pub fraction: f64,
}

impl SectorTarget {
    pub fn new(sector: impl Into<String>, fraction: f64) -> Self {
        Self {
            sector: sector.into(),
            fraction,
        }
    }
}

/// Ordered sector targets. Sectors are funded in list order and fractions are
/// applied as-is, without renormalizing them to sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorAllocation(Vec<SectorTarget>);

impl SectorAllocation {
    pub fn new(targets: Vec<SectorTarget>) -> Self {
        Self(targets)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SectorTarget> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SectorAllocation {
    fn default() -> Self {
        Self(vec![
            SectorTarget::new("Technology", 0.4),
            SectorTarget::new("Healthcare", 0.3),
            SectorTarget::new("Consumer Goods", 0.2),
            SectorTarget::new("Energy", 0.1),
        ])
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for SectorAllocation {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(sector, fraction)| SectorTarget::new(sector, fraction))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRequest {
    pub total_budget: f64,
    /// Percentage (0-100) of the budget reserved for the mid-cap universe.
    pub mid_cap_percent: f64,
    pub sector_allocation: SectorAllocation,
    pub mid_cap: Vec<Security>,
    pub broad_market: Vec<Security>,
}

impl AllocationRequest {
    /// Rejects out-of-range inputs. Nothing is clamped.
    pub fn validate(&self) -> Result<(), AllocationError> {
        if !self.total_budget.is_finite() {
            return Err(AllocationError::InvalidBudget(self.total_budget));
        }
        if !(0.0..=100.0).contains(&self.mid_cap_percent) {
            return Err(AllocationError::InvalidMidCapPercent(self.mid_cap_percent));
        }
        for target in self.sector_allocation.iter() {
            if !(0.0..=1.0).contains(&target.fraction) {
                return Err(AllocationError::InvalidSectorFraction {
                    sector: target.sector.clone(),
                    fraction: target.fraction,
                });
            }
        }
        for security in self.mid_cap.iter().chain(&self.broad_market) {
            if !security.price.is_finite() || security.price <= 0.0 {
                return Err(AllocationError::InvalidPrice {
                    symbol: security.symbol.clone(),
                    price: security.price,
                });
            }
            if self.total_budget / security.price > MAX_SHARES {
                return Err(AllocationError::BudgetOutOfRange {
                    budget: self.total_budget,
                    symbol: security.symbol.clone(),
                    price: security.price,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetSplit {
    pub mid_cap: f64,
    pub broad_market: f64,
}

pub fn split_budget(total_budget: f64, mid_cap_percent: f64) -> BudgetSplit {
    let mid_cap = total_budget * (mid_cap_percent / 100.0);
    BudgetSplit {
        mid_cap,
        broad_market: total_budget - mid_cap,
    }
}

/// One whole-share purchase decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub category: Category,
    pub sector: String,
    pub symbol: String,
    /// Unrounded unit price used for all arithmetic.
    pub price: f64,
    pub quantity: u64,
    /// Total budget left right after this purchase.
    pub remaining_budget: f64,
}

impl PurchaseLine {
    pub fn cost(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub lines: Vec<PurchaseLine>,
    pub remaining_budget: f64,
}

impl AllocationResult {
    pub fn total_spent(&self) -> f64 {
        self.lines.iter().map(PurchaseLine::cost).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub fn allocate(request: &AllocationRequest) -> Result<AllocationResult, AllocationError> {
    allocate_with_observer(request, &NoopObserver)
}

/// Runs the allocation, reporting progress to `observer`.
///
/// The mid-cap universe is always processed first. The broad-market universe
/// is only visited while some of the total budget is left.
pub fn allocate_with_observer(
    request: &AllocationRequest,
    observer: &dyn AllocationObserver,
) -> Result<AllocationResult, AllocationError> {
    request.validate()?;

    let mut ledger = Ledger {
        remaining: request.total_budget,
        lines: Vec::new(),
    };
    if request.total_budget <= 0.0 {
        return Ok(ledger.finish());
    }

    let split = split_budget(request.total_budget, request.mid_cap_percent);
    observer.on_split(&split);

    ledger.fill_universe(
        Category::MidCap,
        &request.mid_cap,
        split.mid_cap,
        &request.sector_allocation,
        observer,
    );

    if ledger.remaining > 0.0 {
        ledger.fill_universe(
            Category::BroadMarket,
            &request.broad_market,
            split.broad_market,
            &request.sector_allocation,
            observer,
        );
    }

    Ok(ledger.finish())
}

struct Ledger {
    remaining: f64,
    lines: Vec<PurchaseLine>,
}

impl Ledger {
    fn fill_universe(
        &mut self,
        category: Category,
        universe: &[Security],
        universe_budget: f64,
        sectors: &SectorAllocation,
        observer: &dyn AllocationObserver,
    ) {
        observer.on_universe_start(category, universe_budget);

        for target in sectors.iter() {
            let mut sector_budget = universe_budget * target.fraction;
            observer.on_sector_start(category, &target.sector, sector_budget);

            for security in universe.iter().filter(|s| s.sector == target.sector) {
                // Only binds when the sector fractions add up to more than 1.
                let spendable = sector_budget.min(self.remaining);
                let quantity = whole_shares(spendable, security.price);
                if quantity > 0 {
                    let cost = quantity as f64 * security.price;
                    sector_budget -= cost;
                    self.remaining -= cost;

                    let line = PurchaseLine {
                        category,
                        sector: target.sector.clone(),
                        symbol: security.symbol.clone(),
                        price: security.price,
                        quantity,
                        remaining_budget: self.remaining,
                    };
                    observer.on_purchase(&line);
                    self.lines.push(line);
                }
                if self.remaining <= 0.0 {
                    break;
                }
            }

            if self.remaining <= 0.0 {
                observer.on_budget_exhausted();
                break;
            }
        }
    }

    fn finish(self) -> AllocationResult {
        AllocationResult {
            lines: self.lines,
            remaining_budget: self.remaining,
        }
    }
}

/// Number of whole shares at `price` affordable within `budget`.
fn whole_shares(budget: f64, price: f64) -> u64 {
    if budget <= 0.0 {
        return 0;
    }
    let mut shares = (budget / price).floor();
    // The division can round up to the next integer.
    if shares * price > budget {
        shares -= 1.0;
    }
    if shares < 1.0 { 0 } else { shares as u64 }
}
