//! Core business logic: the allocator and the data it works on

pub mod allocation;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod log;
pub mod observer;
pub mod price;
pub mod report;
pub mod sector;
pub mod security;
pub mod universe;

// Re-export main types for cleaner imports
pub use allocation::{
    AllocationRequest, AllocationResult, BudgetSplit, Category, PurchaseLine, SectorAllocation,
    SectorTarget, allocate, allocate_with_observer, split_budget,
};
pub use error::AllocationError;
pub use observer::{AllocationObserver, LoggingObserver, NoopObserver};
pub use price::{PriceProvider, PriceResult};
pub use sector::SectorProvider;
pub use security::{Listing, PriceQuote, Security, filter_priced};
