//! Typed failures raised before or during an allocation run.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("invalid budget: {0} is not a finite number")]
    InvalidBudget(f64),

    #[error("invalid mid-cap percentage: {0} (expected a value between 0 and 100)")]
    InvalidMidCapPercent(f64),

    #[error("invalid fraction {fraction} for sector '{sector}' (expected a value between 0 and 1)")]
    InvalidSectorFraction { sector: String, fraction: f64 },

    #[error("invalid price {price} for security {symbol}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("budget {budget} buys too many shares of {symbol} at {price} to count exactly")]
    BudgetOutOfRange {
        budget: f64,
        symbol: String,
        price: f64,
    },

    #[error("{} must contain a '{column}' column", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
