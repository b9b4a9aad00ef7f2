pub mod allocate;
pub mod setup;
pub mod ui;

pub use allocate::{AllocateOptions, OutputFormat};
