//! Data module - CSV loading, cleaning, and aggregation

pub mod aggregator;
pub mod cleaner;
pub mod loader;
pub mod schema;

pub use aggregator::{AggregateError, GroupCount};
pub use cleaner::CleanError;
pub use loader::LoaderError;
