//! Filtering and aggregation engine for real-estate listing datasets.
//!
//! Load a listings table once with [`data::loader::load_file`], wrap it in an
//! `Arc` and hand each user a [`session::Session`]. Every query is a pure
//! computation over the shared, read-only [`data::model::Dataset`].

pub mod config;
pub mod data;
pub mod notes;
pub mod session;

pub use config::ExplorerConfig;
pub use data::aggregate::{Aggregated, CrossTab, GroupStats, SummaryStats};
pub use data::filter::{
    CategoryChoice, CountChoice, FilterCriteria, FilterError, RawCriteria, ValueRange,
};
pub use data::loader::{load_file, LoadError};
pub use data::model::{Dataset, Listing, Subset};
pub use session::Session;
