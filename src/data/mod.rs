//! Data layer: listing types, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → drop incomplete rows → Dataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │   Dataset     │  Vec<Listing>, locality / type index
//!   └──────────────┘
//!        │                         │
//!        ▼                         ▼
//!   ┌──────────┐            ┌────────────┐
//!   │  filter   │ criteria → │ discretize │  stepped range options
//!   └──────────┘  Subset     └────────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  medians, group stats, cross-tab
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod discretize;
pub mod filter;
pub mod loader;
pub mod model;
