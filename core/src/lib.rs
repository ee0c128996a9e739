//! Incident impact analytics: daily revenue vs. operational incidents.
//!
//! The analytical core runs in a fixed order (see `pipeline`):
//!   1. loader: CSV inputs to typed records
//!   2. daily_aggregator: one row per sales date
//!   3. comparator: correlations and two-sample tests
//!   4. segment_aggregator: revenue by incident type / severity
//!   5. report: Markdown narrative
//!
//! The warehouse side (`store`, `etl`, `export`) and the synthetic
//! `generator` are collaborators of the core; the core never calls them.

pub mod charts;
pub mod classifier;
pub mod comparator;
pub mod config;
pub mod daily_aggregator;
pub mod error;
pub mod etl;
pub mod export;
pub mod generator;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod rng;
pub mod segment_aggregator;
pub mod stats;
pub mod store;
pub mod types;
