//! Derived metrics for the education marketplace dashboards.
//!
//! The two calculators, [`completion::compute_completion`] and
//! [`conversion::compute_conversion_score`], are pure. Everything else in the
//! crate (stores, dashboard state, reports) is plumbing around them.

pub mod cache;
pub mod completion;
pub mod config;
pub mod conversion;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod report;
pub mod repository;

pub use completion::{compute_completion, CompletionResult, FieldKind, FieldValue, ProfileFieldSet};
pub use conversion::{compute_conversion_score, ConversionScore, ScoreBand};
pub use error::MetricsError;
