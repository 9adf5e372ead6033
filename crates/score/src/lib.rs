//! `tabeval-score` — scoring engine for tabular query results.
//!
//! Pure engine crate: receives materialized tables, returns column and row
//! precision/recall/F1 per instance plus run-level aggregates.
//! No CLI or IO dependencies.

pub mod aggregate;
pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod names;
pub mod reconcile;
pub mod rows;
pub mod scorer;
pub mod values;

pub use aggregate::{AggregateMetrics, FailurePolicy, MetricsAggregator};
pub use config::EvalConfig;
pub use engine::{BenchmarkRun, Evaluator, Instance, InstanceOutcome};
pub use error::{InstanceFailure, ScoreError, Stage};
pub use model::{Cell, InstanceResult, Score, ScoredPair, Table};
pub use names::{canonicalize_name, Vocabulary};
pub use values::{canonicalize_cell, ValuePolicy};
