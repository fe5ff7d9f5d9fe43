//! # Projection Engine
//!
//! Builds per-player fantasy projections from simulated scoring tables.
//!
//! Each row of a simulation table carries pass-through scalars (mean, median)
//! and a discretized score curve. The engine normalizes the curve with
//! `curve-stats`, derives a ceiling from it when the table does not supply one,
//! and serves the result from a cache that rebuilds only when the table changes.
//!
//! ## Architecture
//!
//! - **RecordSource**: trait for anything that yields raw rows plus a freshness token
//! - **CsvRecordSource**: CSV table implementation
//! - **ProjectionBuilder**: raw row into `Projection`
//! - **ProjectionStore**: freshness-keyed cache of built snapshots
//! - **export**: `players.json` + `projections/<id>.json` writer

pub mod builder;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod source;

pub use builder::ProjectionBuilder;
pub use cache::{FreshnessCache, ProjectionStore, Refresh, Snapshot};
pub use config::{ColumnConfig, CurveKind, ProjectionConfig, SourceConfig, StatsConfig};
pub use error::{ProjectionError, Result};
pub use export::{write_snapshot, ExportSummary};
pub use models::{PlayerSummary, Projection, RawProjectionRecord};
pub use source::{slugify, CsvRecordSource, RecordSource};

/// Re-export the curve engine for convenience
pub use curve_stats::{
    Curve, CurveNormalizer, CurvePoint, DuplicatePolicy, PercentileExtractor, TailEstimate,
    TailResolution,
};
