//! Load a tabular data file (CSV or Excel) and derive a human- or
//! machine-readable profile: dimensions, column types, null counts, summary
//! statistics, top categorical values, and data-quality flags.
//!
//! The pipeline is a straight line: resolve source parameters, load into a
//! [`polars`] DataFrame, refine column types (CSV), profile, render.

pub mod error;
pub mod logging;
pub mod models;
pub mod services;
