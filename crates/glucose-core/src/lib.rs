//! Core types and numerics for glucose trend extraction.
//!
//! Holds the series data model, the error type, the statistics and spline
//! primitives the pipeline is built from, plus CLI settings and formatting
//! helpers shared by the binary.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod spline;
pub mod stats;
pub mod time_utils;

pub use error::{Result, TrendError};
