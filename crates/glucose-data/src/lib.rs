//! Data layer for glucose trends.
//!
//! Responsible for reading vendor CSV exports, rejecting outliers,
//! resampling onto daily/weekly/monthly grids, spline smoothing, and running
//! the top-level trend pipeline.

pub mod aggregator;
pub mod analysis;
pub mod outliers;
pub mod reader;
pub mod smoother;

pub use glucose_core as core;
