//! Pipeline module.
//!
//! This module provides the orchestrator that runs cleaning, normalization
//! and feature engineering in order, plus its progress side channel.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, PipelineState, ProgressReporter, ProgressUpdate};
