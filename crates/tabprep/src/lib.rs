//! Tabular Data Preprocessing Library
//!
//! A configuration-driven preprocessing pipeline built with Rust and Polars.
//!
//! # Overview
//!
//! A run takes one table through three stages, in order:
//!
//! - **Cleaning**: duplicate removal, missing values (drop, mean or KNN), IQR outliers
//! - **Normalization**: min-max, z-score and `ln((1 + x) / 2)` rescaling
//! - **Feature Engineering**: one-hot encoding and polynomial features
//!
//! Every stage reads its own section of a [`PipelineConfig`], validates
//! requested columns against the table, and returns a new table.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tabprep::{ConfigFile, Pipeline};
//!
//! let config = ConfigFile::load("config.yaml")?.pipeline_config()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run("input.csv", "output.csv")?;
//!
//! println!("{} rows written", result.summary.rows_after);
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig::builder()`] to configure a run in code:
//!
//! ```rust,ignore
//! use tabprep::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .remove_duplicates(true)
//!     .missing_values(MissingValueStrategy::Knn)
//!     .handle_outliers(true)
//!     .z_score_columns(["income"])
//!     .one_hot_columns(["city"])
//!     .polynomial_features(["age"], 3)
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod engineer;
pub mod error;
pub mod imputers;
pub mod io;
pub mod normalizer;
pub mod pipeline;
pub mod selector;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{Cleaner, OutlierHandler};
pub use config::{
    CleaningConfig, ConfigFile, ConfigValidationError, DataFormat, FeatureEngineeringConfig,
    MissingValueStrategy, NormalizationConfig, PipelineConfig, PipelineConfigBuilder,
};
pub use engineer::Engineer;
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use imputers::{KNNImputer, StatisticalImputer};
pub use io::{load_data, write_data};
pub use normalizer::Normalizer;
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineState, ProgressReporter,
    ProgressUpdate,
};
pub use selector::select_columns;
pub use types::{PipelineResult, ProcessingSummary, StageSummary};
