//! Data cleaning module for preprocessing datasets.
//!
//! This module provides functionality for:
//! - Removing duplicate rows
//! - Handling missing values (drop, mean fill, KNN imputation)
//! - Replacing outliers in floating-point columns

mod outliers;

pub use outliers::OutlierHandler;

use crate::config::{CleaningConfig, MissingValueStrategy};
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::imputers::{KNNImputer, StatisticalImputer};
use polars::prelude::*;
use tracing::{debug, info};

/// Neighbourhood size for KNN imputation.
pub const KNN_NEIGHBORS: usize = 5;

/// Runs the cleaning steps enabled in a [`CleaningConfig`].
pub struct Cleaner {
    config: CleaningConfig,
}

impl Cleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Clean a table.
    ///
    /// Steps run in a fixed order, each one gated by configuration:
    /// 1. Duplicate removal
    /// 2. Missing value handling
    /// 3. Outlier replacement
    pub fn clean(&self, df: &DataFrame) -> Result<DataFrame> {
        if df.height() == 0 {
            return Err(PreprocessingError::EmptyInput(
                "cannot clean a table with no rows".to_string(),
            ));
        }

        info!("Cleaning data ({} rows, {} columns)", df.height(), df.width());
        let mut df = df.clone();

        if self.config.remove_duplicates {
            df = Self::remove_duplicates(&df).context("Trying to remove duplicates")?;
        }

        if let Some(strategy) = self.config.missing_values {
            df = Self::handle_missing_values(&df, strategy)?;
        }

        if self.config.handle_outliers {
            df = OutlierHandler::replace_with_median(&df)
                .context("Trying to handle outliers")?;
        }

        Ok(df)
    }

    /// Collapse rows identical across all columns to their first occurrence.
    pub fn remove_duplicates(df: &DataFrame) -> Result<DataFrame> {
        let before = df.height();
        let deduped = df
            .clone()
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;

        let removed = before - deduped.height();
        if removed > 0 {
            debug!("Removed {} duplicate rows", removed);
        } else {
            debug!("No duplicate rows found");
        }
        Ok(deduped)
    }

    /// Remove every row holding a null in any column.
    pub fn drop_missing(df: &DataFrame) -> Result<DataFrame> {
        let before = df.height();
        let dropped = df.clone().lazy().drop_nulls(None).collect()?;
        debug!("Dropped {} rows with missing values", before - dropped.height());
        Ok(dropped)
    }

    fn handle_missing_values(df: &DataFrame, strategy: MissingValueStrategy) -> Result<DataFrame> {
        match strategy {
            MissingValueStrategy::Drop => {
                Self::drop_missing(df).context("Trying to drop rows with missing values")
            }
            MissingValueStrategy::Mean => StatisticalImputer::fill_mean(df)
                .context("Trying to fill missing values with column means"),
            MissingValueStrategy::Knn => KNNImputer::new(KNN_NEIGHBORS)
                .fit_transform(df)
                .context("Trying to fill missing values with KNN imputer"),
        }
    }
}
