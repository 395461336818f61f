//! Numeric rescaling: min-max, z-score and log.
//!
//! Each rescaling reads its own column list, narrows it through
//! [`select_columns`], and writes `Float64` output in place of the source
//! column. Nulls are left out of every statistic and stay null in the output.

use crate::config::NormalizationConfig;
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::selector::select_columns;
use crate::utils::{is_numeric_dtype, mean, numeric_values, observed, population_std};
use polars::prelude::*;
use tracing::{debug, info};

/// Runs the rescalings enabled in a [`NormalizationConfig`].
pub struct Normalizer {
    config: NormalizationConfig,
}

impl Normalizer {
    pub fn new(config: NormalizationConfig) -> Self {
        Self { config }
    }

    /// Apply min-max, then z-score, then log normalization.
    pub fn normalize(&self, df: &DataFrame) -> Result<DataFrame> {
        info!("Normalizing data");

        let df = min_max_normalize(df, &self.config.min_max.columns)
            .context("Trying to normalize with min-max")?;
        let df = z_score_normalize(&df, &self.config.z_score.columns)
            .context("Trying to normalize with z-score")?;
        let df = log_normalize(&df, &self.config.log.columns)
            .context("Trying to normalize with log")?;

        Ok(df)
    }
}

/// Rescale each column to `(x - min) / (max - min)`.
pub fn min_max_normalize(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    rescale_columns(df, columns, "min-max normalization", |name, present| {
        let min = present.iter().copied().fold(f64::INFINITY, f64::min);
        let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        if range == 0.0 {
            return Err(PreprocessingError::DivisionByZero {
                column: name.to_string(),
                reason: format!("max equals min ({})", max),
            });
        }
        Ok(Box::new(move |x: f64| -> Result<f64> { Ok((x - min) / range) }))
    })
}

/// Standardize each column to `(x - mean) / std`, population statistics.
pub fn z_score_normalize(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    rescale_columns(df, columns, "z-score normalization", |name, present| {
        let (Some(mu), Some(std)) = (mean(present), population_std(present)) else {
            return Err(PreprocessingError::NoValidValues(name.to_string()));
        };
        if std == 0.0 {
            return Err(PreprocessingError::DivisionByZero {
                column: name.to_string(),
                reason: "standard deviation is zero".to_string(),
            });
        }
        Ok(Box::new(move |x: f64| -> Result<f64> { Ok((x - mu) / std) }))
    })
}

/// Apply `ln((1 + x) / 2)` to each column. Values `x <= -1` are rejected.
pub fn log_normalize(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    rescale_columns(df, columns, "log normalization", |name, _| {
        let name = name.to_string();
        Ok(Box::new(move |x: f64| -> Result<f64> {
            if x <= -1.0 || x.is_nan() {
                return Err(PreprocessingError::InvalidDomain {
                    column: name.clone(),
                    value: x,
                    transform: "ln((1 + x) / 2)".to_string(),
                });
            }
            Ok(((1.0 + x) / 2.0).ln())
        }))
    })
}

type ValueTransform = Box<dyn Fn(f64) -> Result<f64>>;

/// Shared driver for the three rescalings.
///
/// `fit` sees the column name and its non-null values and returns the
/// per-value transform.
fn rescale_columns<F>(df: &DataFrame, columns: &[String], operation: &str, fit: F) -> Result<DataFrame>
where
    F: Fn(&str, &[f64]) -> Result<ValueTransform>,
{
    let selected = select_columns(df, columns, operation)?;
    let mut result = df.clone();

    for col_name in &selected {
        let column = df.column(col_name)?;
        if !is_numeric_dtype(column.dtype()) {
            debug!(
                "Skipping {} for non-numeric column '{}' ({})",
                operation,
                col_name,
                column.dtype()
            );
            continue;
        }

        let values = numeric_values(column.as_materialized_series())?;
        let present = observed(&values);
        if present.is_empty() {
            return Err(PreprocessingError::NoValidValues(col_name.clone()));
        }
        // NaN and infinities would poison every statistic below
        if let Some(&bad) = present.iter().find(|v| !v.is_finite()) {
            return Err(PreprocessingError::InvalidDomain {
                column: col_name.clone(),
                value: bad,
                transform: operation.to_string(),
            });
        }

        let transform = fit(col_name.as_str(), present.as_slice())?;
        let rescaled = values
            .into_iter()
            .map(|v| v.map(&transform).transpose())
            .collect::<Result<Vec<Option<f64>>>>()?;

        result.replace(col_name, Series::new(col_name.as_str().into(), rescaled))?;
        debug!("Applied {} to '{}'", operation, col_name);
    }

    Ok(result)
}
