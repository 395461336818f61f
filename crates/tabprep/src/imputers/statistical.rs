//! Statistical imputation methods.

use crate::error::{PreprocessingError, Result};
use crate::utils::{is_numeric_dtype, mean, numeric_values, observed, restore_dtype};
use polars::prelude::*;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Replace nulls in every numeric column with the column mean.
    ///
    /// Non-numeric columns are left untouched. Integer columns keep their
    /// dtype, so the fill value is rounded.
    pub fn fill_mean(df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        for column in df.get_columns() {
            if !is_numeric_dtype(column.dtype()) || column.null_count() == 0 {
                continue;
            }

            let col_name = column.name().to_string();
            let values = numeric_values(column.as_materialized_series())?;
            let mean_val = mean(&observed(&values)).ok_or_else(|| PreprocessingError::Imputation {
                column: col_name.clone(),
                reason: "column has no observed values to average".to_string(),
            })?;

            let filled = Self::fill_with_value(&col_name, values, mean_val, column.dtype())?;
            result.replace(&col_name, filled)?;

            debug!(
                "Filled {} nulls in '{}' with mean {:.4}",
                column.null_count(),
                col_name,
                mean_val
            );
        }

        Ok(result)
    }

    /// Fill nulls with `value` and cast back to `dtype`.
    fn fill_with_value(
        col_name: &str,
        values: Vec<Option<f64>>,
        value: f64,
        dtype: &DataType,
    ) -> Result<Series> {
        let filled = values.into_iter().map(|v| Some(v.unwrap_or(value))).collect();
        restore_dtype(col_name, filled, dtype)
    }
}
