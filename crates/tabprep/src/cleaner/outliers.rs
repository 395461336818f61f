//! Outlier handling module.
//!
//! Detects outliers with the interquartile range rule and replaces them
//! with the column median.

use crate::error::Result;
use crate::utils::{is_float_dtype, median, numeric_values, observed, quantile_nearest, restore_dtype};
use polars::prelude::*;
use tracing::debug;

const IQR_MULTIPLIER: f64 = 1.5;

/// Handles outlier detection and treatment.
pub struct OutlierHandler;

impl OutlierHandler {
    /// Replace values outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` with the median.
    ///
    /// Only floating-point columns are touched. Quartiles use the nearest-rank
    /// rule and the median is taken over the original non-null values.
    pub fn replace_with_median(df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        let mut total_replaced = 0usize;

        for column in df.get_columns() {
            if !is_float_dtype(column.dtype()) {
                continue;
            }

            let col_name = column.name().to_string();
            let values = numeric_values(column.as_materialized_series())?;
            let present = observed(&values);

            let (Some(q1), Some(q3), Some(median_val)) = (
                quantile_nearest(&present, 0.25),
                quantile_nearest(&present, 0.75),
                median(&present),
            ) else {
                continue;
            };

            let iqr = q3 - q1;
            let lower = q1 - IQR_MULTIPLIER * iqr;
            let upper = q3 + IQR_MULTIPLIER * iqr;

            let mut replaced = 0usize;
            let capped: Vec<Option<f64>> = values
                .into_iter()
                .map(|v| {
                    v.map(|x| {
                        if x < lower || x > upper {
                            replaced += 1;
                            median_val
                        } else {
                            x
                        }
                    })
                })
                .collect();

            if replaced > 0 {
                let series = restore_dtype(&col_name, capped, column.dtype())?;
                result.replace(&col_name, series)?;
                debug!(
                    "Replaced {} outliers in '{}' with median {} (bounds [{}, {}])",
                    replaced, col_name, median_val, lower, upper
                );
                total_replaced += replaced;
            }
        }

        debug!("Replaced {} outliers in total", total_replaced);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn test_replace_with_median() {
        let df = df![
            "col1" => [1.0, 2.0, 3.0, 4.0, 55.0, 5.0, 6.0, 7.0],
            "col2" => [2.0, 4.0, 6.0, 8.0, 458.0, 20.0, 30.0, 40.0],
            "col3" => [3.0, 6.0, 9.0, 666.0, 15.0, 30.0, 45.0, 60.0],
        ]
        .unwrap();

        let result = OutlierHandler::replace_with_median(&df).unwrap();

        assert_eq!(f64_values(&result, "col1")[4], Some(4.5));
        assert_eq!(f64_values(&result, "col2")[4], Some(14.0));
        assert_eq!(f64_values(&result, "col3")[3], Some(22.5));
        // In-range values are unchanged
        assert_eq!(f64_values(&result, "col1")[0], Some(1.0));
        assert_eq!(f64_values(&result, "col3")[7], Some(60.0));
    }

    #[test]
    fn test_integer_columns_untouched() {
        let df = df![
            "ints" => [1i64, 2, 3, 4, 1000],
        ]
        .unwrap();

        let result = OutlierHandler::replace_with_median(&df).unwrap();
        assert!(result.equals(&df));
    }

    #[test]
    fn test_nulls_stay_null() {
        let df = df![
            "x" => [Some(1.0), None, Some(2.0), Some(3.0), Some(4.0), Some(500.0)],
        ]
        .unwrap();

        let result = OutlierHandler::replace_with_median(&df).unwrap();
        let x = f64_values(&result, "x");
        assert_eq!(x[1], None);
        assert_eq!(x[5], Some(3.0));
    }
}
