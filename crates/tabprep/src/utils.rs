//! Shared utilities for the preprocessing pipeline.
//!
//! Data type checks and small statistics helpers used by the cleaner,
//! the normalizer and the engineer.

use crate::error::Result;
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || is_float_dtype(dtype)
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is a floating point type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Names of all columns in the frame, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Read a numeric series as `f64` values, keeping nulls.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Non-null values of a column, in row order.
pub fn observed(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Median, averaging the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Quantile using the nearest-rank rule: sorted index `round((n - 1) * q)`.
pub fn quantile_nearest(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let sorted = sorted(values);
    let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted.get(idx).copied()
}

/// Build a series from `f64` values and cast it back to `dtype`.
///
/// Integer targets are rounded half away from zero before the cast.
pub fn restore_dtype(name: &str, values: Vec<Option<f64>>, dtype: &DataType) -> Result<Series> {
    let values = if is_integer_dtype(dtype) {
        values.into_iter().map(|v| v.map(f64::round)).collect()
    } else {
        values
    };
    let series = Series::new(name.into(), values);
    Ok(series.cast(dtype)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float32));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_float_dtype() {
        assert!(is_float_dtype(&DataType::Float64));
        assert!(!is_float_dtype(&DataType::Int32));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0, 55.0, 5.0, 6.0, 7.0]), Some(4.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_quantile_nearest() {
        let values = [1.0, 2.0, 3.0, 4.0, 55.0, 5.0, 6.0, 7.0];
        // (8 - 1) * 0.25 = 1.75 -> index 2; (8 - 1) * 0.75 = 5.25 -> index 5
        assert_eq!(quantile_nearest(&values, 0.25), Some(3.0));
        assert_eq!(quantile_nearest(&values, 0.75), Some(6.0));
        assert_eq!(quantile_nearest(&[], 0.5), None);
    }

    #[test]
    fn test_population_std() {
        let std = population_std(&[163.0, 120.0, 130.0, 108.0, 109.0]).unwrap();
        assert!((std - 406.8_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_numeric_values_keeps_nulls() {
        let series = Series::new("a".into(), &[Some(1i64), None, Some(3)]);
        assert_eq!(
            numeric_values(&series).unwrap(),
            vec![Some(1.0), None, Some(3.0)]
        );
    }

    #[test]
    fn test_restore_dtype_rounds_integers() {
        let series = restore_dtype("a", vec![Some(1.4), Some(2.5), None], &DataType::Int64).unwrap();
        assert_eq!(series.dtype(), &DataType::Int64);
        let values: Vec<Option<i64>> = series.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1), Some(3), None]);
    }
}
