//! Feature engineering: one-hot encoding and polynomial features.

use crate::config::FeatureEngineeringConfig;
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::selector::select_columns;
use crate::utils::{is_float_dtype, is_integer_dtype};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Runs the feature expansions enabled in a [`FeatureEngineeringConfig`].
pub struct Engineer {
    config: FeatureEngineeringConfig,
}

impl Engineer {
    pub fn new(config: FeatureEngineeringConfig) -> Self {
        Self { config }
    }

    /// One-hot encoding first, then polynomial features.
    pub fn execute(&self, df: &DataFrame) -> Result<DataFrame> {
        info!("Engineering features");

        let df = one_hot_encode(df, &self.config.one_hot_encoding)
            .context("Trying to one-hot encode categorical columns")?;

        let scaling = &self.config.feature_scaling;
        let df = polynomial_features(&df, &scaling.columns, scaling.degree)
            .context("Trying to generate polynomial features")?;

        Ok(df)
    }
}

/// Replace each column with `{column}_{value}` indicator columns.
///
/// Indicators hold `0`/`1` as `UInt8`, are ordered by the value's string
/// form, and take the source column's position. Nulls get a trailing
/// `{column}_null` indicator.
pub fn one_hot_encode(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    let selected = select_columns(df, columns, "one-hot encoding")?;
    if selected.is_empty() {
        return Ok(df.clone());
    }

    let mut output: Vec<Column> = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().to_string();
        if selected.contains(&name) {
            let indicators = indicator_columns(column)?;
            debug!("One-hot encoded '{}' into {} columns", name, indicators.len());
            output.extend(indicators);
        } else {
            output.push(column.clone());
        }
    }

    Ok(DataFrame::new(output)?)
}

fn indicator_columns(column: &Column) -> Result<Vec<Column>> {
    let name = column.name().to_string();
    let as_text = column.cast(&DataType::String)?;
    let values: Vec<Option<String>> = as_text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();

    let categories: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();
    let mut indicators: Vec<Column> = categories
        .iter()
        .map(|category| {
            let flags: Vec<u8> = values
                .iter()
                .map(|v| u8::from(v.as_deref() == Some(*category)))
                .collect();
            Series::new(format!("{}_{}", name, category).into(), flags).into_column()
        })
        .collect();

    if values.iter().any(Option::is_none) {
        let flags: Vec<u8> = values.iter().map(|v| u8::from(v.is_none())).collect();
        indicators.push(Series::new(format!("{}_null", name).into(), flags).into_column());
    }

    Ok(indicators)
}

/// Append `{column}_2` through `{column}_{degree}` for each numeric column.
///
/// Integer columns produce `Int64` and fail on overflow; float columns
/// produce `Float64`. Non-numeric columns are skipped.
pub fn polynomial_features(df: &DataFrame, columns: &[String], degree: u32) -> Result<DataFrame> {
    let selected = select_columns(df, columns, "polynomial features")?;
    if selected.is_empty() {
        return Ok(df.clone());
    }
    if degree < 2 {
        return Err(PreprocessingError::Configuration(format!(
            "polynomial degree must be at least 2, got {}",
            degree
        )));
    }

    let mut result = df.clone();
    for col_name in &selected {
        let column = df.column(col_name)?;
        let dtype = column.dtype();
        if !is_integer_dtype(dtype) && !is_float_dtype(dtype) {
            continue;
        }

        for power in 2..=degree {
            let feature_name = format!("{}_{}", col_name, power);
            if result.column(&feature_name).is_ok() {
                return Err(PreprocessingError::Configuration(format!(
                    "polynomial feature '{}' already exists in the table",
                    feature_name
                )));
            }

            let feature = if is_integer_dtype(dtype) {
                integer_power(column, &feature_name, power)?
            } else {
                float_power(column, &feature_name, power)?
            };
            result.with_column(feature)?;
        }
        debug!("Added polynomial features for '{}' up to degree {}", col_name, degree);
    }

    Ok(result)
}

fn integer_power(column: &Column, feature_name: &str, power: u32) -> Result<Series> {
    // UInt64 values above i64::MAX must fail rather than turn null
    let as_i64 = column
        .as_materialized_series()
        .strict_cast(&DataType::Int64)
        .map_err(|_| PreprocessingError::Overflow {
            column: column.name().to_string(),
            power,
        })?;
    let values = as_i64
        .i64()?
        .into_iter()
        .map(|v| {
            v.map(|x| {
                x.checked_pow(power).ok_or_else(|| PreprocessingError::Overflow {
                    column: column.name().to_string(),
                    power,
                })
            })
            .transpose()
        })
        .collect::<Result<Vec<Option<i64>>>>()?;
    Ok(Series::new(feature_name.into(), values))
}

fn float_power(column: &Column, feature_name: &str, power: u32) -> Result<Series> {
    let as_f64 = column.cast(&DataType::Float64)?;
    let exponent = i32::try_from(power).map_err(|_| PreprocessingError::Overflow {
        column: column.name().to_string(),
        power,
    })?;
    let values: Vec<Option<f64>> = as_f64
        .f64()?
        .into_iter()
        .map(|v| v.map(|x| x.powi(exponent)))
        .collect();
    Ok(Series::new(feature_name.into(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolynomialConfig;
    use crate::utils::column_names;
    use pretty_assertions::assert_eq;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    fn u8_values(df: &DataFrame, name: &str) -> Vec<Option<u8>> {
        df.column(name).unwrap().u8().unwrap().into_iter().collect()
    }

    fn sample() -> DataFrame {
        df![
            "category1" => ["a", "b", "a", "c", "b", "a"],
            "category2" => ["x", "y", "y", "z", "x", "y"],
            "value" => [1, 2, 3, 4, 5, 6],
        ]
        .unwrap()
    }

    // ========================================================================
    // One-hot encoding tests
    // ========================================================================

    #[test]
    fn test_one_hot_encode_in_place() {
        let result = one_hot_encode(&sample(), &names(&["category2"])).unwrap();

        assert_eq!(
            column_names(&result),
            vec!["category1", "category2_x", "category2_y", "category2_z", "value"]
        );
        assert_eq!(
            u8_values(&result, "category2_x"),
            vec![Some(1), Some(0), Some(0), Some(0), Some(1), Some(0)]
        );
        assert_eq!(
            u8_values(&result, "category2_y"),
            vec![Some(0), Some(1), Some(1), Some(0), Some(0), Some(1)]
        );
        assert_eq!(
            u8_values(&result, "category2_z"),
            vec![Some(0), Some(0), Some(0), Some(1), Some(0), Some(0)]
        );
        assert_eq!(result.height(), 6);
    }

    #[test]
    fn test_one_hot_encode_nulls_get_trailing_indicator() {
        let df = df!["c" => [Some("b"), None, Some("a")]].unwrap();
        let result = one_hot_encode(&df, &names(&["c"])).unwrap();

        assert_eq!(column_names(&result), vec!["c_a", "c_b", "c_null"]);
        assert_eq!(u8_values(&result, "c_null"), vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_one_hot_encode_empty_list_is_noop() {
        let result = one_hot_encode(&sample(), &[]).unwrap();
        assert!(result.equals(&sample()));
    }

    // ========================================================================
    // Polynomial feature tests
    // ========================================================================

    #[test]
    fn test_polynomial_features_appends_in_degree_order() {
        let df = df![
            "A" => [1, 2, 3, 4, 5],
            "B" => [0.5, 1.0, 1.5, 2.0, 2.5],
        ]
        .unwrap();

        let result = polynomial_features(&df, &names(&["A"]), 3).unwrap();

        assert_eq!(column_names(&result), vec!["A", "B", "A_2", "A_3"]);
        let a3: Vec<Option<i64>> = result.column("A_3").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(a3, vec![Some(1), Some(8), Some(27), Some(64), Some(125)]);
        let a2: Vec<Option<i64>> = result.column("A_2").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(a2, vec![Some(1), Some(4), Some(9), Some(16), Some(25)]);
    }

    #[test]
    fn test_polynomial_features_float_column() {
        let df = df!["B" => [Some(0.5), None, Some(2.0)]].unwrap();
        let result = polynomial_features(&df, &names(&["B"]), 2).unwrap();

        let b2: Vec<Option<f64>> = result.column("B_2").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(b2, vec![Some(0.25), None, Some(4.0)]);
    }

    #[test]
    fn test_polynomial_features_integer_overflow() {
        let df = df!["big" => [i64::MAX / 2]].unwrap();
        let err = polynomial_features(&df, &names(&["big"]), 2).unwrap_err();
        assert!(matches!(err, PreprocessingError::Overflow { power: 2, .. }));
    }

    #[test]
    fn test_polynomial_features_unsigned_above_i64_range() {
        let df = df!["big" => [1u64, u64::MAX]].unwrap();
        let err = polynomial_features(&df, &names(&["big"]), 2).unwrap_err();
        assert!(matches!(err, PreprocessingError::Overflow { ref column, .. } if column == "big"));
    }

    #[test]
    fn test_polynomial_features_name_collision() {
        let df = df![
            "A" => [1, 2],
            "A_2" => [7, 7],
        ]
        .unwrap();
        let err = polynomial_features(&df, &names(&["A"]), 2).unwrap_err();
        assert!(matches!(err, PreprocessingError::Configuration(_)));
    }

    #[test]
    fn test_polynomial_features_skips_non_numeric() {
        let result = polynomial_features(&sample(), &names(&["category1"]), 2).unwrap();
        assert!(result.equals(&sample()));
    }

    #[test]
    fn test_polynomial_features_rejects_low_degree() {
        let err = polynomial_features(&sample(), &names(&["value"]), 1).unwrap_err();
        assert!(matches!(err, PreprocessingError::Configuration(_)));
    }

    // ========================================================================
    // Engineer tests
    // ========================================================================

    #[test]
    fn test_execute_runs_one_hot_then_polynomial() {
        let config = FeatureEngineeringConfig {
            one_hot_encoding: names(&["category1"]),
            feature_scaling: PolynomialConfig {
                columns: names(&["value"]),
                degree: 2,
            },
        };

        let result = Engineer::new(config).execute(&sample()).unwrap();

        assert_eq!(
            column_names(&result),
            vec![
                "category1_a",
                "category1_b",
                "category1_c",
                "category2",
                "value",
                "value_2"
            ]
        );
    }

    #[test]
    fn test_execute_wraps_errors_with_context() {
        let config = FeatureEngineeringConfig {
            one_hot_encoding: names(&["missing"]),
            ..Default::default()
        };

        let err = Engineer::new(config).execute(&sample()).unwrap_err();
        assert!(err.to_string().starts_with("Trying to one-hot encode"));
    }
}
