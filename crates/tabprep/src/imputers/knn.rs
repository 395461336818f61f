use crate::error::{PreprocessingError, Result};
use crate::utils::{column_names, is_numeric_dtype, mean, restore_dtype};
use polars::prelude::*;
use tracing::debug;

/// K-nearest-neighbour imputer with uniform weighting.
///
/// Distances use the NaN-aware Euclidean metric: squared differences are
/// summed over the coordinates both rows observe, then scaled up by
/// `total / observed` so rows with fewer shared coordinates are not
/// artificially close.
pub struct KNNImputer {
    n_neighbors: usize,
}

impl KNNImputer {
    /// Create a new KNN imputer with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1), // Ensure at least 1 neighbor
        }
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Fit and transform the dataframe, imputing every missing cell.
    ///
    /// All columns must be numeric. Every imputation reads the original
    /// matrix, so the fill order of cells does not matter. Columns keep
    /// their original dtype; integer columns are rounded.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        for col in df.get_columns() {
            if !is_numeric_dtype(col.dtype()) {
                return Err(PreprocessingError::Imputation {
                    column: col.name().to_string(),
                    reason: format!(
                        "KNN imputation requires numeric columns, found {}",
                        col.dtype()
                    ),
                });
            }
        }

        let mut result_df = df.clone();
        let names = column_names(df);
        let data_matrix = self.create_data_matrix(df, &names)?;
        let n_rows = df.height();

        for (col_idx, col_name) in names.iter().enumerate() {
            let column = df.column(col_name)?;
            if column.null_count() == 0 {
                continue;
            }

            let donors: Vec<usize> = (0..n_rows)
                .filter(|&row| data_matrix[row][col_idx].is_some())
                .collect();
            let donor_values: Vec<f64> = donors
                .iter()
                .filter_map(|&row| data_matrix[row][col_idx])
                .collect();
            let column_mean = mean(&donor_values).ok_or_else(|| PreprocessingError::Imputation {
                column: col_name.clone(),
                reason: "column has no observed values".to_string(),
            })?;

            debug!(
                "KNN imputing {} values in '{}' from {} donors",
                column.null_count(),
                col_name,
                donors.len()
            );

            let imputed_values: Vec<Option<f64>> = (0..n_rows)
                .map(|row| match data_matrix[row][col_idx] {
                    Some(value) => Some(value),
                    None => Some(
                        self.impute_value(&data_matrix, row, col_idx, &donors)
                            .unwrap_or(column_mean),
                    ),
                })
                .collect();

            let imputed_series = restore_dtype(col_name, imputed_values, column.dtype())?;
            result_df.replace(col_name, imputed_series)?;
        }

        Ok(result_df)
    }

    /// Create a data matrix from the dataframe for distance calculations
    fn create_data_matrix(
        &self,
        df: &DataFrame,
        columns: &[String],
    ) -> Result<Vec<Vec<Option<f64>>>> {
        let n_rows = df.height();
        let n_cols = columns.len();
        let mut matrix = vec![vec![None; n_cols]; n_rows];

        for (col_idx, col_name) in columns.iter().enumerate() {
            let series = df.column(col_name)?.as_materialized_series();
            let float_series = series.cast(&DataType::Float64)?;
            let f64_series = float_series.f64()?;

            for (row_idx, row) in matrix.iter_mut().enumerate() {
                row[col_idx] = f64_series.get(row_idx);
            }
        }

        Ok(matrix)
    }

    /// Average of the target column over the nearest donors.
    ///
    /// Returns `None` when no donor shares an observed coordinate with the
    /// target row.
    fn impute_value(
        &self,
        data_matrix: &[Vec<Option<f64>>],
        target_row: usize,
        target_col: usize,
        donors: &[usize],
    ) -> Option<f64> {
        let mut distances: Vec<(usize, f64)> = donors
            .iter()
            .filter_map(|&donor| {
                self.calculate_distance(&data_matrix[target_row], &data_matrix[donor])
                    .map(|distance| (donor, distance))
            })
            .collect();

        if distances.is_empty() {
            return None;
        }

        // Stable sort: ties keep row order
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        let k = self.n_neighbors.min(distances.len());
        let neighbor_values: Vec<f64> = distances
            .iter()
            .take(k)
            .filter_map(|&(row, _)| data_matrix[row][target_col])
            .collect();

        mean(&neighbor_values)
    }

    /// NaN-aware Euclidean distance between two rows.
    ///
    /// `None` when the rows share no observed coordinate.
    fn calculate_distance(&self, row1: &[Option<f64>], row2: &[Option<f64>]) -> Option<f64> {
        let mut sum_squared_diff = 0.0;
        let mut present = 0usize;

        for (a, b) in row1.iter().zip(row2) {
            if let (Some(a), Some(b)) = (a, b) {
                let diff = a - b;
                sum_squared_diff += diff * diff;
                present += 1;
            }
        }

        if present == 0 {
            return None;
        }
        let scale = row1.len() as f64 / present as f64;
        Some((scale * sum_squared_diff).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    // ========================================================================
    // KNNImputer::new() tests
    // ========================================================================

    #[test]
    fn test_knn_imputer_new_with_zero_neighbors_defaults_to_one() {
        let imputer = KNNImputer::new(0);
        assert_eq!(imputer.n_neighbors(), 1);
    }

    // ========================================================================
    // fit_transform() tests
    // ========================================================================

    #[test]
    fn test_uses_all_donors_when_fewer_than_k() {
        let imputer = KNNImputer::new(5);
        let df = df![
            "a" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            "b" => [Some(10.0), Some(20.0), Some(30.0), None, Some(50.0), Some(60.0)],
        ]
        .unwrap();

        let result = imputer.fit_transform(&df).unwrap();

        // Five donors and k = 5: plain average of all of them
        let b = f64_values(&result, "b");
        assert!((b[3].unwrap() - 34.0).abs() < 1e-10);
    }

    #[test]
    fn test_uniform_average_of_nearest_five() {
        let imputer = KNNImputer::new(5);
        let df = df![
            "a" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 20.0],
            "b" => [Some(10.0), Some(20.0), Some(30.0), Some(40.0), None, Some(60.0), Some(70.0), Some(800.0)],
        ]
        .unwrap();

        let result = imputer.fit_transform(&df).unwrap();

        // Nearest to a = 5: a = 4, 6, 3, 7, 2 -> b = 40, 60, 30, 70, 20
        let b = f64_values(&result, "b");
        assert!((b[4].unwrap() - 44.0).abs() < 1e-10);
        // Observed cells are untouched
        assert_eq!(b[7], Some(800.0));
    }

    #[test]
    fn test_falls_back_to_mean_without_shared_coordinates() {
        let imputer = KNNImputer::new(5);
        let df = df![
            "a" => [Some(1.0), None, Some(3.0), Some(5.0)],
            "b" => [Some(10.0), None, Some(30.0), Some(50.0)],
        ]
        .unwrap();

        let result = imputer.fit_transform(&df).unwrap();

        assert_eq!(f64_values(&result, "a")[1], Some(3.0));
        assert_eq!(f64_values(&result, "b")[1], Some(30.0));
    }

    #[test]
    fn test_integer_columns_keep_dtype() {
        let imputer = KNNImputer::new(5);
        let df = df![
            "feature" => [1i64, 2, 3],
            "target" => [Some(10i64), None, Some(30)],
        ]
        .unwrap();

        let result = imputer.fit_transform(&df).unwrap();

        let target = result.column("target").unwrap();
        assert_eq!(target.dtype(), &DataType::Int64);
        assert_eq!(target.null_count(), 0);
        assert_eq!(target.i64().unwrap().get(1), Some(20));
    }

    #[test]
    fn test_rejects_non_numeric_columns() {
        let imputer = KNNImputer::new(5);
        let df = df![
            "name" => ["Alice", "Bob", "Charlie"],
            "age" => [Some(25.0), None, Some(35.0)],
        ]
        .unwrap();

        let err = imputer.fit_transform(&df).unwrap_err();
        assert!(matches!(err, PreprocessingError::Imputation { ref column, .. } if column == "name"));
    }

    #[test]
    fn test_rejects_all_null_column() {
        let imputer = KNNImputer::new(5);
        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [Option::<f64>::None, None, None],
        ]
        .unwrap();

        let err = imputer.fit_transform(&df).unwrap_err();
        assert!(matches!(err, PreprocessingError::Imputation { ref column, .. } if column == "b"));
    }

    #[test]
    fn test_no_missing_values_is_identity() {
        let imputer = KNNImputer::new(5);
        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [10i32, 20, 30],
        ]
        .unwrap();

        let result = imputer.fit_transform(&df).unwrap();
        assert!(result.equals(&df));
    }

    // ========================================================================
    // calculate_distance() tests
    // ========================================================================

    #[test]
    fn test_calculate_distance_identical_rows() {
        let imputer = KNNImputer::new(3);
        let row = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(imputer.calculate_distance(&row, &row), Some(0.0));
    }

    #[test]
    fn test_calculate_distance_scales_for_missing_coordinates() {
        let imputer = KNNImputer::new(3);
        let row1 = vec![Some(0.0), None, Some(0.0)];
        let row2 = vec![Some(3.0), Some(3.0), Some(4.0)];

        // Two shared coordinates out of three: sqrt(3 / 2 * (9 + 16))
        let distance = imputer.calculate_distance(&row1, &row2).unwrap();
        assert!((distance - (1.5_f64 * 25.0).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_calculate_distance_no_common_features() {
        let imputer = KNNImputer::new(3);
        let row1 = vec![Some(1.0), None];
        let row2 = vec![None, Some(2.0)];
        assert_eq!(imputer.calculate_distance(&row1, &row2), None);
    }
}
