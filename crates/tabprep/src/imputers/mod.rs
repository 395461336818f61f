//! Imputation module for handling missing values.
//!
//! This module provides two imputation strategies:
//! - KNN imputation over the numeric matrix
//! - Statistical (mean) imputation per column

mod knn;
mod statistical;

pub use knn::KNNImputer;
pub use statistical::StatisticalImputer;
