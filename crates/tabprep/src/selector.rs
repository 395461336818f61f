//! Column selection against a table's actual schema.
//!
//! Every stage that reads a column list from configuration narrows it
//! through [`select_columns`] first, so a partially stale configuration
//! behaves the same way everywhere in the pipeline.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;
use tracing::warn;

/// Validate `requested` against the columns of `df`.
///
/// Returns the requested names that exist, in request order. Names that do
/// not exist are dropped with a warning. Fails with
/// [`PreprocessingError::Configuration`] when every requested name is
/// missing. An empty request is returned unchanged.
pub fn select_columns(df: &DataFrame, requested: &[String], operation: &str) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let (present, missing): (Vec<String>, Vec<String>) = requested
        .iter()
        .cloned()
        .partition(|name| df.column(name).is_ok());

    if present.is_empty() {
        return Err(PreprocessingError::Configuration(format!(
            "All columns specified for {} are missing in the table: {:?}",
            operation, missing
        )));
    }

    for name in &missing {
        warn!("Column '{}' requested for {} not found, skipping", name, operation);
    }

    Ok(present)
}
