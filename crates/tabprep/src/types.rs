//! Result and summary types produced by a pipeline run.

use crate::pipeline::PipelineState;
use chrono::Local;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The transformed table.
    pub data: DataFrame,
    /// Terminal state reached: `Engineered` for `process`, `Written` for `run`.
    pub state: PipelineState,
    pub summary: ProcessingSummary,
}

// ============================================================================
// Processing Summary Types
// ============================================================================

/// Timing and shape after one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    /// State the stage produced.
    pub state: PipelineState,
    pub duration_ms: u64,
    pub rows: usize,
    pub columns: usize,
}

/// Human-readable summary of what the pipeline did.
///
/// Serialized as JSON by the `--json` flag of the command line tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    /// Rows removed by duplicate removal or dropping missing values.
    pub rows_removed: usize,

    pub columns_before: usize,
    pub columns_after: usize,
    /// Columns present after the run but not before, in table order.
    pub columns_added: Vec<String>,
    /// Columns present before the run but not after, in table order.
    pub columns_removed: Vec<String>,

    /// One entry per completed stage.
    pub stages: Vec<StageSummary>,

    /// RFC 3339 local timestamp of completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl ProcessingSummary {
    /// Start a summary from the input table.
    pub fn new(input: &DataFrame) -> Self {
        Self {
            rows_before: input.height(),
            columns_before: input.width(),
            ..Default::default()
        }
    }

    /// Record a completed stage.
    pub fn record_stage(&mut self, state: PipelineState, elapsed: Duration, output: &DataFrame) {
        self.stages.push(StageSummary {
            state,
            duration_ms: elapsed.as_millis() as u64,
            rows: output.height(),
            columns: output.width(),
        });
    }

    /// Fill the "after" fields from the final table.
    pub fn finish(&mut self, input_columns: &[String], output: &DataFrame, elapsed: Duration) {
        let output_columns: Vec<String> = output
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        self.rows_after = output.height();
        self.rows_removed = self.rows_before.saturating_sub(self.rows_after);
        self.columns_after = output.width();
        self.columns_added = output_columns
            .iter()
            .filter(|c| !input_columns.contains(c))
            .cloned()
            .collect();
        self.columns_removed = input_columns
            .iter()
            .filter(|c| !output_columns.contains(c))
            .cloned()
            .collect();
        self.duration_ms = elapsed.as_millis() as u64;
        self.completed_at = Some(Local::now().to_rfc3339());
    }

    /// Total time spent inside stages, in milliseconds.
    pub fn stage_time_ms(&self) -> u64 {
        self.stages.iter().map(|s| s.duration_ms).sum()
    }
}
