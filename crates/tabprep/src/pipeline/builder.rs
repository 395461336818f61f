//! Main preprocessing pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating a preprocessing run.

use crate::cleaner::Cleaner;
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::engineer::Engineer;
use crate::error::{PreprocessingError, Result};
use crate::io::{load_data, write_data};
use crate::normalizer::Normalizer;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineState, ProgressReporter, ProgressUpdate,
};
use crate::types::{PipelineResult, ProcessingSummary};
use crate::utils::column_names;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The main preprocessing pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use tabprep::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .remove_duplicates(true)
///     .min_max_columns(["price"])
///     .build()?;
///
/// let result = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| println!("{}", update.message))
///     .build()?
///     .run("input.csv", "output.csv")?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: Cleaner,
    normalizer: Normalizer,
    engineer: Engineer,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run cleaning, normalization and feature engineering on a table.
    ///
    /// The returned result ends in [`PipelineState::Engineered`].
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        self.report_progress(ProgressUpdate::new(
            PipelineState::Loaded,
            format!("Processing {} rows and {} columns", df.height(), df.width()),
        ));

        self.process_internal(df, start_time)
            .inspect_err(|e| self.fail(e))
    }

    /// Load `input`, process it and write the result to `output`.
    ///
    /// Formats come from the configuration. Nothing is written unless every
    /// stage succeeds. The returned result ends in [`PipelineState::Written`].
    pub fn run(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<PipelineResult> {
        let input = input.as_ref();
        let output = output.as_ref();
        let start_time = Instant::now();

        let result = load_data(input, self.config.input_format)
            .map_err(|e| e.with_context(format!("Loading data from {}", input.display())))
            .and_then(|df| {
                self.report_progress(ProgressUpdate::new(
                    PipelineState::Loaded,
                    format!("Loaded {} rows and {} columns", df.height(), df.width()),
                ));
                self.process_internal(df, start_time)
            })
            .and_then(|result| self.write_output(result, output, start_time));

        result.inspect_err(|e| self.fail(e))
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn fail(&self, e: &PreprocessingError) {
        error!("Pipeline error: {}", e);
        self.report_progress(ProgressUpdate::failed(e.to_string()));
    }

    fn process_internal(&self, df: DataFrame, start_time: Instant) -> Result<PipelineResult> {
        info!("Starting preprocessing pipeline...");
        let input_columns = column_names(&df);
        let mut summary = ProcessingSummary::new(&df);
        let mut state = PipelineState::Loaded;

        let df = self.run_stage(&mut state, &mut summary, &df, |df| self.cleaner.clean(df))?;
        let df = self.run_stage(&mut state, &mut summary, &df, |df| self.normalizer.normalize(df))?;
        let df = self.run_stage(&mut state, &mut summary, &df, |df| self.engineer.execute(df))?;

        summary.finish(&input_columns, &df, start_time.elapsed());
        info!(
            "Processing complete: {} rows and {} columns in {}ms",
            summary.rows_after, summary.columns_after, summary.duration_ms
        );

        Ok(PipelineResult {
            data: df,
            state,
            summary,
        })
    }

    /// Run one stage, advancing `state` on success.
    ///
    /// Failures are wrapped with the stage name.
    fn run_stage<F>(
        &self,
        state: &mut PipelineState,
        summary: &mut ProcessingSummary,
        df: &DataFrame,
        stage: F,
    ) -> Result<DataFrame>
    where
        F: FnOnce(&DataFrame) -> Result<DataFrame>,
    {
        let (Some(stage_name), Some(next_state)) = (state.next_stage_name(), state.next()) else {
            return Err(PreprocessingError::Configuration(format!(
                "no stage follows state '{}'",
                state.display_name()
            )));
        };

        info!("{}...", stage_name);
        self.report_progress(ProgressUpdate::new(state.clone(), format!("{}...", stage_name)));

        let stage_start = Instant::now();
        let output = stage(df).map_err(|e| e.with_context(stage_name))?;
        summary.record_stage(next_state.clone(), stage_start.elapsed(), &output);

        self.report_progress(ProgressUpdate::new(
            next_state.clone(),
            format!("{} complete", stage_name),
        ));
        *state = next_state;
        Ok(output)
    }

    fn write_output(
        &self,
        mut result: PipelineResult,
        output: &Path,
        start_time: Instant,
    ) -> Result<PipelineResult> {
        let stage_name = result.state.next_stage_name().unwrap_or("Writing data");
        info!("{} to {}...", stage_name, output.display());

        let write_start = Instant::now();
        write_data(&mut result.data, output, self.config.output_format)
            .map_err(|e| e.with_context(format!("{} to {}", stage_name, output.display())))?;

        let written = PipelineState::Written;
        result
            .summary
            .record_stage(written.clone(), write_start.elapsed(), &result.data);
        result.summary.duration_ms = start_time.elapsed().as_millis() as u64;
        self.report_progress(ProgressUpdate::new(
            written.clone(),
            format!("Wrote {}", output.display()),
        ));
        result.state = written;
        Ok(result)
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            cleaner: Cleaner::new(config.cleaning.clone()),
            normalizer: Normalizer::new(config.normalization.clone()),
            engineer: Engineer::new(config.feature_engineering.clone()),
            progress_reporter: self.progress_reporter,
            config,
        })
    }
}
