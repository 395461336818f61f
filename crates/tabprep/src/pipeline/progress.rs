//! Pipeline state machine and progress reporting.
//!
//! A run moves strictly forward through [`PipelineState`], one stage at a
//! time, and never retries. Observers can follow along through a
//! [`ProgressReporter`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tabprep::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//! ```

use serde::{Deserialize, Serialize};

/// States of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Input table is in memory
    Loaded,
    /// Cleaning finished
    Cleaned,
    /// Normalization finished
    Normalized,
    /// Feature engineering finished
    Engineered,
    /// Output table persisted
    Written,
    /// A stage failed; the reason carries the error message
    Failed(String),
}

impl PipelineState {
    /// The only legal successor, or `None` for terminal states.
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            Self::Loaded => Some(Self::Cleaned),
            Self::Cleaned => Some(Self::Normalized),
            Self::Normalized => Some(Self::Engineered),
            Self::Engineered => Some(Self::Written),
            Self::Written | Self::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Written | Self::Failed(_))
    }

    /// Returns a human-readable name for the state.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loaded => "Loaded",
            Self::Cleaned => "Cleaned",
            Self::Normalized => "Normalized",
            Self::Engineered => "Engineered",
            Self::Written => "Written",
            Self::Failed(_) => "Failed",
        }
    }

    /// Name of the stage that moves a run out of this state.
    pub fn next_stage_name(&self) -> Option<&'static str> {
        match self {
            Self::Loaded => Some("Cleaning data"),
            Self::Cleaned => Some("Normalizing data"),
            Self::Normalized => Some("Engineering features"),
            Self::Engineered => Some("Writing data"),
            Self::Written | Self::Failed(_) => None,
        }
    }

    /// Overall progress once this state is reached (0.0 - 1.0).
    pub fn progress(&self) -> f32 {
        match self {
            Self::Loaded => 0.2,
            Self::Cleaned => 0.4,
            Self::Normalized => 0.6,
            Self::Engineered => 0.8,
            Self::Written => 1.0,
            Self::Failed(_) => 0.0,
        }
    }
}

/// A progress event emitted at stage start, stage end and on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Most recent state of the run
    pub state: PipelineState,
    /// Overall progress (0.0 - 1.0)
    pub progress: f32,
    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a progress update for the given state.
    pub fn new(state: PipelineState, message: impl Into<String>) -> Self {
        Self {
            progress: state.progress(),
            state,
            message: message.into(),
        }
    }

    /// Creates a failed progress update.
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            state: PipelineState::Failed(reason.clone()),
            progress: 0.0,
            message: reason,
        }
    }
}

/// Trait for receiving progress updates during a run.
///
/// Implementations must be `Send + Sync` so a pipeline holding one can be
/// moved to a worker thread.
pub trait ProgressReporter: Send + Sync {
    /// Called at each stage boundary.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}
