//! Custom error types for the preprocessing pipeline.
//!
//! This module provides a single error hierarchy using `thiserror`. Every
//! transform step reports failures through [`PreprocessingError`], and the
//! stage that called it wraps the failure with [`PreprocessingError::with_context`]
//! so the final message names the step that broke.
//!
//! Errors are serializable so that the CLI can emit them as JSON.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// An operation that needs rows received an empty table.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Invalid configuration, or every requested column is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required configuration section is absent.
    #[error("Section '{0}' not found in config file")]
    MissingSection(String),

    /// Min-max or z-score on a column with no spread.
    #[error("Division by zero while rescaling column '{column}': {reason}")]
    DivisionByZero { column: String, reason: String },

    /// A value outside the domain of a transform.
    #[error("Value {value} in column '{column}' is outside the domain of {transform}")]
    InvalidDomain {
        column: String,
        value: f64,
        transform: String,
    },

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    Imputation { column: String, reason: String },

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Integer power does not fit in 64 bits.
    #[error("Integer overflow raising column '{column}' to the power {power}")]
    Overflow { column: String, power: u32 },

    /// Input path does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Content could not be parsed as the declared format.
    #[error("Failed to parse data: {0}")]
    Format(String),

    /// Content parsed but holds no data.
    #[error("Data file is empty: {0}")]
    EmptyData(String),

    /// Persisting a table failed.
    #[error("Error writing data to {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping every context layer.
    pub fn root_cause(&self) -> &PreprocessingError {
        match self {
            Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get a stable error code.
    ///
    /// Context layers are transparent: a wrapped error keeps the code of
    /// the failure it wraps.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInput(_) => "EMPTY_INPUT",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::MissingSection(_) => "MISSING_SECTION",
            Self::DivisionByZero { .. } => "DIVISION_BY_ZERO",
            Self::InvalidDomain { .. } => "INVALID_DOMAIN",
            Self::Imputation { .. } => "IMPUTATION_ERROR",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::Overflow { .. } => "OVERFLOW",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Format(_) => "FORMAT_ERROR",
            Self::EmptyData(_) => "EMPTY_DATA",
            Self::Write { .. } => "WRITE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error comes from configuration rather than data.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::Configuration(_) | Self::MissingSection(_) | Self::Yaml(_)
        )
    }

    /// Check if this error happened at the file boundary (load or write).
    pub fn is_io_error(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::NotFound(_) | Self::Format(_) | Self::EmptyData(_) | Self::Write { .. } | Self::Io(_)
        )
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<crate::config::ConfigValidationError> for PreprocessingError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        PreprocessingError::Configuration(err.to_string())
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            PreprocessingError::EmptyInput("clean".to_string()).error_code(),
            "EMPTY_INPUT"
        );
        assert_eq!(
            PreprocessingError::DivisionByZero {
                column: "a".to_string(),
                reason: "max equals min".to_string(),
            }
            .error_code(),
            "DIVISION_BY_ZERO"
        );
    }

    #[test]
    fn test_with_context_keeps_root_code() {
        let error = PreprocessingError::Configuration("bad".to_string())
            .with_context("Trying to normalize with min-max")
            .with_context("Normalizing data");

        assert_eq!(error.error_code(), "CONFIGURATION_ERROR");
        assert!(matches!(
            error.root_cause(),
            PreprocessingError::Configuration(_)
        ));
        let message = error.to_string();
        assert!(message.starts_with("Normalizing data: Trying to normalize with min-max"));
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(PreprocessingError::MissingSection("data_cleaning".to_string())
            .is_configuration_error());
        assert!(!PreprocessingError::NoValidValues("a".to_string()).is_configuration_error());
    }

    #[test]
    fn test_is_io_error() {
        let error = PreprocessingError::NotFound(PathBuf::from("missing.csv"))
            .with_context("Loading data");
        assert!(error.is_io_error());
        assert!(!PreprocessingError::EmptyInput("x".to_string()).is_io_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = PreprocessingError::Imputation {
            column: "Age".to_string(),
            reason: "column is not numeric".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("IMPUTATION_ERROR"));
        assert!(json.contains("Age"));
    }
}
