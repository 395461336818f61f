//! Configuration types for the preprocessing pipeline.
//!
//! Configuration comes from two places:
//!
//! - a YAML file, read through [`ConfigFile`], which exposes one typed
//!   accessor per section;
//! - code, through [`PipelineConfig::builder()`].
//!
//! Both produce the same validated [`PipelineConfig`].
//!
//! # Example
//!
//! ```yaml
//! input_format: csv
//! output_format: csv
//! data_cleaning:
//!   remove_duplicates: true
//!   handle_missing_values:
//!     drop: false
//!     mean: true
//!     knn: false
//!   handle_outliers: true
//! data_normalization:
//!   min_max:
//!     columns: [height, weight]
//!   z_score:
//!     columns: []
//!   log:
//!     columns: []
//! feature_engineering:
//!   one_hot_encoding: [gender]
//!   feature_scaling:
//!     columns: [age]
//!     degree: 3
//! ```

use crate::error::{PreprocessingError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const CLEANING_KEYS: &[&str] = &["data_cleaning", "cleaning"];
const NORMALIZATION_KEYS: &[&str] = &["data_normalization", "normalization"];
const FEATURE_ENGINEERING_KEYS: &[&str] = &["feature_engineering"];

/// File format of a table on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Comma-delimited text with a header row
    #[default]
    Csv,
    /// Apache Parquet
    Parquet,
}

impl DataFormat {
    /// Lowercase name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Strategy for handling missing values. At most one applies per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValueStrategy {
    /// Remove every row holding a null
    Drop,
    /// Fill numeric nulls with the column mean
    Mean,
    /// K-nearest-neighbour imputation over the numeric matrix
    Knn,
}

/// Raw `handle_missing_values` flags as written in a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MissingValueFlags {
    pub drop: bool,
    pub mean: bool,
    pub knn: bool,
}

impl MissingValueFlags {
    /// Resolve the flags into one strategy. Priority is `drop > mean > knn`.
    pub fn resolve(&self) -> Option<MissingValueStrategy> {
        if self.drop {
            Some(MissingValueStrategy::Drop)
        } else if self.mean {
            Some(MissingValueStrategy::Mean)
        } else if self.knn {
            Some(MissingValueStrategy::Knn)
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
struct CleaningSection {
    remove_duplicates: bool,
    handle_missing_values: MissingValueFlags,
    handle_outliers: bool,
}

/// Options for the cleaning stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "CleaningSection")]
pub struct CleaningConfig {
    /// Collapse identical rows, keeping the first occurrence
    pub remove_duplicates: bool,
    /// Resolved missing-value strategy; `None` leaves nulls alone
    pub missing_values: Option<MissingValueStrategy>,
    /// Replace IQR outliers in float columns with the median
    pub handle_outliers: bool,
}

impl From<CleaningSection> for CleaningConfig {
    fn from(section: CleaningSection) -> Self {
        let missing_values = section.handle_missing_values.resolve();
        if let Some(strategy) = missing_values {
            debug!("Resolved missing value strategy: {:?}", strategy);
        }
        Self {
            remove_duplicates: section.remove_duplicates,
            missing_values,
            handle_outliers: section.handle_outliers,
        }
    }
}

/// A list of column names targeted by one operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnList {
    pub columns: Vec<String>,
}

impl ColumnList {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// Options for the normalization stage. Each list is applied independently.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub min_max: ColumnList,
    pub z_score: ColumnList,
    pub log: ColumnList,
}

/// Polynomial feature generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolynomialConfig {
    pub columns: Vec<String>,
    /// Highest power generated; must be at least 2
    pub degree: u32,
}

impl Default for PolynomialConfig {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            degree: 2,
        }
    }
}

/// Options for the feature engineering stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureEngineeringConfig {
    /// Categorical columns to expand into indicator columns
    pub one_hot_encoding: Vec<String>,
    /// Numeric columns to raise to powers `2..=degree`
    pub feature_scaling: PolynomialConfig,
}

/// Validated configuration for a full pipeline run.
///
/// Use [`PipelineConfig::builder()`] to construct one in code, or
/// [`ConfigFile::pipeline_config()`] to read one from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineConfig {
    pub input_format: DataFormat,
    pub output_format: DataFormat,
    pub cleaning: CleaningConfig,
    pub normalization: NormalizationConfig,
    pub feature_engineering: FeatureEngineeringConfig,
}

impl PipelineConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = PipelineConfig::builder()
    ///     .remove_duplicates(true)
    ///     .missing_values(MissingValueStrategy::Mean)
    ///     .min_max_columns(["height", "weight"])
    ///     .build()?;
    /// ```
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        let scaling = &self.feature_engineering.feature_scaling;
        if scaling.degree < 2 {
            return Err(ConfigValidationError::InvalidDegree(scaling.degree));
        }

        let lists = [
            ("min_max", &self.normalization.min_max.columns),
            ("z_score", &self.normalization.z_score.columns),
            ("log", &self.normalization.log.columns),
            ("one_hot_encoding", &self.feature_engineering.one_hot_encoding),
            ("feature_scaling", &scaling.columns),
        ];
        for (option, columns) in lists {
            let mut seen = HashSet::new();
            if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
                return Err(ConfigValidationError::DuplicateColumn {
                    option: option.to_string(),
                    column: dup.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid polynomial degree: {0} (must be at least 2)")]
    InvalidDegree(u32),

    #[error("Column '{column}' is listed more than once in '{option}'")]
    DuplicateColumn { option: String, column: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    input_format: Option<DataFormat>,
    output_format: Option<DataFormat>,
    remove_duplicates: Option<bool>,
    missing_values: Option<MissingValueStrategy>,
    handle_outliers: Option<bool>,
    min_max: Option<Vec<String>>,
    z_score: Option<Vec<String>>,
    log: Option<Vec<String>>,
    one_hot: Option<Vec<String>>,
    polynomial: Option<PolynomialConfig>,
}

fn to_strings<I, S>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    columns.into_iter().map(Into::into).collect()
}

impl PipelineConfigBuilder {
    /// Set the format of the input table.
    pub fn input_format(mut self, format: DataFormat) -> Self {
        self.input_format = Some(format);
        self
    }

    /// Set the format of the output table.
    pub fn output_format(mut self, format: DataFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Set the missing value strategy.
    pub fn missing_values(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_values = Some(strategy);
        self
    }

    /// Enable or disable median replacement of IQR outliers.
    pub fn handle_outliers(mut self, handle: bool) -> Self {
        self.handle_outliers = Some(handle);
        self
    }

    /// Columns rescaled to `[0, 1]`.
    pub fn min_max_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.min_max = Some(to_strings(columns));
        self
    }

    /// Columns standardized to zero mean and unit variance.
    pub fn z_score_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.z_score = Some(to_strings(columns));
        self
    }

    /// Columns mapped through `ln((1 + x) / 2)`.
    pub fn log_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.log = Some(to_strings(columns));
        self
    }

    /// Categorical columns to one-hot encode.
    pub fn one_hot_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_hot = Some(to_strings(columns));
        self
    }

    /// Numeric columns to expand into powers `2..=degree`.
    pub fn polynomial_features<I, S>(mut self, columns: I, degree: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.polynomial = Some(PolynomialConfig {
            columns: to_strings(columns),
            degree,
        });
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            input_format: self.input_format.unwrap_or_default(),
            output_format: self.output_format.unwrap_or_default(),
            cleaning: CleaningConfig {
                remove_duplicates: self.remove_duplicates.unwrap_or(false),
                missing_values: self.missing_values,
                handle_outliers: self.handle_outliers.unwrap_or(false),
            },
            normalization: NormalizationConfig {
                min_max: ColumnList::new(self.min_max.unwrap_or_default()),
                z_score: ColumnList::new(self.z_score.unwrap_or_default()),
                log: ColumnList::new(self.log.unwrap_or_default()),
            },
            feature_engineering: FeatureEngineeringConfig {
                one_hot_encoding: self.one_hot.unwrap_or_default(),
                feature_scaling: self.polynomial.unwrap_or_default(),
            },
        };

        config.validate()?;
        Ok(config)
    }
}

/// A parsed YAML configuration file.
///
/// The file must be a mapping with string keys at the top level. Sections
/// are deserialized lazily by the typed accessors, so a missing or malformed
/// section is reported only when a stage asks for it.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    root: serde_yaml::Mapping,
}

impl ConfigFile {
    /// Load and parse a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PreprocessingError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded config file: {}", path.display());
        Self::parse(&content)
    }

    /// Parse configuration from YAML text.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Err(PreprocessingError::Configuration(
                "Config file is empty".to_string(),
            ));
        }

        let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| {
            PreprocessingError::Configuration(format!("Error parsing config file: {}", e))
        })?;

        match value {
            serde_yaml::Value::Null => Err(PreprocessingError::Configuration(
                "Config file is empty".to_string(),
            )),
            serde_yaml::Value::Mapping(root) => {
                if root.iter().all(|(key, _)| key.is_string()) {
                    Ok(Self { root })
                } else {
                    Err(PreprocessingError::Configuration(
                        "The loaded YAML data is not a mapping with string keys".to_string(),
                    ))
                }
            }
            _ => Err(PreprocessingError::Configuration(
                "The loaded YAML data is not a mapping with string keys".to_string(),
            )),
        }
    }

    fn section(&self, keys: &[&str]) -> Result<&serde_yaml::Value> {
        keys.iter()
            .find_map(|key| self.root.get(*key))
            .ok_or_else(|| PreprocessingError::MissingSection(keys[0].to_string()))
    }

    fn typed_section<T: DeserializeOwned>(&self, keys: &[&str]) -> Result<T> {
        let value = self.section(keys)?;
        serde_yaml::from_value(value.clone()).map_err(|e| {
            PreprocessingError::Configuration(format!("Invalid '{}' section: {}", keys[0], e))
        })
    }

    fn format(&self, key: &str) -> Result<DataFormat> {
        match self.root.get(key) {
            None => Ok(DataFormat::default()),
            Some(value) => serde_yaml::from_value(value.clone()).map_err(|_| {
                PreprocessingError::Configuration(format!(
                    "Unsupported {}: {:?} (expected 'csv' or 'parquet')",
                    key, value
                ))
            }),
        }
    }

    /// The `data_cleaning` section.
    pub fn cleaning(&self) -> Result<CleaningConfig> {
        self.typed_section(CLEANING_KEYS)
    }

    /// The `data_normalization` section.
    pub fn normalization(&self) -> Result<NormalizationConfig> {
        self.typed_section(NORMALIZATION_KEYS)
    }

    /// The `feature_engineering` section.
    pub fn feature_engineering(&self) -> Result<FeatureEngineeringConfig> {
        self.typed_section(FEATURE_ENGINEERING_KEYS)
    }

    /// Format of the input table. Defaults to CSV when absent.
    pub fn input_format(&self) -> Result<DataFormat> {
        self.format("input_format")
    }

    /// Format of the output table. Defaults to CSV when absent.
    pub fn output_format(&self) -> Result<DataFormat> {
        self.format("output_format")
    }

    /// Assemble and validate the full pipeline configuration.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let config = PipelineConfig {
            input_format: self.input_format()?,
            output_format: self.output_format()?,
            cleaning: self.cleaning()?,
            normalization: self.normalization()?,
            feature_engineering: self.feature_engineering()?,
        };
        config.validate()?;
        Ok(config)
    }
}
