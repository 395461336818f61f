//! Loading and writing tables.
//!
//! CSV is read with a header row and schema inference over the first 100
//! rows. Parquet is supported as a second format in both directions.

use crate::config::DataFormat;
use crate::error::{PreprocessingError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const INFER_SCHEMA_ROWS: usize = 100;

/// Load a table from `path`.
///
/// Fails with [`PreprocessingError::NotFound`] for a missing path,
/// [`PreprocessingError::Format`] for unparseable content and
/// [`PreprocessingError::EmptyData`] for a table without rows or columns.
pub fn load_data(path: impl AsRef<Path>, format: DataFormat) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PreprocessingError::NotFound(path.to_path_buf()));
    }

    debug!("Loading {} data from {}", format.as_str(), path.display());
    let df = match format {
        DataFormat::Csv => read_csv(path),
        DataFormat::Parquet => read_parquet(path),
    }
    .map_err(|e| match e {
        PolarsError::NoData(msg) => PreprocessingError::EmptyData(msg.to_string()),
        other => PreprocessingError::Format(other.to_string()),
    })?;

    if df.height() == 0 || df.width() == 0 {
        return Err(PreprocessingError::EmptyData(path.display().to_string()));
    }

    info!(
        "Loaded {} rows and {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
}

fn read_parquet(path: &Path) -> PolarsResult<DataFrame> {
    let file = File::open(path)?;
    ParquetReader::new(file).finish()
}

/// Write a table to `path`, replacing any existing file.
///
/// Every failure is reported as [`PreprocessingError::Write`].
pub fn write_data(df: &mut DataFrame, path: impl AsRef<Path>, format: DataFormat) -> Result<()> {
    let path = path.as_ref();
    let write_error = |reason: String| PreprocessingError::Write {
        path: path.to_path_buf(),
        reason,
    };

    // Stage next to the target so a failed writer never leaves output behind
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
    let file = staged.as_file_mut();
    match format {
        DataFormat::Csv => CsvWriter::new(&mut *file)
            .include_header(true)
            .with_separator(b',')
            .finish(df)
            .map_err(|e| write_error(e.to_string()))?,
        DataFormat::Parquet => {
            ParquetWriter::new(&mut *file)
                .finish(df)
                .map_err(|e| write_error(e.to_string()))?;
        }
    }
    staged
        .persist(path)
        .map_err(|e| write_error(e.error.to_string()))?;

    info!(
        "Wrote {} rows and {} columns to {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", "a,b,c\n1,2.5,x\n3,,y\n");

        let df = load_data(&path, DataFormat::Csv).unwrap();

        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("b").unwrap().null_count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_data("/definitely/not/here.csv", DataFormat::Csv).unwrap_err();
        assert!(matches!(err, PreprocessingError::NotFound(_)));
    }

    #[test]
    fn test_load_header_only_is_empty_data() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.csv", "a,b\n");

        let err = load_data(&path, DataFormat::Csv).unwrap_err();
        assert!(matches!(err, PreprocessingError::EmptyData(_)));
    }

    #[test]
    fn test_load_invalid_parquet_is_format_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.parquet", "not parquet at all");

        let err = load_data(&path, DataFormat::Parquet).unwrap_err();
        assert!(matches!(err, PreprocessingError::Format(_)));
    }

    #[test]
    fn test_write_then_load_parquet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.parquet");
        let mut df = df![
            "a" => [1i64, 2, 3],
            "b" => ["x", "y", "z"],
        ]
        .unwrap();

        write_data(&mut df, &path, DataFormat::Parquet).unwrap();
        let loaded = load_data(&path, DataFormat::Parquet).unwrap();
        assert!(loaded.equals(&df));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no_such_dir").join("out.csv");
        let mut df = df!["a" => [1]].unwrap();

        let err = write_data(&mut df, &path, DataFormat::Csv).unwrap_err();
        assert!(matches!(err, PreprocessingError::Write { .. }));
        assert!(err.is_io_error());
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let inner = Series::new(PlSmallStr::EMPTY, [1i64, 2]);
        let nested = Series::new("nested".into(), [inner.clone(), inner]);
        let mut df = DataFrame::new(vec![nested.into_column()]).unwrap();

        let err = write_data(&mut df, &path, DataFormat::Csv).unwrap_err();
        assert!(matches!(err, PreprocessingError::Write { .. }));
        assert!(!path.exists());
        // Staging file is cleaned up too
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "out.csv", "stale\n");
        let mut df = df!["a" => [1i64, 2]].unwrap();

        write_data(&mut df, &path, DataFormat::Csv).unwrap();
        let loaded = load_data(&path, DataFormat::Csv).unwrap();
        assert!(loaded.equals(&df));
    }
}
