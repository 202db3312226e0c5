// Dataset source over a data directory of CSV and Parquet files
use crate::application::page_repository::DatasetSource;
use crate::domain::error::ChartError;
use crate::domain::table::Table;
use crate::infrastructure::csv_table::read_csv;
use crate::infrastructure::parquet_table::read_parquet;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Supported data file formats, picked by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    Csv,
    Parquet,
}

impl DataFormat {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(DataFormat::Csv)
        } else if ext.eq_ignore_ascii_case("parquet") {
            Some(DataFormat::Parquet)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    data_dir: PathBuf,
}

impl FileDatasetSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Relative paths live under the data directory; absolute paths are used as-is
    fn resolve(&self, file_path: &str) -> PathBuf {
        let path = Path::new(file_path);
        if path.is_absolute() || path.starts_with(&self.data_dir) {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

impl DatasetSource for FileDatasetSource {
    fn load(&self, file_path: &str) -> Result<Table, ChartError> {
        let path = self.resolve(file_path);
        let loaded = match DataFormat::of(&path) {
            Some(DataFormat::Csv) => read_csv(&path),
            Some(DataFormat::Parquet) => read_parquet(&path),
            None => Err(anyhow::anyhow!("unsupported data file format")),
        };
        let table = loaded.map_err(|e| ChartError::MissingDataFile {
            path: file_path.to_string(),
            reason: format!("{:#}", e),
        })?;

        if table.is_empty() {
            warn!(path = %path.display(), "dataset has no rows");
        } else {
            debug!(path = %path.display(), rows = table.len(), "dataset loaded");
        }
        Ok(table)
    }

    fn list_files(&self) -> anyhow::Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.data_dir)
            .with_context(|| format!("Failed to list {}", self.data_dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && DataFormat::of(&path).is_some() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Value;
    use crate::infrastructure::parquet_table::tests::write_sales;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_csv_schema_classifies_columns() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "sales.csv",
            "Region,Units,Sales,Date\nEast,3,10.5,2022-01-03\nWest,,4,2022/02/01\n",
        );
        let schema = FileDatasetSource::new(dir.path()).schema("sales.csv").unwrap();
        assert_eq!(schema.dimensions, vec!["Region"]);
        assert_eq!(schema.measures, vec!["Units", "Sales"]);
        assert_eq!(schema.dates, vec!["Date"]);
    }

    #[test]
    fn test_parquet_loads_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        write_sales(&dir.path().join("sales.parquet"));
        let source = FileDatasetSource::new(dir.path());

        let table = source.load("sales.parquet").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][1], Value::Integer(3));

        let schema = source.schema("sales.parquet").unwrap();
        assert_eq!(schema.dimensions, vec!["Region"]);
        assert_eq!(schema.measures, vec!["Units", "Sales"]);
        assert_eq!(schema.dates, vec!["Date"]);
    }

    #[test]
    fn test_absolute_paths_are_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", "A\n1\n");
        let absolute = dir.path().join("a.csv");

        let source = FileDatasetSource::new("./database");
        let table = source.load(absolute.to_str().unwrap()).unwrap();
        assert_eq!(table.rows()[0][0], Value::Integer(1));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDatasetSource::new(dir.path()).load("nope.csv").unwrap_err();
        assert!(matches!(err, ChartError::MissingDataFile { ref path, .. } if path == "nope.csv"));

        let err = FileDatasetSource::new(dir.path()).load("nope.parquet").unwrap_err();
        assert_eq!(err.code(), "missing_data_file");
    }

    #[test]
    fn test_header_only_file_is_an_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "empty.csv", "Region,Sales\n");
        let table = FileDatasetSource::new(dir.path()).load("empty.csv").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", "A\n1\n");
        let err = FileDatasetSource::new(dir.path()).load("notes.txt").unwrap_err();
        assert!(
            matches!(err, ChartError::MissingDataFile { ref reason, .. } if reason.contains("format"))
        );
    }

    #[test]
    fn test_list_files_only_data_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.csv", "A\n1\n");
        write(dir.path(), "a.CSV", "A\n1\n");
        write(dir.path(), "notes.txt", "hi");
        write_sales(&dir.path().join("c.parquet"));
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let files = FileDatasetSource::new(dir.path()).list_files().unwrap();
        assert_eq!(files, vec!["a.CSV", "b.csv", "c.parquet"]);
    }
}
