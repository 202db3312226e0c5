// Per-render dataset cache: each file is loaded and calendar-derived once per pass
use crate::application::page_repository::DatasetSource;
use crate::domain::calendar::derive_calendar;
use crate::domain::error::ChartError;
use crate::domain::table::Table;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type CacheKey = (String, Option<String>);

pub struct DatasetCache<'a> {
    source: &'a dyn DatasetSource,
    tables: HashMap<CacheKey, Arc<Table>>,
}

impl<'a> DatasetCache<'a> {
    pub fn new(source: &'a dyn DatasetSource) -> Self {
        Self {
            source,
            tables: HashMap::new(),
        }
    }

    /// The dataset at `file_path`, with calendar columns when `date_column` is given.
    ///
    /// Failures are not cached, so a second chart on the same file reports its own error.
    pub fn get(&mut self, file_path: &str, date_column: Option<&str>) -> Result<Arc<Table>, ChartError> {
        let key = (file_path.to_string(), date_column.map(str::to_string));
        if let Some(table) = self.tables.get(&key) {
            return Ok(Arc::clone(table));
        }

        debug!(file_path, ?date_column, "loading dataset");
        let mut table = self.source.load(file_path)?;
        if let Some(column) = date_column {
            derive_calendar(&mut table, column)?;
        }

        let table = Arc::new(table);
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::page_repository::fakes::MemoryDatasets;
    use crate::domain::calendar::YEAR;
    use crate::domain::table::Value;

    fn datasets() -> MemoryDatasets {
        MemoryDatasets::default().with(
            "sales.csv",
            Table::from_rows(
                vec!["Date".to_string(), "Sales".to_string()],
                vec![vec![Value::text("2022-01-03"), Value::Integer(4)]],
            ),
        )
    }

    #[test]
    fn test_loads_each_key_once() {
        let source = datasets();
        let mut cache = DatasetCache::new(&source);

        let first = cache.get("sales.csv", Some("Date")).unwrap();
        let second = cache.get("sales.csv", Some("Date")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.column_index(YEAR).is_some());
        assert_eq!(source.load_count(), 1);

        let raw = cache.get("sales.csv", None).unwrap();
        assert!(raw.column_index(YEAR).is_none());
        assert_eq!(source.load_count(), 2);
    }

    #[test]
    fn test_missing_file_and_column() {
        let source = datasets();
        let mut cache = DatasetCache::new(&source);

        assert!(matches!(
            cache.get("nope.csv", None),
            Err(ChartError::MissingDataFile { .. })
        ));
        assert_eq!(
            cache.get("sales.csv", Some("Shipped")).unwrap_err(),
            ChartError::unknown_column("Shipped")
        );
    }
}
