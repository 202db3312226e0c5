// Repository traits for persisted pages and chart datasets
use crate::domain::dashboard::Page;
use crate::domain::error::ChartError;
use crate::domain::table::{DatasetSchema, Table};
use async_trait::async_trait;

#[async_trait]
pub trait PageStore: Send + Sync {
    /// Read the whole page collection; an empty store yields no pages
    async fn load_pages(&self) -> anyhow::Result<Vec<Page>>;

    /// Replace the whole page collection
    async fn save_pages(&self, pages: &[Page]) -> anyhow::Result<()>;
}

/// Tabular files addressed by the `file_path` a chart declares.
///
/// Loading is synchronous; callers on the async runtime run it off the reactor.
pub trait DatasetSource: Send + Sync {
    fn load(&self, file_path: &str) -> Result<Table, ChartError>;

    /// Data files available for new charts, sorted
    fn list_files(&self) -> anyhow::Result<Vec<String>>;

    fn schema(&self, file_path: &str) -> Result<DatasetSchema, ChartError> {
        self.load(file_path).map(|table| DatasetSchema::classify(&table))
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct MemoryPageStore {
        pages: Mutex<Vec<Page>>,
    }

    impl MemoryPageStore {
        pub fn with_pages(pages: Vec<Page>) -> Self {
            Self {
                pages: Mutex::new(pages),
            }
        }

        pub fn snapshot(&self) -> Vec<Page> {
            self.pages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageStore for MemoryPageStore {
        async fn load_pages(&self) -> anyhow::Result<Vec<Page>> {
            Ok(self.snapshot())
        }

        async fn save_pages(&self, pages: &[Page]) -> anyhow::Result<()> {
            *self.pages.lock().unwrap() = pages.to_vec();
            Ok(())
        }
    }

    /// Datasets keyed by path, counting how often each is loaded
    #[derive(Default)]
    pub struct MemoryDatasets {
        tables: HashMap<String, Table>,
        loads: AtomicUsize,
    }

    impl MemoryDatasets {
        pub fn with(mut self, path: &str, table: Table) -> Self {
            self.tables.insert(path.to_string(), table);
            self
        }

        pub fn load_count(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl DatasetSource for MemoryDatasets {
        fn load(&self, file_path: &str) -> Result<Table, ChartError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.tables
                .get(file_path)
                .cloned()
                .ok_or_else(|| ChartError::MissingDataFile {
                    path: file_path.to_string(),
                    reason: "not found".to_string(),
                })
        }

        fn list_files(&self) -> anyhow::Result<Vec<String>> {
            let mut files: Vec<String> = self.tables.keys().cloned().collect();
            files.sort();
            Ok(files)
        }
    }
}
