// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod csv_table;
pub mod file_dataset_source;
pub mod http_response;
pub mod json_page_store;
pub mod parquet_table;
