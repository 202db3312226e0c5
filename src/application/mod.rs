// Application layer - Use cases over pages and chart datasets
pub mod chart_dispatcher;
pub mod dashboard_service;
pub mod dataset_cache;
pub mod page_repository;
pub mod page_service;
