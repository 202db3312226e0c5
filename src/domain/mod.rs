// Domain layer - Page model, layout resolution and the chart data pipeline
pub mod aggregation;
pub mod calendar;
pub mod dashboard;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod grid;
pub mod layout;
pub mod position;
pub mod selection;
pub mod table;
