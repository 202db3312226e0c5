// Presentation layer - HTTP routes over the page and render use cases
pub mod app_state;
pub mod handlers;
