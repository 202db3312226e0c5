// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::page_repository::DatasetSource;
use crate::application::page_service::PageService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub page_service: PageService,
    pub dashboard_service: DashboardService,
    pub datasets: Arc<dyn DatasetSource>,
}
