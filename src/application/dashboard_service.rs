// Dashboard service - Use case for rendering a page: layout plus one outcome per chart
use crate::application::chart_dispatcher::render_chart;
use crate::application::dataset_cache::DatasetCache;
use crate::application::page_repository::{DatasetSource, PageStore};
use crate::application::page_service::PageError;
use crate::domain::dashboard::Page;
use crate::domain::encoding::ChartFrame;
use crate::domain::grid::{GridTemplate, SlotAvailability};
use crate::domain::layout::{resolve_layout, PageLayout};
use crate::domain::selection::ChartSelection;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// View context for one render pass
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    pub edit_mode: bool,
    /// Viewer selections keyed by chart id; charts without one use defaults
    pub selections: HashMap<String, ChartSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    Rendered { frame: Box<ChartFrame> },
    Failed {
        chart_id: String,
        code: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPage {
    pub title: String,
    pub with_title: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<PageLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_error: Option<String>,
    pub charts: Vec<ChartOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<SlotAvailability>>,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn PageStore>,
    datasets: Arc<dyn DatasetSource>,
    grid: GridTemplate,
}

impl DashboardService {
    pub fn new(store: Arc<dyn PageStore>, datasets: Arc<dyn DatasetSource>, grid: GridTemplate) -> Self {
        Self {
            store,
            datasets,
            grid,
        }
    }

    pub async fn render_page(&self, title: &str, request: RenderRequest) -> Result<RenderedPage, PageError> {
        let pages = self.store.load_pages().await?;
        let page = pages
            .into_iter()
            .find(|p| p.title == title)
            .ok_or_else(|| PageError::PageNotFound(title.to_string()))?;

        let datasets = Arc::clone(&self.datasets);
        let grid = self.grid.clone();
        let rendered = tokio::task::spawn_blocking(move || render_pass(&page, &request, datasets.as_ref(), &grid))
            .await
            .context("render task failed")?;
        Ok(rendered)
    }
}

/// One synchronous pass over a page. Chart failures stay local to their chart.
fn render_pass(
    page: &Page,
    request: &RenderRequest,
    datasets: &dyn DatasetSource,
    grid: &GridTemplate,
) -> RenderedPage {
    let (layout, layout_error) = match resolve_layout(&page.charts) {
        Ok(layout) => (Some(layout), None),
        Err(e) => {
            warn!(page = %page.title, error = %e, "page layout could not be resolved");
            (None, Some(e.to_string()))
        }
    };

    // Resolved layouts render in slot order; otherwise fall back to declaration order
    let order: Vec<&str> = match &layout {
        Some(layout) => layout.chart_order(),
        None => page.charts.iter().map(|c| c.id.as_str()).collect(),
    };

    let default_selection = ChartSelection::default();
    let mut cache = DatasetCache::new(datasets);
    let charts = order
        .into_iter()
        .filter_map(|id| page.chart(id))
        .map(|chart| {
            let selection = request.selections.get(&chart.id).unwrap_or(&default_selection);
            match render_chart(chart, selection, &mut cache) {
                Ok(frame) => {
                    debug!(chart_id = %chart.id, "chart rendered");
                    ChartOutcome::Rendered { frame: Box::new(frame) }
                }
                Err(e) => {
                    warn!(chart_id = %chart.id, error = %e, "chart failed to render");
                    ChartOutcome::Failed {
                        chart_id: chart.id.clone(),
                        code: e.code(),
                        message: e.to_string(),
                    }
                }
            }
        })
        .collect();

    // A page whose tags do not parse has no occupancy to list; layout_error carries the cause
    let positions = match (request.edit_mode, page.occupied_tags(None)) {
        (false, _) => None,
        (true, Ok(occupied)) => Some(grid.availability(&occupied)),
        (true, Err(e)) => {
            warn!(page = %page.title, error = %e, "edit positions unavailable");
            None
        }
    };

    RenderedPage {
        title: page.title.clone(),
        with_title: page.with_title,
        layout,
        layout_error,
        charts,
        positions,
    }
}
