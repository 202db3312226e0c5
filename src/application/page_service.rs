// Page service - Use cases for creating, editing and deleting pages and their charts
use crate::application::page_repository::{DatasetSource, PageStore};
use crate::domain::dashboard::{Chart, ChartPosition, ChartType, Page};
use crate::domain::error::{ChartError, LayoutError};
use crate::domain::grid::{GridTemplate, SlotAvailability};
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("page '{0}' not found")]
    PageNotFound(String),

    #[error("a page titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("page title must not be empty")]
    EmptyTitle,

    #[error("chart '{chart_id}' not found on page '{page}'")]
    ChartNotFound { page: String, chart_id: String },

    #[error("position {position} is already occupied")]
    PositionOccupied { position: String },

    #[error("position {position} is not part of the page grid")]
    PositionOutsideGrid { position: String },

    #[error("{chart_type} needs at least {required} {role} (got {given})")]
    Requirement {
        chart_type: String,
        role: &'static str,
        required: usize,
        given: usize,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// A chart as submitted by the setup form, before it has an id
#[derive(Debug, Clone, Deserialize)]
pub struct ChartDraft {
    #[serde(rename = "chart_name")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChartType,
    #[serde(rename = "dimension", default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub main_dimension: Option<String>,
    #[serde(rename = "measure", default)]
    pub measures: Vec<String>,
    #[serde(rename = "date_column", default)]
    pub date_fields: Vec<String>,
    pub file_path: String,
    pub position: ChartPosition,
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub display_filters: bool,
}

impl ChartDraft {
    /// The main dimension always ends up in the dimension list
    pub fn into_chart(self, id: String) -> Chart {
        let mut dimensions = self.dimensions;
        if let Some(main) = &self.main_dimension {
            if !dimensions.contains(main) {
                dimensions.push(main.clone());
            }
        }
        Chart {
            id,
            name: self.name,
            kind: self.kind,
            dimensions,
            main_dimension: self.main_dimension,
            measures: self.measures,
            date_fields: self.date_fields,
            file_path: self.file_path,
            position: self.position,
            invert: self.invert,
            display_filters: self.display_filters,
        }
    }
}

#[derive(Clone)]
pub struct PageService {
    store: Arc<dyn PageStore>,
    datasets: Arc<dyn DatasetSource>,
    grid: GridTemplate,
}

impl PageService {
    pub fn new(store: Arc<dyn PageStore>, datasets: Arc<dyn DatasetSource>, grid: GridTemplate) -> Self {
        Self {
            store,
            datasets,
            grid,
        }
    }

    pub async fn list_pages(&self) -> Result<Vec<Page>, PageError> {
        Ok(self.store.load_pages().await?)
    }

    pub async fn page(&self, title: &str) -> Result<Page, PageError> {
        let pages = self.store.load_pages().await?;
        pages
            .into_iter()
            .find(|p| p.title == title)
            .ok_or_else(|| PageError::PageNotFound(title.to_string()))
    }

    pub async fn create_page(&self, title: &str, with_title: bool) -> Result<Page, PageError> {
        let title = valid_title(title)?;
        let mut pages = self.store.load_pages().await?;
        if pages.iter().any(|p| p.title == title) {
            return Err(PageError::DuplicateTitle(title));
        }

        let page = Page::new(title, with_title);
        pages.push(page.clone());
        self.store.save_pages(&pages).await?;
        info!(title = %page.title, "page created");
        Ok(page)
    }

    /// Rename a page and optionally change whether its title is shown
    pub async fn update_page(
        &self,
        title: &str,
        new_title: &str,
        with_title: Option<bool>,
    ) -> Result<Page, PageError> {
        let new_title = valid_title(new_title)?;
        let mut pages = self.store.load_pages().await?;
        if new_title != title && pages.iter().any(|p| p.title == new_title) {
            return Err(PageError::DuplicateTitle(new_title));
        }

        let page = find_page_mut(&mut pages, title)?;
        page.title = new_title;
        if let Some(with_title) = with_title {
            page.with_title = with_title;
        }
        let updated = page.clone();
        self.store.save_pages(&pages).await?;
        Ok(updated)
    }

    pub async fn delete_page(&self, title: &str) -> Result<(), PageError> {
        let mut pages = self.store.load_pages().await?;
        let before = pages.len();
        pages.retain(|p| p.title != title);
        if pages.len() == before {
            return Err(PageError::PageNotFound(title.to_string()));
        }
        self.store.save_pages(&pages).await?;
        info!(title, "page deleted");
        Ok(())
    }

    pub async fn add_chart(&self, title: &str, draft: ChartDraft) -> Result<Chart, PageError> {
        let mut pages = self.store.load_pages().await?;
        let page = find_page_mut(&mut pages, title)?;

        let chart = draft.into_chart(Uuid::new_v4().simple().to_string());
        self.validate(page, &chart, None).await?;

        page.charts.push(chart.clone());
        self.store.save_pages(&pages).await?;
        info!(page = title, chart_id = %chart.id, kind = %chart.kind, "chart added");
        Ok(chart)
    }

    /// Replace a chart's configuration, keeping its id
    pub async fn edit_chart(&self, title: &str, chart_id: &str, draft: ChartDraft) -> Result<Chart, PageError> {
        let mut pages = self.store.load_pages().await?;
        let page = find_page_mut(&mut pages, title)?;
        let index = chart_index(page, chart_id)?;

        let chart = draft.into_chart(chart_id.to_string());
        self.validate(page, &chart, Some(chart_id)).await?;

        page.charts[index] = chart.clone();
        self.store.save_pages(&pages).await?;
        Ok(chart)
    }

    pub async fn delete_chart(&self, title: &str, chart_id: &str) -> Result<(), PageError> {
        let mut pages = self.store.load_pages().await?;
        let page = find_page_mut(&mut pages, title)?;
        let index = chart_index(page, chart_id)?;

        page.charts.remove(index);
        self.store.save_pages(&pages).await?;
        info!(page = title, chart_id, "chart deleted");
        Ok(())
    }

    /// Every grid slot with whether a chart on the page claims it
    pub async fn available_positions(&self, title: &str) -> Result<Vec<SlotAvailability>, PageError> {
        let page = self.page(title).await?;
        Ok(self.grid.availability(&page.occupied_tags(None)?))
    }

    async fn validate(&self, page: &Page, chart: &Chart, editing: Option<&str>) -> Result<(), PageError> {
        let requirements = chart
            .kind
            .requirements()
            .ok_or_else(|| ChartError::UnsupportedChartType(chart.kind.to_string()))?;

        let tags = chart.position.parse()?;
        if let Some(outside) = tags.iter().find(|tag| !self.grid.contains(tag)) {
            return Err(PageError::PositionOutsideGrid {
                position: outside.to_string(),
            });
        }
        let occupied = page.occupied_tags(editing)?;
        if let Some(taken) = tags.iter().find(|tag| occupied.contains(tag)) {
            return Err(PageError::PositionOccupied {
                position: taken.to_string(),
            });
        }

        for (role, required, given) in [
            ("dimension", requirements.dimensions, chart.dimensions.len()),
            ("measure", requirements.measures, chart.measures.len()),
            ("date field", requirements.date_fields, chart.date_fields.len()),
        ] {
            if given < required {
                return Err(PageError::Requirement {
                    chart_type: chart.kind.to_string(),
                    role,
                    required,
                    given,
                });
            }
        }

        self.check_columns(chart).await
    }

    /// Every declared column must exist in the chart's dataset
    async fn check_columns(&self, chart: &Chart) -> Result<(), PageError> {
        let datasets = Arc::clone(&self.datasets);
        let file_path = chart.file_path.clone();
        let table = tokio::task::spawn_blocking(move || datasets.load(&file_path))
            .await
            .context("dataset load task failed")??;

        chart
            .dimensions
            .iter()
            .chain(&chart.measures)
            .chain(&chart.date_fields)
            .try_for_each(|column| table.require_column(column).map(|_| ()))?;
        Ok(())
    }
}

fn valid_title(title: &str) -> Result<String, PageError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PageError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn find_page_mut<'a>(pages: &'a mut [Page], title: &str) -> Result<&'a mut Page, PageError> {
    pages
        .iter_mut()
        .find(|p| p.title == title)
        .ok_or_else(|| PageError::PageNotFound(title.to_string()))
}

fn chart_index(page: &Page, chart_id: &str) -> Result<usize, PageError> {
    page.charts
        .iter()
        .position(|c| c.id == chart_id)
        .ok_or_else(|| PageError::ChartNotFound {
            page: page.title.clone(),
            chart_id: chart_id.to_string(),
        })
}
