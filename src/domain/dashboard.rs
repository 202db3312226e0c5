// Dashboard domain model: pages and the charts placed on them
use super::error::LayoutError;
use super::position::{parse_chart_tags, PositionTag};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    #[serde(default)]
    pub with_title: bool,
    #[serde(default)]
    pub charts: Vec<Chart>,
}

impl Page {
    pub fn new(title: String, with_title: bool) -> Self {
        Self {
            title,
            with_title,
            charts: Vec::new(),
        }
    }

    pub fn chart(&self, chart_id: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.id == chart_id)
    }

    /// Slots claimed by the charts of this page, optionally ignoring one chart
    pub fn occupied_tags(&self, except_chart: Option<&str>) -> Result<HashSet<PositionTag>, LayoutError> {
        let mut occupied = HashSet::new();
        for chart in &self.charts {
            if Some(chart.id.as_str()) == except_chart {
                continue;
            }
            occupied.extend(chart.position.parse()?);
        }
        Ok(occupied)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "chart_id")]
    pub id: String,
    #[serde(rename = "chart_name")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChartType,
    #[serde(rename = "dimension", default)]
    pub dimensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
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

impl Chart {
    /// The date column driving calendar derivation, if any
    pub fn date_field(&self) -> Option<&str> {
        self.date_fields.first().map(String::as_str)
    }
}

/// A single fixed slot, or 1–3 slots spanned in one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartPosition {
    Single(String),
    Span(Vec<String>),
}

impl ChartPosition {
    pub fn raw_tags(&self) -> Vec<&str> {
        match self {
            ChartPosition::Single(tag) => vec![tag.as_str()],
            ChartPosition::Span(tags) => tags.iter().map(String::as_str).collect(),
        }
    }

    pub fn parse(&self) -> Result<Vec<PositionTag>, LayoutError> {
        parse_chart_tags(self.raw_tags())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    BarChart,
    LineChart,
    PieChart,
    ScatterPlot,
    SlicerChart,
    VarianceComparison,
    ChoroplethMap,
    /// A type name this build does not know how to render
    Unsupported(String),
}

/// Minimum number of columns of each role a chart type needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRequirements {
    pub dimensions: usize,
    pub measures: usize,
    pub date_fields: usize,
}

impl ChartType {
    pub const ALL: [ChartType; 7] = [
        ChartType::BarChart,
        ChartType::LineChart,
        ChartType::PieChart,
        ChartType::ScatterPlot,
        ChartType::SlicerChart,
        ChartType::VarianceComparison,
        ChartType::ChoroplethMap,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ChartType::BarChart => "Bar Chart",
            ChartType::LineChart => "Line Chart",
            ChartType::PieChart => "Pie Chart",
            ChartType::ScatterPlot => "Scatter Plot",
            ChartType::SlicerChart => "Slicer Chart",
            ChartType::VarianceComparison => "Variance Comparison",
            ChartType::ChoroplethMap => "Choropleth Map",
            ChartType::Unsupported(name) => name,
        }
    }

    pub fn requirements(&self) -> Option<ChartRequirements> {
        let (dimensions, measures, date_fields) = match self {
            ChartType::BarChart => (1, 1, 0),
            ChartType::LineChart => (1, 1, 1),
            ChartType::PieChart => (1, 1, 0),
            ChartType::ScatterPlot => (1, 2, 0),
            ChartType::SlicerChart => (1, 1, 0),
            ChartType::VarianceComparison => (0, 1, 1),
            ChartType::ChoroplethMap => (1, 1, 0),
            ChartType::Unsupported(_) => return None,
        };
        Some(ChartRequirements {
            dimensions,
            measures,
            date_fields,
        })
    }
}

impl From<String> for ChartType {
    fn from(name: String) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .unwrap_or(ChartType::Unsupported(name))
    }
}

impl From<ChartType> for String {
    fn from(kind: ChartType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
