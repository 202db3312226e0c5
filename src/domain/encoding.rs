// Renderer-bound chart frames: a finalized table plus how to draw it
use super::aggregation::Aggregation;
use super::dashboard::ChartType;
use super::filter::{FilterOptions, FilterSummary};
use super::table::Value;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Bar,
    Line,
    Pie,
    Scatter,
    Table,
    Choropleth,
    VarianceBars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// How choropleth locations are interpreted by the map renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationMode {
    UsaStates,
    Iso3,
    CountryNames,
}

impl LocationMode {
    pub fn scope(self) -> &'static str {
        match self {
            LocationMode::UsaStates => "usa",
            LocationMode::Iso3 | LocationMode::CountryNames => "world",
        }
    }

    /// Detect the location mode from a column's values
    pub fn detect<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let labels: Vec<String> = values
            .into_iter()
            .filter(|v| !v.is_missing())
            .map(|v| v.to_string())
            .collect();
        let all = |pred: fn(&str) -> bool| !labels.is_empty() && labels.iter().all(|l| pred(l));

        if all(|l| is_upper_code(l, 2)) || all(|l| US_STATES.contains(&l)) {
            LocationMode::UsaStates
        } else if all(|l| is_upper_code(l, 3)) {
            LocationMode::Iso3
        } else {
            LocationMode::CountryNames
        }
    }
}

fn is_upper_code(label: &str, len: usize) -> bool {
    label.len() == len && label.chars().all(|c| c.is_ascii_uppercase())
}

const US_STATES: [&str; 50] = [
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
    "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa",
    "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan",
    "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
    "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio",
    "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota",
    "Tennessee", "Texas", "Utah", "Vermont", "Virginia", "Washington", "West Virginia",
    "Wisconsin", "Wyoming",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Encoding {
    pub x: Option<String>,
    pub y: Option<String>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub orientation: Orientation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_mode: Option<LocationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<&'static str>,
    pub annotation: String,
}

impl Encoding {
    /// x = `x`, y = `y`, titled after the columns
    pub fn axes(x: &str, y: &str) -> Self {
        Self {
            x: Some(x.to_string()),
            y: Some(y.to_string()),
            x_title: Some(x.to_string()),
            y_title: Some(y.to_string()),
            ..Self::default()
        }
    }

    pub fn inverted(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
            x_title: self.y_title,
            y_title: self.x_title,
            orientation: Orientation::Horizontal,
            ..self
        }
    }
}

/// Everything the external renderer needs to draw one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub chart_id: String,
    pub title: String,
    pub chart_type: ChartType,
    pub mark: Mark,
    pub encoding: Encoding,
    pub data: Aggregation,
    pub filters: FilterSummary,
    pub options: FilterOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::text(*v)).collect()
    }

    #[test]
    fn test_location_mode_detection() {
        assert_eq!(LocationMode::detect(&labels(&["CA", "NY"])), LocationMode::UsaStates);
        assert_eq!(LocationMode::detect(&labels(&["Texas", "Ohio"])), LocationMode::UsaStates);
        assert_eq!(LocationMode::detect(&labels(&["BRA", "USA"])), LocationMode::Iso3);
        assert_eq!(LocationMode::detect(&labels(&["Brazil", "CA"])), LocationMode::CountryNames);
        assert_eq!(LocationMode::UsaStates.scope(), "usa");
    }

    #[test]
    fn test_inverted_encoding_swaps_axes() {
        let encoding = Encoding::axes("Region", "Sales").inverted();
        assert_eq!(encoding.x.as_deref(), Some("Sales"));
        assert_eq!(encoding.y_title.as_deref(), Some("Region"));
        assert_eq!(encoding.orientation, Orientation::Horizontal);
    }
}
