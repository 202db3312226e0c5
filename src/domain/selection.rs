// View-time user selections for one chart
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The synthetic choice that leaves an axis unrestricted
pub const ALL: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeGranularity {
    #[default]
    Year,
    Month,
    Week,
    Day,
}

/// Resolved multi-select state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    All,
    Only(Vec<String>),
}

impl Choice {
    /// Concrete values replace `All`; `All` alone means unrestricted; nothing at all
    /// is an empty restriction the caller must reject.
    pub fn from_selection(selected: &[String]) -> Self {
        let concrete: Vec<String> = selected.iter().filter(|v| *v != ALL).cloned().collect();
        if concrete.is_empty() && selected.iter().any(|v| v == ALL) {
            Choice::All
        } else {
            Choice::Only(concrete)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

fn all() -> Vec<String> {
    vec![ALL.to_string()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub granularity: TimeGranularity,
    pub years: Vec<String>,
    pub months: Vec<String>,
    pub weeks: Vec<String>,
    pub days: DayRange,
    /// Per-dimension value choices; a dimension left out is unrestricted
    pub dimensions: BTreeMap<String, Vec<String>>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            granularity: TimeGranularity::Year,
            years: all(),
            months: all(),
            weeks: all(),
            days: DayRange::default(),
            dimensions: BTreeMap::new(),
        }
    }
}

impl FilterSelection {
    pub fn dimension_choice(&self, dimension: &str) -> Choice {
        self.dimensions
            .get(dimension)
            .map(|selected| Choice::from_selection(selected))
            .unwrap_or(Choice::All)
    }
}

/// Everything a viewer chose for one chart on this render pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSelection {
    pub filters: FilterSelection,
    pub dimension: Option<String>,
    /// Slicer charts choose a list of dimensions instead of one
    pub dimensions: Option<Vec<String>>,
    pub measure: Option<String>,
    pub prior_year: Option<i64>,
    pub this_year: Option<i64>,
}
