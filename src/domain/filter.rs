// Filter engine: applies time-unit and dimension restrictions to a private copy of a dataset
use super::calendar::{DAY, MONTH, MONTH_DISPLAY, WEEK_YEAR, YEAR};
use super::dashboard::{Chart, ChartType};
use super::error::ChartError;
use super::selection::{ALL, ChartSelection, Choice, FilterSelection, TimeGranularity};
use super::table::{Table, Value};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

const SUMMARY_PREVIEW: usize = 3;

/// One active restriction, kept for the on-chart annotation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterEntry {
    Values { label: String, values: Vec<String> },
    Range { label: String, start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterSummary {
    entries: Vec<FilterEntry>,
}

impl FilterSummary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn values(&mut self, label: impl Into<String>, values: &[String]) {
        self.entries.push(FilterEntry::Values {
            label: label.into(),
            values: values.to_vec(),
        });
    }

    fn range(&mut self, label: impl Into<String>, start: NaiveDate, end: NaiveDate) {
        self.entries.push(FilterEntry::Range {
            label: label.into(),
            start,
            end,
        });
    }
}

impl fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match entry {
                FilterEntry::Values { label, values } if values.len() > SUMMARY_PREVIEW => {
                    write!(f, "{}: {}...", label, values[..SUMMARY_PREVIEW].join(", "))?
                }
                FilterEntry::Values { label, values } => {
                    write!(f, "{}: {}", label, values.join(", "))?
                }
                FilterEntry::Range { label, start, end } => write!(f, "{}: {} to {}", label, start, end)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionOptions {
    pub dimension: String,
    pub values: Vec<String>,
}

/// Choice lists the viewer can pick from; multi-select lists start with `All`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterOptions {
    pub years: Vec<String>,
    pub months: Vec<String>,
    pub weeks: Vec<String>,
    pub day_bounds: Option<(NaiveDate, NaiveDate)>,
    pub dimensions: Vec<DimensionOptions>,
}

/// The columns a chart shows on this pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleChoice {
    pub dimensions: Vec<String>,
    pub measure: String,
}

impl RoleChoice {
    pub fn dimension(&self) -> Option<&str> {
        self.dimensions.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    pub table: Table,
    pub roles: RoleChoice,
    pub summary: FilterSummary,
    pub options: FilterOptions,
}

/// Resolve which dimension(s) and measure the chart shows, applying defaults.
pub fn resolve_roles(chart: &Chart, selection: &ChartSelection) -> Result<RoleChoice, ChartError> {
    let declared_measure = |measure: &String| -> Result<String, ChartError> {
        if chart.measures.contains(measure) {
            Ok(measure.clone())
        } else {
            Err(ChartError::InvalidSelection {
                field: "measure".to_string(),
                value: measure.clone(),
            })
        }
    };
    let measure = match (&selection.measure, chart.measures.first()) {
        (Some(chosen), _) => declared_measure(chosen)?,
        (None, Some(first)) => first.clone(),
        (None, None) => return Err(missing_field(chart, "measure")),
    };

    let declared_dimension = |dimension: &String| -> Result<String, ChartError> {
        let is_declared = chart.dimensions.contains(dimension)
            || chart.main_dimension.as_ref() == Some(dimension);
        if is_declared {
            Ok(dimension.clone())
        } else {
            Err(ChartError::InvalidSelection {
                field: "dimension".to_string(),
                value: dimension.clone(),
            })
        }
    };

    let dimensions = match chart.kind {
        ChartType::VarianceComparison => Vec::new(),
        ChartType::SlicerChart => {
            let chosen = selection
                .dimensions
                .clone()
                .unwrap_or_else(|| chart.dimensions.clone());
            if chosen.is_empty() {
                return Err(ChartError::empty_selection("Dimensions"));
            }
            chosen
                .iter()
                .map(declared_dimension)
                .collect::<Result<Vec<_>, _>>()?
        }
        _ => {
            let chosen = selection
                .dimension
                .as_ref()
                .or(chart.main_dimension.as_ref())
                .or(chart.dimensions.first());
            match chosen {
                Some(dimension) => vec![declared_dimension(dimension)?],
                None => return Err(missing_field(chart, "dimension")),
            }
        }
    };

    Ok(RoleChoice {
        dimensions,
        measure,
    })
}

fn missing_field(chart: &Chart, field: &str) -> ChartError {
    ChartError::MissingField {
        chart_type: chart.kind.to_string(),
        field: field.to_string(),
    }
}

/// Apply the viewer's time and dimension filters to a copy of `dataset`.
///
/// `dataset` must already be calendar-derived when the chart declares a date field.
pub fn apply_filters(
    dataset: &Table,
    chart: &Chart,
    selection: &ChartSelection,
) -> Result<FilteredView, ChartError> {
    let roles = resolve_roles(chart, selection)?;
    let mut summary = FilterSummary::default();
    let mut options = FilterOptions::default();
    let mut table = dataset.clone();

    if chart.date_field().is_some() && chart.kind != ChartType::VarianceComparison {
        table = apply_time_filter(&table, &selection.filters, &mut summary, &mut options)?;
    }

    for dimension in &chart.dimensions {
        let index = table.require_column(dimension)?;
        let values: Vec<String> = table.distinct(index).iter().map(|v| v.to_string()).collect();
        options.dimensions.push(DimensionOptions {
            dimension: dimension.clone(),
            values: with_all(values),
        });

        match selection.filters.dimension_choice(dimension) {
            Choice::All => {}
            Choice::Only(chosen) if chosen.is_empty() => {
                return Err(ChartError::empty_selection(dimension.as_str()));
            }
            Choice::Only(chosen) => {
                table = table.retain_labels(index, &chosen);
                summary.values(format!("Filters for {}", dimension.to_uppercase()), &chosen);
            }
        }
    }

    Ok(FilteredView {
        table,
        roles,
        summary,
        options,
    })
}

fn apply_time_filter(
    table: &Table,
    filters: &FilterSelection,
    summary: &mut FilterSummary,
    options: &mut FilterOptions,
) -> Result<Table, ChartError> {
    let year_index = table.require_column(YEAR)?;
    let mut years: Vec<i64> = table.distinct(year_index).iter().filter_map(|v| v.as_i64()).collect();
    years.sort_unstable();
    options.years = with_all(years.iter().map(|y| y.to_string()).collect());

    let mut table = restrict(table, year_index, &filters.years, YEAR, "Selected Years", summary)?;

    match filters.granularity {
        TimeGranularity::Year => {}
        TimeGranularity::Month => {
            let name_index = table.require_column(MONTH_DISPLAY)?;
            let number_index = table.require_column(MONTH)?;
            let mut months: Vec<(i64, String)> = table
                .rows()
                .iter()
                .filter_map(|row| Some((row[number_index].as_i64()?, row[name_index].to_string())))
                .collect();
            months.sort();
            months.dedup();
            options.months = with_all(months.into_iter().map(|(_, name)| name).collect());

            table = restrict(&table, name_index, &filters.months, MONTH_DISPLAY, "Selected Months", summary)?;
        }
        TimeGranularity::Week => {
            let week_index = table.require_column(WEEK_YEAR)?;
            let mut weeks: Vec<String> = table.distinct(week_index).iter().map(|v| v.to_string()).collect();
            weeks.sort();
            options.weeks = with_all(weeks);

            table = restrict(&table, week_index, &filters.weeks, WEEK_YEAR, "Selected Weeks", summary)?;
        }
        TimeGranularity::Day => {
            let day_index = table.require_column(DAY)?;
            let days: Vec<NaiveDate> = table.column(day_index).filter_map(Value::as_date).collect();
            let bounds = days.iter().min().copied().zip(days.iter().max().copied());
            options.day_bounds = bounds;

            let range = match (filters.days.start, filters.days.end) {
                (Some(start), Some(end)) => Some((start, end)),
                (None, None) => bounds,
                _ => return Err(ChartError::IncompleteRange),
            };
            if let Some((start, end)) = range {
                summary.range("Selected Days", start, end);
                table = table.filter_rows(|row| {
                    row[day_index]
                        .as_date()
                        .is_some_and(|day| day >= start && day <= end)
                });
            }
        }
    }

    Ok(table)
}

/// Apply one multi-select axis, recording it in the summary when it restricts anything
fn restrict(
    table: &Table,
    index: usize,
    selected: &[String],
    column: &str,
    label: &str,
    summary: &mut FilterSummary,
) -> Result<Table, ChartError> {
    match Choice::from_selection(selected) {
        Choice::All => Ok(table.clone()),
        Choice::Only(chosen) if chosen.is_empty() => Err(ChartError::empty_selection(column)),
        Choice::Only(chosen) => {
            summary.values(label, &chosen);
            Ok(table.retain_labels(index, &chosen))
        }
    }
}

fn with_all(values: Vec<String>) -> Vec<String> {
    std::iter::once(ALL.to_string()).chain(values).collect()
}
