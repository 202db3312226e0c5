// Chart dispatcher - routes a chart through load -> filter -> aggregate -> encode by its type
use crate::application::dataset_cache::DatasetCache;
use crate::domain::aggregation::{aggregate, Aggregation, AggregationRule};
use crate::domain::calendar::{DAY, MONTH_DISPLAY, WEEK_YEAR, YEAR};
use crate::domain::dashboard::{Chart, ChartType};
use crate::domain::encoding::{ChartFrame, Encoding, LocationMode, Mark, Orientation};
use crate::domain::error::ChartError;
use crate::domain::filter::{apply_filters, FilteredView};
use crate::domain::selection::{ChartSelection, TimeGranularity};
use crate::domain::table::Table;

/// How one chart type turns its filtered view into an aggregation and an encoding
struct Plan {
    mark: Mark,
    rule: AggregationRule,
    encoding: Encoding,
}

/// Run the full data pipeline for one chart.
///
/// An unrecognised chart type fails before any data is loaded.
pub fn render_chart(
    chart: &Chart,
    selection: &ChartSelection,
    datasets: &mut DatasetCache<'_>,
) -> Result<ChartFrame, ChartError> {
    if let ChartType::Unsupported(name) = &chart.kind {
        return Err(ChartError::UnsupportedChartType(name.clone()));
    }

    let dataset = datasets.get(&chart.file_path, chart.date_field())?;
    let view = apply_filters(&dataset, chart, selection)?;

    let plan = match &chart.kind {
        ChartType::BarChart => axis_plan(Mark::Bar, chart, &view, chart.invert)?,
        ChartType::LineChart => axis_plan(Mark::Line, chart, &view, chart.invert)?,
        ChartType::PieChart => axis_plan(Mark::Pie, chart, &view, false)?,
        ChartType::ScatterPlot => axis_plan(Mark::Scatter, chart, &view, false)?,
        ChartType::ChoroplethMap => axis_plan(Mark::Choropleth, chart, &view, false)?,
        ChartType::SlicerChart => slicer_plan(chart, selection, &view),
        ChartType::VarianceComparison => variance_plan(selection, &view)?,
        ChartType::Unsupported(name) => return Err(ChartError::UnsupportedChartType(name.clone())),
    };

    let data = aggregate(&view.table, &plan.rule, &view.roles.measure)?;
    let mut encoding = plan.encoding;

    if plan.mark == Mark::Choropleth {
        if let Aggregation::Table { table } = &data {
            let mode = LocationMode::detect(table.column(0));
            encoding.location_mode = Some(mode);
            encoding.scope = Some(mode.scope());
        }
    }
    encoding.annotation = annotation(&data, &view);

    Ok(ChartFrame {
        chart_id: chart.id.clone(),
        title: chart.name.clone(),
        chart_type: chart.kind.clone(),
        mark: plan.mark,
        encoding,
        data,
        filters: view.summary,
        options: view.options,
    })
}

/// Dimension on x, summed measure on y, largest first
fn axis_plan(mark: Mark, chart: &Chart, view: &FilteredView, invert: bool) -> Result<Plan, ChartError> {
    let dimension = view
        .roles
        .dimension()
        .map(str::to_string)
        .ok_or_else(|| ChartError::MissingField {
            chart_type: chart.kind.to_string(),
            field: "dimension".to_string(),
        })?;
    let encoding = Encoding::axes(&dimension, &view.roles.measure);
    Ok(Plan {
        mark,
        rule: AggregationRule::SumByDimension { dimension },
        encoding: if invert { encoding.inverted() } else { encoding },
    })
}

fn slicer_plan(chart: &Chart, selection: &ChartSelection, view: &FilteredView) -> Plan {
    let mut dimensions = Vec::new();
    if chart.display_filters && chart.date_field().is_some() {
        dimensions.extend(filter_columns(selection.filters.granularity).iter().map(|c| c.to_string()));
    }
    dimensions.extend(view.roles.dimensions.iter().cloned());

    Plan {
        mark: Mark::Table,
        rule: AggregationRule::SliceByDimensions { dimensions },
        encoding: Encoding::default(),
    }
}

/// Calendar columns shown ahead of the dimensions when a slicer displays its filters
fn filter_columns(granularity: TimeGranularity) -> &'static [&'static str] {
    match granularity {
        TimeGranularity::Year => &[YEAR],
        TimeGranularity::Month => &[YEAR, MONTH_DISPLAY],
        TimeGranularity::Week => &[WEEK_YEAR],
        TimeGranularity::Day => &[DAY],
    }
}

fn variance_plan(selection: &ChartSelection, view: &FilteredView) -> Result<Plan, ChartError> {
    let (prior_year, this_year) = comparison_years(selection, &view.table)?;
    let measure = view.roles.measure.clone();
    Ok(Plan {
        mark: Mark::VarianceBars,
        rule: AggregationRule::YearOverYear {
            prior_year,
            this_year,
        },
        encoding: Encoding {
            x: Some(measure.clone()),
            x_title: Some(measure),
            orientation: Orientation::Horizontal,
            ..Encoding::default()
        },
    })
}

/// Explicit years win; otherwise the two latest years in the data
fn comparison_years(selection: &ChartSelection, table: &Table) -> Result<(i64, i64), ChartError> {
    if let (Some(prior), Some(this)) = (selection.prior_year, selection.this_year) {
        return Ok((prior, this));
    }

    let year_index = table.require_column(YEAR)?;
    let mut years: Vec<i64> = table.distinct(year_index).iter().filter_map(|v| v.as_i64()).collect();
    years.sort_unstable();
    let (default_prior, default_this) = match years.as_slice() {
        [.., prior, this] => (*prior, *this),
        _ => return Err(ChartError::NoComparableYears),
    };

    Ok((
        selection.prior_year.unwrap_or(default_prior),
        selection.this_year.unwrap_or(default_this),
    ))
}

fn annotation(data: &Aggregation, view: &FilteredView) -> String {
    let filters = view.summary.to_string();
    match data {
        Aggregation::Variance { summary } => {
            let years = format!("Prior Year: {} | This Year: {}", summary.prior_year, summary.this_year);
            if filters.is_empty() {
                years
            } else {
                format!("{}\n{}", years, filters)
            }
        }
        Aggregation::Table { .. } => filters,
    }
}
