// Aggregation engine: per-chart-type grouping and summing of a filtered table
use super::calendar::YEAR;
use super::error::ChartError;
use super::table::{Table, Value};
use serde::Serialize;
use std::collections::HashMap;

/// How a chart type reduces its filtered rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationRule {
    /// One dimension, summed measure, largest first
    SumByDimension { dimension: String },
    /// Several dimensions, summed measure, natural group order
    SliceByDimensions { dimensions: Vec<String> },
    /// Two scalar sums for a prior and a current year
    YearOverYear { prior_year: i64, this_year: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceSummary {
    pub prior_year: i64,
    pub this_year: i64,
    pub prior_total: f64,
    pub this_total: f64,
    pub variance: f64,
    /// Absent when the prior total is zero
    pub variance_percentage: Option<f64>,
}

impl VarianceSummary {
    pub fn new(prior_year: i64, this_year: i64, prior_total: f64, this_total: f64) -> Self {
        let variance = this_total - prior_total;
        let variance_percentage = (prior_total != 0.0).then(|| variance / prior_total * 100.0);
        Self {
            prior_year,
            this_year,
            prior_total,
            this_total,
            variance,
            variance_percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    Table { table: Table },
    Variance { summary: VarianceSummary },
}

pub fn aggregate(table: &Table, rule: &AggregationRule, measure: &str) -> Result<Aggregation, ChartError> {
    match rule {
        AggregationRule::SumByDimension { dimension } => Ok(Aggregation::Table {
            table: sum_by_dimension(table, dimension, measure)?,
        }),
        AggregationRule::SliceByDimensions { dimensions } => Ok(Aggregation::Table {
            table: group_sum(table, dimensions, measure)?,
        }),
        AggregationRule::YearOverYear {
            prior_year,
            this_year,
        } => Ok(Aggregation::Variance {
            summary: year_over_year(table, measure, *prior_year, *this_year)?,
        }),
    }
}

/// Sum `measure` per value of `dimension`, sorted by descending sum. Ties keep group order.
pub fn sum_by_dimension(table: &Table, dimension: &str, measure: &str) -> Result<Table, ChartError> {
    let grouped = group_sum(table, &[dimension.to_string()], measure)?;
    let (columns, mut rows) = (grouped.columns().to_vec(), grouped.rows().to_vec());
    let total = |row: &Vec<Value>| row.last().and_then(Value::as_f64).unwrap_or_default();
    rows.sort_by(|a, b| total(b).total_cmp(&total(a)));
    Ok(Table::from_rows(columns, rows))
}

/// Sum `measure` per distinct combination of `dimensions`, in first-appearance order.
///
/// Rows with a missing key or a non-numeric measure do not contribute.
pub fn group_sum(table: &Table, dimensions: &[String], measure: &str) -> Result<Table, ChartError> {
    let key_indexes = dimensions
        .iter()
        .map(|d| table.require_column(d))
        .collect::<Result<Vec<_>, _>>()?;
    let measure_index = table.require_column(measure)?;

    let mut positions: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, f64)> = Vec::new();

    for row in table.rows() {
        if key_indexes.iter().any(|&i| row[i].is_missing()) {
            continue;
        }
        let label: Vec<String> = key_indexes.iter().map(|&i| row[i].to_string()).collect();
        let slot = *positions.entry(label).or_insert_with(|| {
            groups.push((key_indexes.iter().map(|&i| row[i].clone()).collect(), 0.0));
            groups.len() - 1
        });
        if let Some(amount) = row[measure_index].as_f64() {
            groups[slot].1 += amount;
        }
    }

    let mut columns = dimensions.to_vec();
    columns.push(measure.to_string());
    let rows = groups
        .into_iter()
        .map(|(mut keys, sum)| {
            keys.push(Value::Number(sum));
            keys
        })
        .collect();
    Ok(Table::from_rows(columns, rows))
}

/// Compare the measure total of two years. The prior year must come first.
pub fn year_over_year(
    table: &Table,
    measure: &str,
    prior_year: i64,
    this_year: i64,
) -> Result<VarianceSummary, ChartError> {
    if prior_year >= this_year {
        return Err(ChartError::InvalidYearRange {
            prior_year,
            this_year,
        });
    }
    let year_index = table.require_column(YEAR)?;
    let measure_index = table.require_column(measure)?;

    let total_for = |year: i64| -> f64 {
        table
            .rows()
            .iter()
            .filter(|row| row[year_index].as_i64() == Some(year))
            .filter_map(|row| row[measure_index].as_f64())
            .sum()
    };

    Ok(VarianceSummary::new(
        prior_year,
        this_year,
        total_for(prior_year),
        total_for(this_year),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str, f64)]) -> Table {
        Table::from_rows(
            vec!["Region".to_string(), "Product".to_string(), "Sales".to_string()],
            rows.iter()
                .map(|(r, p, s)| vec![Value::text(*r), Value::text(*p), Value::Number(*s)])
                .collect(),
        )
    }

    fn yearly(rows: &[(i64, f64)]) -> Table {
        Table::from_rows(
            vec![YEAR.to_string(), "Sales".to_string()],
            rows.iter()
                .map(|(y, s)| vec![Value::Integer(*y), Value::Number(*s)])
                .collect(),
        )
    }

    fn pairs(table: &Table) -> Vec<(String, String)> {
        table
            .rows()
            .iter()
            .map(|r| (r[0].to_string(), r[r.len() - 1].to_string()))
            .collect()
    }

    #[test]
    fn test_sum_by_dimension_sorts_descending() {
        let data = table(&[("A", "x", 10.0), ("B", "x", 30.0), ("A", "y", 5.0)]);
        let result = sum_by_dimension(&data, "Region", "Sales").unwrap();

        assert_eq!(result.columns(), &["Region".to_string(), "Sales".to_string()]);
        assert_eq!(
            pairs(&result),
            vec![("B".to_string(), "30".to_string()), ("A".to_string(), "15".to_string())]
        );
    }

    #[test]
    fn test_sum_by_dimension_ties_keep_group_order() {
        let data = table(&[("C", "x", 5.0), ("A", "x", 5.0), ("B", "x", 9.0)]);
        let result = sum_by_dimension(&data, "Region", "Sales").unwrap();
        let order: Vec<String> = pairs(&result).into_iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_group_sum_preserves_natural_order() {
        let data = table(&[
            ("West", "Gadget", 1.0),
            ("East", "Widget", 2.0),
            ("West", "Gadget", 3.0),
            ("East", "Gadget", 4.0),
        ]);
        let dims = vec!["Region".to_string(), "Product".to_string()];
        let result = group_sum(&data, &dims, "Sales").unwrap();

        let rows: Vec<Vec<String>> = result
            .rows()
            .iter()
            .map(|r| r.iter().map(|v| v.to_string()).collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["West", "Gadget", "4"],
                vec!["East", "Widget", "2"],
                vec!["East", "Gadget", "4"],
            ]
        );
    }

    #[test]
    fn test_group_sum_skips_missing_keys() {
        let mut data = table(&[("A", "x", 1.0)]);
        data.push_row(vec![Value::Missing, Value::text("x"), Value::Number(9.0)]);
        let result = sum_by_dimension(&data, "Region", "Sales").unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_unknown_measure() {
        let data = table(&[("A", "x", 1.0)]);
        let err = sum_by_dimension(&data, "Region", "Profit").unwrap_err();
        assert_eq!(err, ChartError::unknown_column("Profit"));
    }

    #[test]
    fn test_year_over_year_variance() {
        let data = yearly(&[(2021, 50.0), (2022, 100.0), (2021, 30.0), (2020, 7.0)]);
        let summary = year_over_year(&data, "Sales", 2021, 2022).unwrap();

        assert_eq!(summary.prior_total, 80.0);
        assert_eq!(summary.this_total, 100.0);
        assert_eq!(summary.variance, 20.0);
        assert_eq!(summary.variance_percentage, Some(25.0));
    }

    #[test]
    fn test_year_over_year_rejects_inverted_range() {
        let data = yearly(&[(2022, 1.0)]);
        let err = year_over_year(&data, "Sales", 2023, 2022).unwrap_err();
        assert_eq!(
            err,
            ChartError::InvalidYearRange {
                prior_year: 2023,
                this_year: 2022
            }
        );
        assert!(year_over_year(&data, "Sales", 2022, 2022).is_err());
    }

    #[test]
    fn test_year_over_year_zero_prior_total() {
        let data = yearly(&[(2022, 10.0)]);
        let summary = year_over_year(&data, "Sales", 2021, 2022).unwrap();
        assert_eq!(summary.variance, 10.0);
        assert_eq!(summary.variance_percentage, None);
    }

    #[test]
    fn test_aggregate_dispatches_rule() {
        let data = table(&[("A", "x", 1.0)]);
        let rule = AggregationRule::SumByDimension {
            dimension: "Region".to_string(),
        };
        assert!(matches!(
            aggregate(&data, &rule, "Sales").unwrap(),
            Aggregation::Table { .. }
        ));
    }
}
