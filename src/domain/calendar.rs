// Calendar attributes derived from a date column
use super::error::ChartError;
use super::table::{Table, Value};
use chrono::{Datelike, NaiveDate};

pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const WEEK: &str = "Week";
pub const DAY: &str = "Day";
pub const WEEK_DISPLAY: &str = "Week_Display";
pub const MONTH_DISPLAY: &str = "Month_Display";
pub const MONTH_YEAR: &str = "Month_Year";
pub const WEEK_YEAR: &str = "Week_Year";

/// Coerce `date_column` to dates in place and add the derived calendar columns.
///
/// Values that are not dates become `Missing`, as do all of their derived attributes.
/// Running this twice yields the same table.
pub fn derive_calendar(table: &mut Table, date_column: &str) -> Result<(), ChartError> {
    let index = table.require_column(date_column)?;

    let coerced: Vec<Value> = table.column(index).map(coerce_date).collect();
    let dates: Vec<Option<NaiveDate>> = coerced.iter().map(Value::as_date).collect();
    table.set_column(date_column, coerced);

    let derive = |f: &dyn Fn(NaiveDate) -> Value| -> Vec<Value> {
        dates
            .iter()
            .map(|d| d.map(f).unwrap_or(Value::Missing))
            .collect()
    };

    table.set_column(YEAR, derive(&|d| Value::Integer(d.year() as i64)));
    table.set_column(MONTH, derive(&|d| Value::Integer(d.month() as i64)));
    table.set_column(WEEK, derive(&|d| Value::Integer(d.iso_week().week() as i64)));
    table.set_column(DAY, derive(&Value::Date));
    table.set_column(WEEK_DISPLAY, derive(&|d| formatted(d, "%A, %Y, %b")));
    table.set_column(MONTH_DISPLAY, derive(&|d| formatted(d, "%b")));
    table.set_column(MONTH_YEAR, derive(&|d| formatted(d, "%b, %Y")));
    table.set_column(WEEK_YEAR, derive(&|d| formatted(d, "%Y-W%U")));

    Ok(())
}

fn coerce_date(value: &Value) -> Value {
    match value {
        Value::Date(_) | Value::DateTime(_) => value.clone(),
        Value::Text(raw) => Value::parse_temporal(raw).unwrap_or(Value::Missing),
        _ => Value::Missing,
    }
}

fn formatted(date: NaiveDate, pattern: &str) -> Value {
    Value::Text(date.format(pattern).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(raw: &[&str]) -> Table {
        Table::from_rows(
            vec!["Date".to_string(), "Sales".to_string()],
            raw.iter()
                .map(|d| vec![Value::text(*d), Value::Integer(1)])
                .collect(),
        )
    }

    fn column<'a>(table: &'a Table, name: &str) -> Vec<&'a Value> {
        let index = table.column_index(name).unwrap();
        table.column(index).collect()
    }

    #[test]
    fn test_derives_calendar_attributes() {
        let mut table = dated(&["2022-01-03"]);
        derive_calendar(&mut table, "Date").unwrap();

        assert_eq!(column(&table, YEAR), vec![&Value::Integer(2022)]);
        assert_eq!(column(&table, MONTH), vec![&Value::Integer(1)]);
        assert_eq!(column(&table, WEEK), vec![&Value::Integer(1)]);
        assert_eq!(
            column(&table, DAY),
            vec![&Value::Date(NaiveDate::from_ymd_opt(2022, 1, 3).unwrap())]
        );
        assert_eq!(column(&table, WEEK_DISPLAY), vec![&Value::text("Monday, 2022, Jan")]);
        assert_eq!(column(&table, MONTH_DISPLAY), vec![&Value::text("Jan")]);
        assert_eq!(column(&table, MONTH_YEAR), vec![&Value::text("Jan, 2022")]);
        assert_eq!(column(&table, WEEK_YEAR), vec![&Value::text("2022-W01")]);
    }

    #[test]
    fn test_invalid_dates_become_missing() {
        let mut table = dated(&["garbage", "2021-12-31"]);
        derive_calendar(&mut table, "Date").unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(column(&table, "Date")[0], &Value::Missing);
        assert_eq!(column(&table, YEAR), vec![&Value::Missing, &Value::Integer(2021)]);
        assert_eq!(column(&table, WEEK_YEAR)[0], &Value::Missing);
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let mut once = dated(&["2022-05-17", "2023-11-02", "n/a"]);
        derive_calendar(&mut once, "Date").unwrap();
        let mut twice = once.clone();
        derive_calendar(&mut twice, "Date").unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.columns().len(), 10);
    }

    #[test]
    fn test_missing_date_column() {
        let mut table = dated(&["2022-01-01"]);
        let err = derive_calendar(&mut table, "Shipped").unwrap_err();
        assert_eq!(err, ChartError::unknown_column("Shipped"));
    }
}
