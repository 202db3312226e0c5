// CSV reader: header row plus cells typed per column
use crate::domain::table::{Table, Value};
use anyhow::Context;
use std::path::Path;

/// The narrowest type every non-empty cell of a column parses as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Number,
    Temporal,
    Text,
}

pub fn read_csv(path: &Path) -> anyhow::Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut raw_rows = Vec::new();
    for record in reader.records() {
        raw_rows.push(record?.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|index| infer_kind(raw_rows.iter().filter_map(|row| row.get(index))))
        .collect();
    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(&kinds)
                .map(|(cell, kind)| typed_cell(cell, *kind))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(columns, rows))
}

/// Dates are only recognised when they make up the column from its first cell
fn infer_kind<'a>(cells: impl Iterator<Item = &'a String>) -> ColumnKind {
    let mut kind = None;
    for cell in cells.filter(|c| !c.is_empty()) {
        let next = match kind {
            None | Some(ColumnKind::Integer) if cell.parse::<i64>().is_ok() => ColumnKind::Integer,
            None | Some(ColumnKind::Integer | ColumnKind::Number) if cell.parse::<f64>().is_ok() => {
                ColumnKind::Number
            }
            None | Some(ColumnKind::Temporal) if Value::parse_temporal(cell).is_some() => {
                ColumnKind::Temporal
            }
            _ => return ColumnKind::Text,
        };
        kind = Some(next);
    }
    kind.unwrap_or(ColumnKind::Text)
}

fn typed_cell(cell: &str, kind: ColumnKind) -> Value {
    if cell.is_empty() {
        return Value::Missing;
    }
    let parsed = match kind {
        ColumnKind::Integer => cell.parse().ok().map(Value::Integer),
        ColumnKind::Number => cell.parse().ok().map(Value::Number),
        ColumnKind::Temporal => Value::parse_temporal(cell),
        ColumnKind::Text => None,
    };
    parsed.unwrap_or_else(|| Value::text(cell))
}
