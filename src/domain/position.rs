// Position tags: "ROW<n>, COL<m>" cells and "FULL ROW <n>" rows on the page grid
use super::error::LayoutError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static NUMERIC_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("numeric group pattern is valid"));

const FULL_ROW_MARKER: &str = "FULL";
pub const MAX_COLUMNS: u8 = 3;

/// A parsed grid coordinate. `column` is `None` for a full-width row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionTag {
    pub row: u32,
    pub column: Option<u8>,
}

impl PositionTag {
    pub fn cell(row: u32, column: u8) -> Self {
        Self {
            row,
            column: Some(column),
        }
    }

    pub fn full_row(row: u32) -> Self {
        Self { row, column: None }
    }

    pub fn is_full_row(&self) -> bool {
        self.column.is_none()
    }

    /// Parse a raw tag. The first numeric group is the row, the second the column.
    pub fn parse(raw: &str) -> Result<Self, LayoutError> {
        let numbers = NUMERIC_GROUP
            .find_iter(raw)
            .map(|m| {
                m.as_str()
                    .parse::<u32>()
                    .map_err(|_| LayoutError::malformed(raw, "number out of range"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let Some(&row) = numbers.first() else {
            return Err(LayoutError::malformed(raw, "no numeric groups found"));
        };
        if row == 0 {
            return Err(LayoutError::malformed(raw, "row numbers start at 1"));
        }

        if raw.to_ascii_uppercase().contains(FULL_ROW_MARKER) {
            return Ok(Self::full_row(row));
        }

        let column = match numbers.get(1) {
            Some(&column) if (1..=MAX_COLUMNS as u32).contains(&column) => column as u8,
            Some(&column) => {
                return Err(LayoutError::malformed(
                    raw,
                    format!("column {} is outside 1..={}", column, MAX_COLUMNS),
                ));
            }
            None => return Err(LayoutError::malformed(raw, "missing column number")),
        };

        Ok(Self::cell(row, column))
    }
}

impl FromStr for PositionTag {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PositionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "ROW{}, COL{}", self.row, column),
            None => write!(f, "FULL ROW {}", self.row),
        }
    }
}

/// Parse every tag a chart declares and check they describe one row.
pub fn parse_chart_tags<'a, I>(raw_tags: I) -> Result<Vec<PositionTag>, LayoutError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tags = Vec::new();
    let mut raw_seen = Vec::new();
    for raw in raw_tags {
        tags.push(PositionTag::parse(raw)?);
        raw_seen.push(raw);
    }

    let joined = raw_seen.join(" | ");
    let Some(first) = tags.first() else {
        return Err(LayoutError::malformed(joined, "chart declares no position"));
    };
    if tags.len() > MAX_COLUMNS as usize {
        return Err(LayoutError::malformed(
            joined,
            format!("a chart spans at most {} slots", MAX_COLUMNS),
        ));
    }
    if tags.iter().any(|t| t.row != first.row) {
        return Err(LayoutError::malformed(
            joined,
            "all tags of a chart must share the same row",
        ));
    }
    let mut columns: Vec<_> = tags.iter().map(|t| t.column).collect();
    columns.sort();
    columns.dedup();
    if columns.len() != tags.len() {
        return Err(LayoutError::malformed(joined, "duplicate slot in chart position"));
    }

    Ok(tags)
}
