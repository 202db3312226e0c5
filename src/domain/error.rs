// Domain error taxonomy, grouped by how far a failure propagates
use thiserror::Error;

/// Errors that abort layout resolution for a whole page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("malformed position tag '{tag}': {reason}")]
    MalformedPosition { tag: String, reason: String },

    #[error("unsupported layout on row {row}: {reason}")]
    UnsupportedLayout { row: u32, reason: String },
}

impl LayoutError {
    pub fn malformed(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPosition {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(row: u32, reason: impl Into<String>) -> Self {
        Self::UnsupportedLayout {
            row,
            reason: reason.into(),
        }
    }
}

/// Errors that abort rendering of a single chart. Sibling charts keep rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("incomplete date range: select both a start and an end day")]
    IncompleteRange,

    #[error("prior year {prior_year} must be less than this year {this_year}")]
    InvalidYearRange { prior_year: i64, this_year: i64 },

    #[error("select at least one filter for '{column}'")]
    EmptyFilterSelection { column: String },

    #[error("data file '{path}' could not be read: {reason}")]
    MissingDataFile { path: String, reason: String },

    #[error("column '{column}' does not exist in the dataset")]
    UnknownColumn { column: String },

    #[error("'{value}' is not a configured {field} of this chart")]
    InvalidSelection { field: String, value: String },

    #[error("{chart_type} requires at least one {field}")]
    MissingField { chart_type: String, field: String },

    #[error("unsupported chart type '{0}'")]
    UnsupportedChartType(String),

    #[error("the dataset has fewer than two years to compare")]
    NoComparableYears,
}

impl ChartError {
    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }

    pub fn empty_selection(column: impl Into<String>) -> Self {
        Self::EmptyFilterSelection {
            column: column.into(),
        }
    }

    /// Stable identifier for clients that branch on the failure kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::IncompleteRange => "incomplete_range",
            Self::InvalidYearRange { .. } => "invalid_year_range",
            Self::EmptyFilterSelection { .. } => "empty_filter_selection",
            Self::MissingDataFile { .. } => "missing_data_file",
            Self::UnknownColumn { .. } => "unknown_column",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::MissingField { .. } => "missing_field",
            Self::UnsupportedChartType(_) => "unsupported_chart_type",
            Self::NoComparableYears => "no_comparable_years",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_error_display() {
        let err = LayoutError::malformed("ROW, COL", "no numeric groups");
        assert_eq!(
            err.to_string(),
            "malformed position tag 'ROW, COL': no numeric groups"
        );

        let err = LayoutError::unsupported(4, "four charts on one row");
        assert!(err.to_string().contains("row 4"));
    }

    #[test]
    fn test_chart_error_codes() {
        assert_eq!(ChartError::IncompleteRange.code(), "incomplete_range");
        assert_eq!(
            ChartError::InvalidYearRange {
                prior_year: 2023,
                this_year: 2022
            }
            .code(),
            "invalid_year_range"
        );
        assert_eq!(ChartError::empty_selection("Region").code(), "empty_filter_selection");
    }
}
