// Fixed page grid template: numbered rows of 1-3 slots, or a full-width row
use super::error::LayoutError;
use super::position::{PositionTag, MAX_COLUMNS};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub number: u32,
    pub slots: Vec<PositionTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTemplate {
    rows: Vec<GridRow>,
}

/// One slot of the template with whether a chart already claims it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    pub tag: String,
    pub row: u32,
    pub occupied: bool,
}

impl GridTemplate {
    /// The standard seven-row template
    pub fn standard() -> Self {
        let three = |row: u32| -> Vec<PositionTag> {
            (1..=3).map(|col| PositionTag::cell(row, col)).collect()
        };
        Self {
            rows: vec![
                GridRow { number: 1, slots: three(1) },
                GridRow { number: 2, slots: three(2) },
                GridRow { number: 3, slots: three(3) },
                GridRow { number: 4, slots: three(4) },
                GridRow {
                    number: 5,
                    slots: vec![PositionTag::cell(5, 1), PositionTag::cell(5, 2)],
                },
                GridRow {
                    number: 6,
                    slots: vec![PositionTag::full_row(6)],
                },
                GridRow { number: 7, slots: three(7) },
            ],
        }
    }

    /// Build a template from slot labels, one list per row
    pub fn from_labels(rows: &[Vec<String>]) -> Result<Self, LayoutError> {
        let mut parsed = Vec::with_capacity(rows.len());
        let mut seen_rows = HashSet::new();

        for labels in rows {
            let slots = labels
                .iter()
                .map(|label| PositionTag::parse(label))
                .collect::<Result<Vec<_>, _>>()?;

            let Some(first) = slots.first() else {
                return Err(LayoutError::malformed("", "grid row without slots"));
            };
            let number = first.row;
            if slots.len() > MAX_COLUMNS as usize || slots.iter().any(|s| s.row != number) {
                return Err(LayoutError::unsupported(
                    number,
                    "a grid row holds 1-3 slots of the same row number",
                ));
            }
            if slots.iter().any(PositionTag::is_full_row) && slots.len() > 1 {
                return Err(LayoutError::unsupported(
                    number,
                    "a full-width row has exactly one slot",
                ));
            }
            if !seen_rows.insert(number) {
                return Err(LayoutError::unsupported(number, "row declared twice in grid"));
            }
            parsed.push(GridRow { number, slots });
        }

        parsed.sort_by_key(|row| row.number);
        Ok(Self { rows: parsed })
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn contains(&self, tag: &PositionTag) -> bool {
        self.rows.iter().any(|row| row.slots.contains(tag))
    }

    pub fn availability(&self, occupied: &HashSet<PositionTag>) -> Vec<SlotAvailability> {
        self.rows
            .iter()
            .flat_map(|row| row.slots.iter())
            .map(|tag| SlotAvailability {
                tag: tag.to_string(),
                row: tag.row,
                occupied: occupied.contains(tag),
            })
            .collect()
    }
}

impl Default for GridTemplate {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_template_shape() {
        let grid = GridTemplate::standard();
        assert_eq!(grid.rows().len(), 7);
        assert_eq!(grid.rows()[4].slots.len(), 2);
        assert!(grid.contains(&PositionTag::full_row(6)));
        assert!(!grid.contains(&PositionTag::cell(6, 1)));
        assert!(!grid.contains(&PositionTag::cell(5, 3)));
    }

    #[test]
    fn test_from_labels() {
        let rows = vec![
            vec!["ROW2, COL1".to_string(), "ROW2, COL2".to_string()],
            vec!["FULL ROW 1".to_string()],
        ];
        let grid = GridTemplate::from_labels(&rows).unwrap();
        assert_eq!(grid.rows()[0].number, 1);
        assert!(grid.contains(&PositionTag::cell(2, 2)));
    }

    #[test]
    fn test_from_labels_rejects_mixed_rows() {
        let rows = vec![vec!["ROW1, COL1".to_string(), "ROW2, COL2".to_string()]];
        assert!(GridTemplate::from_labels(&rows).is_err());

        let rows = vec![vec!["ROW1, COL1".to_string()], vec!["ROW1, COL2".to_string()]];
        assert!(GridTemplate::from_labels(&rows).is_err());
    }

    #[test]
    fn test_availability_marks_occupied_slots() {
        let grid = GridTemplate::standard();
        let occupied = HashSet::from([PositionTag::cell(1, 2), PositionTag::full_row(6)]);
        let slots = grid.availability(&occupied);

        assert_eq!(slots.len(), 18);
        let taken: Vec<_> = slots.iter().filter(|s| s.occupied).map(|s| s.tag.as_str()).collect();
        assert_eq!(taken, vec!["ROW1, COL2", "FULL ROW 6"]);
    }
}
