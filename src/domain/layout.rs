// Page layout resolution: charts with sparse position tags -> ordered rows of weighted slots
//
// Rows are resolved heuristically from how many charts claim a row and whether a chart
// claims a wide (two-slot) placement. Widths are relative ratios; every resolved row
// spans the full page width.
use super::dashboard::Chart;
use super::error::LayoutError;
use super::position::PositionTag;
use serde::Serialize;
use std::collections::BTreeMap;

/// One rendered slot: its relative width and the chart placed in it, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub width: u8,
    pub chart_id: Option<String>,
}

impl Slot {
    fn filled(width: u8, chart_id: &str) -> Self {
        Self {
            width,
            chart_id: Some(chart_id.to_string()),
        }
    }

    fn empty(width: u8) -> Self {
        Self {
            width,
            chart_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRow {
    pub row: u32,
    pub slots: Vec<Slot>,
}

impl ResolvedRow {
    pub fn widths(&self) -> Vec<u8> {
        self.slots.iter().map(|s| s.width).collect()
    }

    pub fn chart_ids(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|s| s.chart_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PageLayout {
    pub rows: Vec<ResolvedRow>,
}

impl PageLayout {
    /// Chart ids top-to-bottom, left-to-right
    pub fn chart_order(&self) -> Vec<&str> {
        self.rows.iter().flat_map(ResolvedRow::chart_ids).collect()
    }
}

/// Where a chart sits within its row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Left,
    Center,
    Right,
    /// Spans left+center
    LeftWide,
    /// Spans center+right
    RightWide,
    FullWidth,
}

impl Placement {
    fn classify(tags: &[PositionTag]) -> Result<Self, LayoutError> {
        let row = tags.first().map(|t| t.row).unwrap_or_default();
        if tags.len() == 3 || tags.iter().any(PositionTag::is_full_row) {
            return Ok(Placement::FullWidth);
        }

        let mut columns: Vec<u8> = tags.iter().filter_map(|t| t.column).collect();
        columns.sort_unstable();
        match columns.as_slice() {
            [1] => Ok(Placement::Left),
            [2] => Ok(Placement::Center),
            [3] => Ok(Placement::Right),
            [1, 2] => Ok(Placement::LeftWide),
            [2, 3] => Ok(Placement::RightWide),
            _ => Err(LayoutError::unsupported(
                row,
                format!("columns {:?} do not form a contiguous span", columns),
            )),
        }
    }

    /// Left-to-right ordering of occupants within a row
    fn rank(self) -> u8 {
        match self {
            Placement::Left | Placement::LeftWide | Placement::FullWidth => 0,
            Placement::Center => 1,
            Placement::Right | Placement::RightWide => 2,
        }
    }
}

/// Per-row alignment bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RowFlags {
    align_left: bool,
    align_right: bool,
    left_priority: bool,
    right_priority: bool,
    full_width: bool,
}

impl RowFlags {
    fn mark(&mut self, placement: Placement) {
        match placement {
            Placement::Left => self.align_left = true,
            Placement::Right => self.align_right = true,
            Placement::LeftWide => {
                self.align_left = true;
                self.left_priority = true;
            }
            Placement::RightWide => {
                self.align_right = true;
                self.right_priority = true;
            }
            Placement::FullWidth => self.full_width = true,
            Placement::Center => {}
        }
    }
}

#[derive(Debug, Clone)]
struct Occupant<'a> {
    chart_id: &'a str,
    placement: Placement,
}

/// Resolve every chart of a page into rows of weighted slots, sorted by row number.
pub fn resolve_layout(charts: &[Chart]) -> Result<PageLayout, LayoutError> {
    let mut placed = Vec::with_capacity(charts.len());
    for chart in charts {
        let tags = chart.position.parse()?;
        let placement = Placement::classify(&tags)?;
        placed.push((tags[0].row, chart.id.as_str(), placement));
    }
    placed.sort_by_key(|(row, _, _)| *row);

    let mut occupants: BTreeMap<u32, Vec<Occupant>> = BTreeMap::new();
    let mut flags: BTreeMap<u32, RowFlags> = BTreeMap::new();
    for (row, chart_id, placement) in placed {
        flags.entry(row).or_default().mark(placement);
        occupants
            .entry(row)
            .or_default()
            .push(Occupant { chart_id, placement });
    }

    let mut rows = Vec::with_capacity(occupants.len());
    for (row, mut members) in occupants {
        members.sort_by_key(|o| o.placement.rank());
        let row_flags = flags.get(&row).copied().unwrap_or_default();
        rows.push(ResolvedRow {
            row,
            slots: resolve_row(row, &members, row_flags)?,
        });
    }

    Ok(PageLayout { rows })
}

fn resolve_row(row: u32, members: &[Occupant], flags: RowFlags) -> Result<Vec<Slot>, LayoutError> {
    let RowFlags {
        align_left,
        align_right,
        left_priority,
        right_priority,
        full_width,
    } = flags;

    if full_width {
        return match members {
            [only] => Ok(vec![Slot::filled(1, only.chart_id)]),
            _ => Err(LayoutError::unsupported(
                row,
                "a full-width chart cannot share its row",
            )),
        };
    }

    let slots = match members {
        [only] => {
            let id = only.chart_id;
            if left_priority {
                vec![Slot::filled(2, id), Slot::empty(1)]
            } else if right_priority {
                vec![Slot::empty(1), Slot::filled(2, id)]
            } else if align_left {
                vec![Slot::filled(1, id), Slot::empty(1), Slot::empty(1)]
            } else if align_right {
                vec![Slot::empty(1), Slot::empty(1), Slot::filled(1, id)]
            } else {
                vec![Slot::empty(1), Slot::filled(1, id), Slot::empty(1)]
            }
        }
        [first, second] => {
            let (a, b) = (first.chart_id, second.chart_id);
            match (align_left, align_right, left_priority, right_priority) {
                (false, false, _, _) => vec![Slot::filled(1, a), Slot::filled(1, b)],
                (true, true, false, false) => {
                    vec![Slot::filled(1, a), Slot::empty(1), Slot::filled(1, b)]
                }
                (true, true, true, false) => vec![Slot::filled(2, a), Slot::filled(1, b)],
                (true, true, false, true) => vec![Slot::filled(1, a), Slot::filled(2, b)],
                (true, false, false, _) => vec![Slot::filled(1, a), Slot::filled(1, b)],
                // Center plus right leans toward the right side
                (false, true, _, false) => vec![Slot::filled(1, a), Slot::filled(2, b)],
                _ => {
                    return Err(LayoutError::unsupported(
                        row,
                        "a wide chart overlaps another chart on its row",
                    ));
                }
            }
        }
        [left, center, right] => {
            let one_per_slot = left.placement == Placement::Left
                && center.placement == Placement::Center
                && right.placement == Placement::Right;
            if !one_per_slot {
                return Err(LayoutError::unsupported(
                    row,
                    "three charts must take the left, center and right slots",
                ));
            }
            vec![
                Slot::filled(1, left.chart_id),
                Slot::filled(1, center.chart_id),
                Slot::filled(1, right.chart_id),
            ]
        }
        _ => {
            return Err(LayoutError::unsupported(
                row,
                format!("{} charts do not fit in one row", members.len()),
            ));
        }
    };

    Ok(slots)
}
