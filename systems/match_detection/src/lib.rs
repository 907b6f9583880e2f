#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that finds runs of three or more identical colors.
//!
//! Rows are scanned left to right and columns top to bottom. Each run of
//! length four asks for a striped tile, each run of five or more asks for a
//! color bomb, and a horizontal and vertical four-run crossing at one cell
//! merge into a single wrapped tile.

use std::collections::BTreeMap;

use candy_match_core::{CandyColor, CellCoord, Grid, SpecialKind, SpecialSpawn};

/// Shortest run that counts as a match.
pub const MIN_RUN_LENGTH: u32 = 3;

const STRIPED_RUN_LENGTH: u32 = 4;
const COLOR_BOMB_RUN_LENGTH: u32 = 5;

/// Orientation of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Run along a row.
    Horizontal,
    /// Run along a column.
    Vertical,
}

/// Maximal line of identical colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatchRun {
    /// Orientation of the run.
    pub axis: Axis,
    /// Leftmost or topmost cell of the run.
    pub start: CellCoord,
    /// Number of cells in the run.
    pub length: u32,
    /// Shared color of the run.
    pub color: CandyColor,
}

impl MatchRun {
    /// Cell at the provided offset from the start of the run.
    #[must_use]
    pub fn cell_at(&self, offset: u32) -> CellCoord {
        match self.axis {
            Axis::Horizontal => CellCoord::new(self.start.column() + offset, self.start.row()),
            Axis::Vertical => CellCoord::new(self.start.column(), self.start.row() + offset),
        }
    }

    /// Cells covered by the run, from the start onward.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.length).map(move |offset| self.cell_at(offset))
    }

    /// Reports whether the run covers the cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        match self.axis {
            Axis::Horizontal => {
                cell.row() == self.start.row()
                    && cell.column() >= self.start.column()
                    && cell.column() < self.start.column() + self.length
            }
            Axis::Vertical => {
                cell.column() == self.start.column()
                    && cell.row() >= self.start.row()
                    && cell.row() < self.start.row() + self.length
            }
        }
    }

    fn striped_kind(&self) -> SpecialKind {
        match self.axis {
            Axis::Horizontal => SpecialKind::StripedHorizontal,
            Axis::Vertical => SpecialKind::StripedVertical,
        }
    }
}

/// Matched cells and the special tiles they produce.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchReport {
    runs: Vec<MatchRun>,
    matched: Vec<CellCoord>,
    spawns: Vec<SpecialSpawn>,
}

impl MatchReport {
    /// Reports whether no run was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Runs in scan order: rows first, then columns.
    #[must_use]
    pub fn runs(&self) -> &[MatchRun] {
        &self.runs
    }

    /// Distinct matched cells in row-major order.
    #[must_use]
    pub fn matched(&self) -> &[CellCoord] {
        &self.matched
    }

    /// Special tiles to create, one per cell, in row-major order.
    #[must_use]
    pub fn spawns(&self) -> &[SpecialSpawn] {
        &self.spawns
    }

    /// Consumes the report, yielding the matched cells and spawns.
    #[must_use]
    pub fn into_parts(self) -> (Vec<CellCoord>, Vec<SpecialSpawn>) {
        (self.matched, self.spawns)
    }
}

/// Finds every run on the board and the special tiles they produce.
#[must_use]
pub fn detect_matches(grid: &Grid) -> MatchReport {
    let mut runs = Vec::new();
    for row in 0..grid.rows() {
        collect_runs(grid, grid.row_cells(row), Axis::Horizontal, &mut runs);
    }
    for column in 0..grid.columns() {
        collect_runs(grid, grid.column_cells(column), Axis::Vertical, &mut runs);
    }

    if runs.is_empty() {
        return MatchReport::default();
    }

    let mut marked = vec![false; grid.cells().count()];
    for run in &runs {
        for cell in run.cells() {
            if let Some(index) = grid.index(cell) {
                marked[index] = true;
            }
        }
    }
    let matched = grid
        .cells()
        .filter(|cell| grid.index(*cell).map_or(false, |index| marked[index]))
        .collect();
    let spawns = resolve_spawns(&runs);

    MatchReport {
        runs,
        matched,
        spawns,
    }
}

/// Reports whether the board contains at least one run.
#[must_use]
pub fn has_match(grid: &Grid) -> bool {
    (0..grid.rows()).any(|row| line_has_run(grid, grid.row_cells(row)))
        || (0..grid.columns()).any(|column| line_has_run(grid, grid.column_cells(column)))
}

fn collect_runs<I>(grid: &Grid, line: I, axis: Axis, out: &mut Vec<MatchRun>)
where
    I: Iterator<Item = CellCoord>,
{
    let mut current: Option<MatchRun> = None;
    for cell in line {
        let color = grid.color(cell);
        if let (Some(run), Some(color)) = (current.as_mut(), color) {
            if run.color == color {
                run.length += 1;
                continue;
            }
        }

        if let Some(run) = current.take() {
            if run.length >= MIN_RUN_LENGTH {
                out.push(run);
            }
        }
        current = color.map(|color| MatchRun {
            axis,
            start: cell,
            length: 1,
            color,
        });
    }

    if let Some(run) = current {
        if run.length >= MIN_RUN_LENGTH {
            out.push(run);
        }
    }
}

fn line_has_run<I>(grid: &Grid, line: I) -> bool
where
    I: Iterator<Item = CellCoord>,
{
    let mut previous = None;
    let mut length = 0;
    for cell in line {
        let color = grid.color(cell);
        if color.is_some() && color == previous {
            length += 1;
            if length >= MIN_RUN_LENGTH {
                return true;
            }
        } else {
            previous = color;
            length = 1;
        }
    }
    false
}

fn resolve_spawns(runs: &[MatchRun]) -> Vec<SpecialSpawn> {
    let mut pending: BTreeMap<(u32, u32), SpecialSpawn> = BTreeMap::new();

    let fours: Vec<&MatchRun> = runs
        .iter()
        .filter(|run| run.length == STRIPED_RUN_LENGTH)
        .collect();
    let mut merged = vec![false; fours.len()];

    for (i, horizontal) in fours.iter().enumerate() {
        if horizontal.axis != Axis::Horizontal {
            continue;
        }
        for (j, vertical) in fours.iter().enumerate() {
            if vertical.axis != Axis::Vertical || merged[i] || merged[j] {
                continue;
            }
            let crossing = CellCoord::new(vertical.start.column(), horizontal.start.row());
            if horizontal.contains(crossing) && vertical.contains(crossing) {
                merged[i] = true;
                merged[j] = true;
                offer(
                    &mut pending,
                    SpecialSpawn {
                        cell: crossing,
                        special: SpecialKind::Wrapped,
                        color: horizontal.color,
                    },
                );
            }
        }
    }

    for (run, merged) in fours.iter().zip(&merged) {
        if !merged {
            offer(
                &mut pending,
                SpecialSpawn {
                    cell: run.cell_at(1),
                    special: run.striped_kind(),
                    color: run.color,
                },
            );
        }
    }

    for run in runs.iter().filter(|run| run.length >= COLOR_BOMB_RUN_LENGTH) {
        offer(
            &mut pending,
            SpecialSpawn {
                cell: run.cell_at(run.length / 2),
                special: SpecialKind::ColorBomb,
                color: run.color,
            },
        );
    }

    pending.into_values().collect()
}

fn offer(pending: &mut BTreeMap<(u32, u32), SpecialSpawn>, spawn: SpecialSpawn) {
    let key = (spawn.cell.row(), spawn.cell.column());
    let stronger = pending
        .get(&key)
        .map_or(true, |existing| spawn.special.rank() > existing.special.rank());
    if stronger {
        let _ = pending.insert(key, spawn);
    }
}
