//! Fixed-size board of tiles paired with a same-shaped layer of blockers.

use std::fmt;

use thiserror::Error;

use crate::{Blocker, CandyColor, CellCoord, SpecialKind, Tile, TileId};

const EMPTY_TOKEN: &str = ".";
const CHOCOLATE_TOKEN: &str = "#";
const LICORICE_TOKEN: &str = "&";

/// Board of tiles and blockers addressed by [`CellCoord`].
///
/// A cell without a tile is empty. Cells covered by chocolate or licorice are
/// inert: they never hold a tile until the blocker is destroyed.
///
/// The text layout accepted by [`Grid::parse`] and produced by `Display` uses
/// one whitespace-separated token per cell: a palette letter optionally
/// followed by a special marker (`R`, `G-`, `B|`, `Y@`, `P*`), `.` for an
/// empty cell, `#` for chocolate and `&` for licorice.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tiles: Vec<Option<Tile>>,
    blockers: Vec<Option<Blocker>>,
}

impl Grid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            tiles: vec![None; capacity],
            blockers: vec![None; capacity],
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Dense index of the cell in row-major order.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    /// Enumerates every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    /// Enumerates the cells of a row from left to right.
    pub fn row_cells(&self, row: u32) -> impl Iterator<Item = CellCoord> {
        let rows = self.rows;
        (0..self.columns)
            .filter(move |_| row < rows)
            .map(move |column| CellCoord::new(column, row))
    }

    /// Enumerates the cells of a column from top to bottom.
    pub fn column_cells(&self, column: u32) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows)
            .filter(move |_| column < columns)
            .map(move |row| CellCoord::new(column, row))
    }

    /// Enumerates the in-bounds cells sharing an edge with the provided cell.
    pub fn orthogonal_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        const OFFSETS: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
        OFFSETS.into_iter().filter_map(move |(dx, dy)| {
            let column = u32::try_from(i64::from(cell.column()) + dx).ok()?;
            let row = u32::try_from(i64::from(cell.row()) + dy).ok()?;
            let neighbor = CellCoord::new(column, row);
            self.contains(neighbor).then_some(neighbor)
        })
    }

    /// Tile occupying the cell, if any.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<&Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index))
            .and_then(Option::as_ref)
    }

    /// Mutable access to the tile occupying the cell, if any.
    pub fn tile_mut(&mut self, cell: CellCoord) -> Option<&mut Tile> {
        let index = self.index(cell)?;
        self.tiles.get_mut(index).and_then(Option::as_mut)
    }

    /// Color of the tile occupying the cell; `None` for empty or inert cells.
    #[must_use]
    pub fn color(&self, cell: CellCoord) -> Option<CandyColor> {
        self.tile(cell).map(Tile::color)
    }

    /// Special behaviour of the tile occupying the cell, if any.
    #[must_use]
    pub fn special(&self, cell: CellCoord) -> Option<SpecialKind> {
        self.tile(cell).and_then(Tile::special_kind)
    }

    /// Places a tile into the cell, replacing whatever was there.
    pub fn place_tile(&mut self, cell: CellCoord, tile: Tile) {
        if let Some(index) = self.index(cell) {
            self.tiles[index] = Some(tile);
        }
    }

    /// Removes and returns the tile occupying the cell.
    pub fn take_tile(&mut self, cell: CellCoord) -> Option<Tile> {
        let index = self.index(cell)?;
        self.tiles.get_mut(index).and_then(Option::take)
    }

    /// Exchanges the tiles of two cells, leaving blockers in place.
    pub fn swap_tiles(&mut self, first: CellCoord, second: CellCoord) {
        if let (Some(a), Some(b)) = (self.index(first), self.index(second)) {
            self.tiles.swap(a, b);
        }
    }

    /// Blocker overlaying the cell, if any.
    #[must_use]
    pub fn blocker(&self, cell: CellCoord) -> Option<Blocker> {
        self.index(cell)
            .and_then(|index| self.blockers.get(index).copied())
            .flatten()
    }

    /// Replaces the blocker overlaying the cell.
    pub fn set_blocker(&mut self, cell: CellCoord, blocker: Option<Blocker>) {
        if let Some(index) = self.index(cell) {
            self.blockers[index] = blocker;
        }
    }

    /// Reports whether the cell is filled by chocolate or licorice.
    #[must_use]
    pub fn is_inert(&self, cell: CellCoord) -> bool {
        self.blocker(cell).map_or(false, Blocker::is_inert)
    }

    /// Iterates over every tile on the board in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().flatten()
    }

    /// Number of live tiles on the board.
    #[must_use]
    pub fn live_tile_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_some()).count()
    }

    /// Number of cells filled by chocolate or licorice.
    #[must_use]
    pub fn inert_cell_count(&self) -> usize {
        self.blockers
            .iter()
            .filter(|blocker| blocker.map_or(false, Blocker::is_inert))
            .count()
    }

    /// Clears the presentation flags of every tile.
    pub fn clear_tile_flags(&mut self) {
        for tile in self.tiles.iter_mut().flatten() {
            tile.clear_flags();
        }
    }

    /// Builds a grid from the text layout described on [`Grid`].
    ///
    /// Tiles receive identifiers in row-major order starting at zero.
    pub fn parse(layout: &str) -> Result<Self, GridParseError> {
        let lines: Vec<Vec<&str>> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.split_whitespace().collect())
            .collect();

        let Some(first) = lines.first() else {
            return Err(GridParseError::EmptyLayout);
        };
        let expected = first.len();
        let columns = u32::try_from(expected).map_err(|_| GridParseError::EmptyLayout)?;
        let rows = u32::try_from(lines.len()).map_err(|_| GridParseError::EmptyLayout)?;

        let mut grid = Self::new(columns, rows);
        let mut next_id = 0u32;
        for (row, tokens) in lines.iter().enumerate() {
            if tokens.len() != expected {
                return Err(GridParseError::RaggedRow {
                    row,
                    expected,
                    found: tokens.len(),
                });
            }

            for (column, token) in tokens.iter().enumerate() {
                let cell = CellCoord::new(column as u32, row as u32);
                match *token {
                    EMPTY_TOKEN => {}
                    CHOCOLATE_TOKEN => grid.set_blocker(cell, Some(Blocker::Chocolate)),
                    LICORICE_TOKEN => grid.set_blocker(cell, Some(Blocker::Licorice)),
                    _ => {
                        let tile = parse_tile(token, TileId::new(next_id)).ok_or_else(|| {
                            GridParseError::UnknownToken {
                                row,
                                column,
                                token: (*token).to_owned(),
                            }
                        })?;
                        next_id += 1;
                        grid.place_tile(cell, tile);
                    }
                }
            }
        }

        Ok(grid)
    }
}

fn parse_tile(token: &str, id: TileId) -> Option<Tile> {
    let mut chars = token.chars();
    let color = CandyColor::from_letter(chars.next()?)?;
    let special = match chars.next() {
        Some(marker) => Some(SpecialKind::from_marker(marker)?),
        None => None,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(match special {
        Some(kind) => Tile::special(id, color, kind),
        None => Tile::new(id, color),
    })
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let mut line = String::new();
            for cell in self.row_cells(row) {
                let token = match (self.tile(cell), self.blocker(cell)) {
                    (Some(tile), _) => {
                        let mut token = String::new();
                        token.push(tile.color().letter().unwrap_or('?'));
                        if let Some(special) = tile.special_kind() {
                            token.push(special.marker());
                        }
                        token
                    }
                    (None, Some(Blocker::Chocolate)) => CHOCOLATE_TOKEN.to_owned(),
                    (None, Some(Blocker::Licorice)) => LICORICE_TOKEN.to_owned(),
                    (None, _) => EMPTY_TOKEN.to_owned(),
                };
                line.push_str(&format!("{token:<3}"));
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

/// Errors that can occur while parsing a grid text layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridParseError {
    /// The layout contained no rows.
    #[error("grid layout is empty")]
    EmptyLayout,
    /// A row had a different number of cells than the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Cell count of the first row.
        expected: usize,
        /// Cell count of the offending row.
        found: usize,
    },
    /// A token could not be interpreted.
    #[error("unknown token '{token}' at row {row}, column {column}")]
    UnknownToken {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
        /// Offending token.
        token: String,
    },
}
