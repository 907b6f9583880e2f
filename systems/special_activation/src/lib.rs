#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes the cells destroyed by special tiles.
//!
//! Activation never mutates the board: it only reports which cells join the
//! removal set. Chained activations are driven by the world's cascade
//! resolver, which feeds newly reached specials back into this system.

use candy_match_core::{CandyColor, CellCoord, ComboKind, Grid, SpecialKind};

const WRAPPED_RADIUS: u32 = 1;
const WRAPPED_PAIR_RADIUS: u32 = 2;

/// Destruction set produced by a swap between interacting tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComboBlast {
    /// Rule that fired.
    pub kind: ComboKind,
    /// Cells to remove, row-major. Both swapped cells are included, except
    /// that a special swapped with a plain tile spares the plain partner.
    pub cells: Vec<CellCoord>,
    /// The two swapped cells, which must not activate again in the same pass.
    pub participants: [CellCoord; 2],
}

/// Cells destroyed by a special tile, excluding the tile's own cell.
///
/// `target_color` overrides the color a color bomb consumes; without it the
/// bomb consumes its own color.
#[must_use]
pub fn blast_cells(
    grid: &Grid,
    cell: CellCoord,
    special: SpecialKind,
    target_color: Option<CandyColor>,
) -> Vec<CellCoord> {
    let mut set = CellSet::new(grid);
    match special {
        SpecialKind::StripedHorizontal => set.insert_row(grid, cell.row()),
        SpecialKind::StripedVertical => set.insert_column(grid, cell.column()),
        SpecialKind::Wrapped => set.insert_square(grid, cell, WRAPPED_RADIUS),
        SpecialKind::ColorBomb => {
            if let Some(color) = target_color.or_else(|| grid.color(cell)) {
                set.insert_color(grid, color);
            }
        }
    }
    set.remove(grid, cell);
    set.into_cells(grid)
}

/// Cells destroyed by the special tile occupying `cell`, if there is one.
#[must_use]
pub fn activation_cells(
    grid: &Grid,
    cell: CellCoord,
    target_color: Option<CandyColor>,
) -> Vec<CellCoord> {
    grid.special(cell)
        .map(|special| blast_cells(grid, cell, special, target_color))
        .unwrap_or_default()
}

/// Classifies the interaction between two swapped tiles.
///
/// Rules are tried in precedence order and the first that applies wins.
/// Pairs the rules do not name, such as wrapped with striped, do not
/// interact and fall back to ordinary matching.
#[must_use]
pub fn combo_kind(grid: &Grid, first: CellCoord, second: CellCoord) -> Option<ComboKind> {
    let a = grid.tile(first)?.special_kind();
    let b = grid.tile(second)?.special_kind();

    let bomb = Some(SpecialKind::ColorBomb);
    let striped = |kind: Option<SpecialKind>| kind.map_or(false, SpecialKind::is_striped);

    if a == bomb && b == bomb {
        return Some(ComboKind::ColorBombPair);
    }
    if (a == bomb && striped(b)) || (b == bomb && striped(a)) {
        return Some(ComboKind::ColorBombStriped);
    }
    if striped(a) && striped(b) {
        return Some(ComboKind::StripedPair);
    }
    if a == Some(SpecialKind::Wrapped) && b == Some(SpecialKind::Wrapped) {
        return Some(ComboKind::WrappedPair);
    }
    if (a == bomb && b.is_none()) || (b == bomb && a.is_none()) {
        return Some(ComboKind::ColorBombPlain);
    }
    if (a.is_some() && b.is_none()) || (b.is_some() && a.is_none()) {
        return Some(ComboKind::SpecialPlain);
    }
    None
}

/// Computes the destruction set of a swap, with the board already swapped.
///
/// `to` is the cell the first selected tile moved onto and centers the
/// cross and square blasts.
#[must_use]
pub fn combo_blast(grid: &Grid, from: CellCoord, to: CellCoord) -> Option<ComboBlast> {
    let kind = combo_kind(grid, from, to)?;
    let mut set = CellSet::new(grid);

    match kind {
        ComboKind::ColorBombPair => {
            for cell in grid.cells() {
                set.insert(grid, cell);
            }
        }
        ComboKind::ColorBombStriped => {
            let (bomb, striped) = if grid.special(from) == Some(SpecialKind::ColorBomb) {
                (from, to)
            } else {
                (to, from)
            };
            if let Some(color) = grid.color(striped) {
                let sources: Vec<CellCoord> = grid
                    .cells()
                    .filter(|cell| *cell != bomb && grid.color(*cell) == Some(color))
                    .collect();
                for source in sources {
                    set.insert_row(grid, source.row());
                    set.insert_column(grid, source.column());
                }
            }
        }
        ComboKind::StripedPair => {
            set.insert_row(grid, to.row());
            set.insert_column(grid, to.column());
        }
        ComboKind::WrappedPair => set.insert_square(grid, to, WRAPPED_PAIR_RADIUS),
        ComboKind::ColorBombPlain => {
            let plain = if grid.special(from).is_none() { from } else { to };
            if let Some(color) = grid.color(plain) {
                set.insert_color(grid, color);
            }
        }
        ComboKind::SpecialPlain => {
            let special = if grid.special(from).is_some() { from } else { to };
            for cell in activation_cells(grid, special, None) {
                set.insert(grid, cell);
            }
            set.insert(grid, special);
        }
    }

    if kind != ComboKind::SpecialPlain {
        set.insert(grid, from);
        set.insert(grid, to);
    }

    Some(ComboBlast {
        kind,
        cells: set.into_cells(grid),
        participants: [from, to],
    })
}

/// Dense membership mask over the grid that yields cells in row-major order.
struct CellSet {
    marked: Vec<bool>,
}

impl CellSet {
    fn new(grid: &Grid) -> Self {
        Self {
            marked: vec![false; grid.cells().count()],
        }
    }

    fn insert(&mut self, grid: &Grid, cell: CellCoord) {
        if let Some(index) = grid.index(cell) {
            self.marked[index] = true;
        }
    }

    fn remove(&mut self, grid: &Grid, cell: CellCoord) {
        if let Some(index) = grid.index(cell) {
            self.marked[index] = false;
        }
    }

    fn insert_row(&mut self, grid: &Grid, row: u32) {
        for cell in grid.row_cells(row) {
            self.insert(grid, cell);
        }
    }

    fn insert_column(&mut self, grid: &Grid, column: u32) {
        for cell in grid.column_cells(column) {
            self.insert(grid, cell);
        }
    }

    fn insert_square(&mut self, grid: &Grid, center: CellCoord, radius: u32) {
        let columns = center.column().saturating_sub(radius)..=center.column().saturating_add(radius);
        let rows = center.row().saturating_sub(radius)..=center.row().saturating_add(radius);
        for row in rows {
            for column in columns.clone() {
                self.insert(grid, CellCoord::new(column, row));
            }
        }
    }

    fn insert_color(&mut self, grid: &Grid, color: CandyColor) {
        for cell in grid.cells() {
            if grid.color(cell) == Some(color) {
                self.insert(grid, cell);
            }
        }
    }

    fn into_cells(self, grid: &Grid) -> Vec<CellCoord> {
        grid.cells()
            .filter(|cell| grid.index(*cell).map_or(false, |index| self.marked[index]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(layout: &str) -> Grid {
        Grid::parse(layout).expect("layout parses")
    }

    #[test]
    fn horizontal_stripe_clears_rest_of_row() {
        let board = grid(
            "R G B
             G R- Y
             B Y G",
        );
        let cells = activation_cells(&board, CellCoord::new(1, 1), None);
        assert_eq!(cells, vec![CellCoord::new(0, 1), CellCoord::new(2, 1)]);
    }

    #[test]
    fn vertical_stripe_clears_rest_of_column() {
        let board = grid(
            "R G B
             G R| Y
             B Y G",
        );
        let cells = activation_cells(&board, CellCoord::new(1, 1), None);
        assert_eq!(cells, vec![CellCoord::new(1, 0), CellCoord::new(1, 2)]);
    }

    #[test]
    fn wrapped_clears_neighbors_clipped_to_grid() {
        let board = grid(
            "R@ G B
             G R Y
             B Y G",
        );
        let cells = activation_cells(&board, CellCoord::new(0, 0), None);
        assert_eq!(
            cells,
            vec![CellCoord::new(1, 0), CellCoord::new(0, 1), CellCoord::new(1, 1)]
        );
    }

    #[test]
    fn color_bomb_consumes_target_color() {
        let board = grid(
            "Y G B
             G R* Y
             B Y G",
        );
        let own = activation_cells(&board, CellCoord::new(1, 1), None);
        assert!(own.is_empty(), "no other red tile on the board");

        let green = activation_cells(&board, CellCoord::new(1, 1), CandyColor::from_letter('G'));
        assert_eq!(
            green,
            vec![CellCoord::new(1, 0), CellCoord::new(0, 1), CellCoord::new(2, 2)]
        );
    }

    #[test]
    fn plain_tile_has_no_activation() {
        let board = grid("R G B");
        assert!(activation_cells(&board, CellCoord::new(0, 0), None).is_empty());
    }

    #[test]
    fn double_bomb_outranks_everything() {
        let board = grid(
            "R* R* G
             G  B  B",
        );
        let blast = combo_blast(&board, CellCoord::new(0, 0), CellCoord::new(1, 0)).expect("combo");
        assert_eq!(blast.kind, ComboKind::ColorBombPair);
        assert_eq!(blast.cells.len(), 6);
    }

    #[test]
    fn striped_pair_clears_cross_through_destination() {
        let board = grid(
            "R  G  B  Y
             G  R- Y| B
             B  Y  G  R
             Y  B  R  G",
        );
        let blast = combo_blast(&board, CellCoord::new(1, 1), CellCoord::new(2, 1)).expect("combo");
        assert_eq!(blast.kind, ComboKind::StripedPair);
        assert_eq!(
            blast.cells,
            vec![
                CellCoord::new(2, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
                CellCoord::new(2, 1),
                CellCoord::new(3, 1),
                CellCoord::new(2, 2),
                CellCoord::new(2, 3),
            ]
        );
    }

    #[test]
    fn bomb_with_stripe_sweeps_every_line_of_that_color() {
        let board = grid(
            "R  G  B  Y
             G  B* Y- B
             B  R  G  R
             Y  B  R  G",
        );
        let blast = combo_blast(&board, CellCoord::new(1, 1), CellCoord::new(2, 1)).expect("combo");
        assert_eq!(blast.kind, ComboKind::ColorBombStriped);
        // Yellow sits at (3,0), (2,1) and (0,3); their rows and columns cover the board
        // except (1,2).
        assert_eq!(blast.cells.len(), 15);
        assert!(!blast.cells.contains(&CellCoord::new(1, 2)));
    }

    #[test]
    fn bomb_with_plain_consumes_partner_color() {
        let board = grid(
            "R  G  B
             G  R* B
             B  G  R",
        );
        let blast = combo_blast(&board, CellCoord::new(2, 1), CellCoord::new(1, 1)).expect("combo");
        assert_eq!(blast.kind, ComboKind::ColorBombPlain);
        assert_eq!(
            blast.cells,
            vec![
                CellCoord::new(2, 0),
                CellCoord::new(1, 1),
                CellCoord::new(2, 1),
                CellCoord::new(0, 2),
            ]
        );
    }

    #[test]
    fn special_with_plain_includes_own_cell_but_spares_partner() {
        let board = grid(
            "R  G  B
             G  R| B
             B  G  R",
        );
        let blast = combo_blast(&board, CellCoord::new(1, 1), CellCoord::new(0, 1)).expect("combo");
        assert_eq!(blast.kind, ComboKind::SpecialPlain);
        assert_eq!(
            blast.cells,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(1, 1),
                CellCoord::new(1, 2),
            ]
        );
    }

    #[test]
    fn stripe_moved_across_its_line_keeps_to_its_own_column() {
        let board = grid(
            "R  G  B
             B| Y  P
             B  Y  G",
        );
        let blast = combo_blast(&board, CellCoord::new(1, 1), CellCoord::new(0, 1)).expect("combo");
        assert_eq!(blast.kind, ComboKind::SpecialPlain);
        assert_eq!(
            blast.cells,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(0, 2),
            ]
        );
        assert!(!blast.cells.contains(&CellCoord::new(1, 1)));
    }

    #[test]
    fn bomb_sharing_the_stripe_color_is_not_a_sweep_source() {
        let board = grid(
            "R  G  B  Y
             G  Y* Y- B
             B  R  G  R
             R  B  R  G",
        );
        let blast = combo_blast(&board, CellCoord::new(1, 1), CellCoord::new(2, 1)).expect("combo");
        assert_eq!(blast.kind, ComboKind::ColorBombStriped);
        // Yellow plain/striped tiles at (3,0) and (2,1) sweep rows 0..=1 and columns 2..=3.
        assert_eq!(blast.cells.len(), 12);
        assert!(blast.cells.contains(&CellCoord::new(1, 1)));
        assert!(!blast.cells.contains(&CellCoord::new(1, 2)));
        assert!(!blast.cells.contains(&CellCoord::new(1, 3)));
    }

    #[test]
    fn wrapped_pair_clears_five_by_five_around_destination() {
        let board = grid(
            "R  G  B  Y  P  O
             G  B  Y  P  O  R
             B  Y  P@ O@ R  G
             Y  P  O  R  G  B
             P  O  R  G  B  Y
             O  R  G  B  Y  P",
        );
        let blast = combo_blast(&board, CellCoord::new(3, 2), CellCoord::new(2, 2)).expect("combo");
        assert_eq!(blast.kind, ComboKind::WrappedPair);
        assert_eq!(blast.cells.len(), 25);
        assert!(blast
            .cells
            .iter()
            .all(|cell| cell.column() <= 4 && cell.row() <= 4));
    }

    #[test]
    fn wrapped_pair_in_a_corner_is_clipped_to_the_board() {
        let board = grid(
            "R@ G@ B  Y
             G  B  Y  P
             B  Y  P  O
             Y  P  O  R",
        );
        let blast = combo_blast(&board, CellCoord::new(1, 0), CellCoord::new(0, 0)).expect("combo");
        assert_eq!(blast.kind, ComboKind::WrappedPair);
        let expected: Vec<CellCoord> = (0..=2)
            .flat_map(|row| (0..=2).map(move |column| CellCoord::new(column, row)))
            .collect();
        assert_eq!(blast.cells, expected);
    }

    #[test]
    fn unlisted_pairs_do_not_interact() {
        let board = grid("R@ G- B");
        assert_eq!(combo_kind(&board, CellCoord::new(0, 0), CellCoord::new(1, 0)), None);
        let plain = grid("R G B");
        assert_eq!(combo_kind(&plain, CellCoord::new(0, 0), CellCoord::new(1, 0)), None);
    }
}
