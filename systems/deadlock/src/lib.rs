#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides whether a settled board still offers a move.
//!
//! Every cell is paired with its right and lower neighbor. Each pair is
//! swapped on a scratch copy of the board; the swap is productive when it
//! creates a run or fires a special combo.

use candy_match_core::{CellCoord, Grid};
use candy_match_system_match_detection::has_match;
use candy_match_system_special_activation::combo_kind;

/// Swap between two adjacent cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CandidateSwap {
    /// Cell selected first.
    pub from: CellCoord,
    /// Cell to its right or below it.
    pub to: CellCoord,
}

/// Reports whether any adjacent swap produces a match or combo.
#[must_use]
pub fn has_valid_move(grid: &Grid) -> bool {
    find_valid_move(grid).is_some()
}

/// First productive swap in row-major order, if any.
#[must_use]
pub fn find_valid_move(grid: &Grid) -> Option<CandidateSwap> {
    let mut scratch = grid.clone();
    candidate_swaps(grid).find(|swap| is_productive(&mut scratch, *swap))
}

/// Every productive swap in row-major order.
#[must_use]
pub fn valid_moves(grid: &Grid) -> Vec<CandidateSwap> {
    let mut scratch = grid.clone();
    candidate_swaps(grid)
        .filter(|swap| is_productive(&mut scratch, *swap))
        .collect()
}

fn candidate_swaps(grid: &Grid) -> impl Iterator<Item = CandidateSwap> + '_ {
    grid.cells()
        .flat_map(move |cell| {
            let right = CellCoord::new(cell.column() + 1, cell.row());
            let down = CellCoord::new(cell.column(), cell.row() + 1);
            [right, down]
                .into_iter()
                .map(move |to| CandidateSwap { from: cell, to })
        })
        .filter(move |swap| grid.tile(swap.from).is_some() && grid.tile(swap.to).is_some())
}

fn is_productive(scratch: &mut Grid, swap: CandidateSwap) -> bool {
    scratch.swap_tiles(swap.from, swap.to);
    let productive =
        combo_kind(scratch, swap.from, swap.to).is_some() || has_match(scratch);
    scratch.swap_tiles(swap.from, swap.to);
    productive
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(layout: &str) -> Grid {
        Grid::parse(layout).expect("layout parses")
    }

    #[test]
    fn alternating_pairs_are_deadlocked() {
        let board = grid(
            "R G R G
             B Y B Y
             R G R G
             B Y B Y",
        );
        assert!(!has_valid_move(&board));
        assert!(valid_moves(&board).is_empty());
    }

    #[test]
    fn finds_swap_completing_a_row() {
        let board = grid(
            "R R G
             G B R
             B G B",
        );
        let swap = find_valid_move(&board).expect("valid move");
        assert_eq!(
            swap,
            CandidateSwap {
                from: CellCoord::new(2, 0),
                to: CellCoord::new(2, 1),
            }
        );
    }

    #[test]
    fn special_tile_next_to_plain_is_always_playable() {
        let board = grid(
            "R G R G
             B Y B- Y
             R G R G
             B Y B Y",
        );
        assert!(has_valid_move(&board));
    }

    #[test]
    fn inert_cells_are_never_swapped() {
        let board = grid(
            "R R # R
             G B G B",
        );
        assert!(!has_valid_move(&board));
    }
}
