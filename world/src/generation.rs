//! Board generation for fresh levels, restarts and reshuffles.

use candy_match_core::{CandyColor, CellCoord, Grid, ReshuffleReport, Tile};
use candy_match_system_deadlock::has_valid_move;
use rand::Rng;

use crate::TileIdAllocator;

/// Fills a copy of `template` until it offers a valid move or attempts run out.
///
/// The template contributes its blockers; any tiles it holds are ignored.
/// The final attempt is accepted even when it is deadlocked.
pub(crate) fn generate_board<R: Rng>(
    template: &Grid,
    colors: u8,
    max_attempts: u32,
    rng: &mut R,
    ids: &mut TileIdAllocator,
) -> (Grid, ReshuffleReport) {
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;
    loop {
        attempts += 1;
        let mut grid = empty_like(template);
        populate(&mut grid, colors, rng, ids);

        let valid_move_found = has_valid_move(&grid);
        if valid_move_found || attempts >= max_attempts {
            if !valid_move_found {
                log::warn!(
                    "accepting deadlocked {}x{} board after {attempts} attempts",
                    grid.columns(),
                    grid.rows()
                );
            }
            return (
                grid,
                ReshuffleReport {
                    attempts,
                    valid_move_found,
                },
            );
        }

        for tile in grid.tiles() {
            ids.release(tile.id());
        }
    }
}

/// Copy of the grid that keeps blockers and drops every tile.
pub(crate) fn empty_like(template: &Grid) -> Grid {
    let mut grid = Grid::new(template.columns(), template.rows());
    for cell in template.cells() {
        grid.set_blocker(cell, template.blocker(cell));
    }
    grid
}

/// Places a tile on every live cell in row-major order, redrawing any color
/// that would complete a run with the two cells to the left or above.
fn populate<R: Rng>(grid: &mut Grid, colors: u8, rng: &mut R, ids: &mut TileIdAllocator) {
    let cells: Vec<CellCoord> = grid.cells().collect();
    for cell in cells {
        if grid.is_inert(cell) {
            continue;
        }
        let color = loop {
            let candidate = CandyColor::new(rng.gen_range(0..colors));
            if !completes_run(grid, cell, candidate) {
                break candidate;
            }
        };
        grid.place_tile(cell, Tile::new(ids.allocate(), color));
    }
}

fn completes_run(grid: &Grid, cell: CellCoord, color: CandyColor) -> bool {
    let column = cell.column();
    let row = cell.row();
    let same = |column: u32, row: u32| grid.color(CellCoord::new(column, row)) == Some(color);

    let left = column >= 2 && same(column - 1, row) && same(column - 2, row);
    let above = row >= 2 && same(column, row - 1) && same(column, row - 2);
    left || above
}

#[cfg(test)]
mod tests {
    use super::*;
    use candy_match_core::Blocker;
    use candy_match_system_match_detection::has_match;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generated_boards_never_start_with_a_run() {
        let template = Grid::new(8, 8);
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut ids = TileIdAllocator::new();
            let (grid, report) = generate_board(&template, 3, 10, &mut rng, &mut ids);
            assert!(!has_match(&grid), "seed {seed} produced a run");
            assert!(report.attempts >= 1);
            assert_eq!(grid.live_tile_count(), 64);
        }
    }

    #[test]
    fn inert_cells_stay_empty_and_other_blockers_keep_tiles() {
        let mut template = Grid::new(4, 4);
        template.set_blocker(CellCoord::new(1, 1), Some(Blocker::Chocolate));
        template.set_blocker(CellCoord::new(2, 2), Some(Blocker::Jelly));

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut ids = TileIdAllocator::new();
        let (grid, _) = generate_board(&template, 4, 10, &mut rng, &mut ids);

        assert!(grid.tile(CellCoord::new(1, 1)).is_none());
        assert_eq!(grid.blocker(CellCoord::new(1, 1)), Some(Blocker::Chocolate));
        assert!(grid.tile(CellCoord::new(2, 2)).is_some());
        assert_eq!(grid.blocker(CellCoord::new(2, 2)), Some(Blocker::Jelly));
        assert_eq!(grid.live_tile_count(), 15);
    }

    #[test]
    fn failed_attempts_release_their_identifiers() {
        let template = Grid::new(2, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut ids = TileIdAllocator::new();
        let (grid, report) = generate_board(&template, 3, 4, &mut rng, &mut ids);

        assert_eq!(report.attempts, 4);
        assert!(!report.valid_move_found);
        assert_eq!(ids.live_count(), grid.live_tile_count());
    }
}
