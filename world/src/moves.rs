//! Swap and booster processing.

use candy_match_core::{
    CandyColor, CascadePass, CellCoord, ComboKind, MoveOutcome, MoveRejection, ReshuffleReport,
    Resolution,
};
use candy_match_system_deadlock::has_valid_move;
use candy_match_system_match_detection::has_match;
use candy_match_system_special_activation::{blast_cells, combo_blast};
use rand::Rng;

use crate::{cascade::PassPlan, World};

impl<R: Rng> World<R> {
    /// Swaps two adjacent tiles and resolves everything the swap causes.
    ///
    /// A swap that neither fires a combo nor creates a run is undone and
    /// costs nothing. Rejections never touch the board. A move is never
    /// observed half-resolved: the call holds the world exclusively until the
    /// board has settled.
    pub fn attempt_swap(&mut self, from: CellCoord, to: CellCoord) -> MoveOutcome {
        if let Err(reason) = self.check_swap(from, to) {
            return MoveOutcome::Rejected(reason);
        }

        let score_before = self.stats.score();
        let mut passes = Vec::new();
        self.grid.swap_tiles(from, to);

        let combo = if let Some(blast) = combo_blast(&self.grid, from, to) {
            let kind = blast.kind;
            self.run_pass(PassPlan::combo(blast), &mut passes);
            Some(kind)
        } else if has_match(&self.grid) {
            None
        } else {
            self.grid.swap_tiles(from, to);
            return MoveOutcome::Reverted;
        };

        self.moves_remaining = self.moves_remaining.saturating_sub(1);
        self.settle_from(1, &mut passes);
        MoveOutcome::Resolved(self.commit(score_before, passes, combo))
    }

    /// Fires a booster at one cell.
    ///
    /// A special tile activates with its blast plus its own cell and costs a
    /// move; `target_color` redirects a color bomb. A plain tile is simply
    /// destroyed and costs nothing.
    pub fn manually_activate(
        &mut self,
        cell: CellCoord,
        target_color: Option<CandyColor>,
    ) -> MoveOutcome {
        if let Err(reason) = self.check_activation(cell, target_color) {
            return MoveOutcome::Rejected(reason);
        }

        let score_before = self.stats.score();
        let mut passes = Vec::new();
        let mut seeds = vec![cell];
        if let Some(special) = self.grid.special(cell) {
            seeds.extend(blast_cells(&self.grid, cell, special, target_color));
            self.moves_remaining = self.moves_remaining.saturating_sub(1);
        }

        self.run_pass(PassPlan::activation(cell, seeds), &mut passes);
        self.settle_from(1, &mut passes);
        MoveOutcome::Resolved(self.commit(score_before, passes, None))
    }

    fn check_swap(&self, from: CellCoord, to: CellCoord) -> Result<(), MoveRejection> {
        if !self.grid.contains(from) || !self.grid.contains(to) {
            return Err(MoveRejection::OutOfBounds);
        }
        self.check_playable()?;
        if !from.is_adjacent(to) {
            return Err(MoveRejection::NotAdjacent);
        }
        if self.grid.tile(from).is_none() || self.grid.tile(to).is_none() {
            return Err(MoveRejection::InertCell);
        }
        Ok(())
    }

    fn check_activation(
        &self,
        cell: CellCoord,
        target_color: Option<CandyColor>,
    ) -> Result<(), MoveRejection> {
        if !self.grid.contains(cell) {
            return Err(MoveRejection::OutOfBounds);
        }
        self.check_playable()?;
        if self.grid.tile(cell).is_none() {
            return Err(MoveRejection::InertCell);
        }
        if target_color.map_or(false, |color| color.index() >= self.definition.colors) {
            return Err(MoveRejection::UnknownColor);
        }
        Ok(())
    }

    fn check_playable(&self) -> Result<(), MoveRejection> {
        if self.status.is_finished() {
            return Err(MoveRejection::LevelFinished);
        }
        if self.moves_remaining == 0 {
            return Err(MoveRejection::NoMovesRemaining);
        }
        Ok(())
    }

    /// Folds a settled move into objectives and status, reshuffling a
    /// deadlocked board while the level is still being played.
    fn commit(
        &mut self,
        score_before: u64,
        passes: Vec<CascadePass>,
        combo: Option<ComboKind>,
    ) -> Box<Resolution> {
        let objective_deltas = self.refresh_progress();

        let reshuffle: Option<ReshuffleReport> =
            if !self.status.is_finished() && !has_valid_move(&self.grid) {
                Some(self.reshuffle_board())
            } else {
                None
            };

        Box::new(Resolution {
            grid: self.grid.clone(),
            score_delta: self.stats.score().saturating_sub(score_before),
            objective_deltas,
            passes,
            combo,
            reshuffle,
            moves_remaining: self.moves_remaining,
            status: self.status,
        })
    }
}
