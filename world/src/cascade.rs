//! Cascade resolution: remove, spawn, drop and refill until the board settles.

use std::collections::VecDeque;

use candy_match_core::{
    Blocker, BlockerChange, CandyColor, CascadePass, CellCoord, ComboKind, Ingredient,
    PassTrigger, SpecialSpawn, Tile, TileId,
};
use candy_match_system_match_detection::detect_matches;
use candy_match_system_special_activation::{blast_cells, ComboBlast};
use rand::Rng;

use crate::World;

/// Cells that start a pass and the context needed to score it.
#[derive(Clone, Debug)]
pub(crate) struct PassPlan {
    trigger: PassTrigger,
    chain: u32,
    seeds: Vec<CellCoord>,
    matched: Vec<CellCoord>,
    spawns: Vec<SpecialSpawn>,
    activated: Vec<CellCoord>,
}

impl PassPlan {
    /// Pass started by runs the match detector reported.
    pub(crate) fn matched(matched: Vec<CellCoord>, spawns: Vec<SpecialSpawn>, chain: u32) -> Self {
        Self {
            trigger: PassTrigger::Match,
            chain,
            seeds: matched.clone(),
            matched,
            spawns,
            activated: Vec::new(),
        }
    }

    /// Pass started by the destruction set of a swap combo.
    pub(crate) fn combo(blast: ComboBlast) -> Self {
        Self {
            trigger: PassTrigger::Combo(blast.kind),
            chain: 1,
            seeds: blast.cells,
            matched: Vec::new(),
            spawns: Vec::new(),
            activated: blast.participants.to_vec(),
        }
    }

    /// Pass started by a booster on a single cell.
    ///
    /// `seeds` already holds the blast of a special tile, which must not
    /// fire a second time.
    pub(crate) fn activation(cell: CellCoord, seeds: Vec<CellCoord>) -> Self {
        Self {
            trigger: PassTrigger::Activation,
            chain: 1,
            seeds,
            matched: Vec::new(),
            spawns: Vec::new(),
            activated: vec![cell],
        }
    }
}

/// Dense per-cell flags addressed through the grid's row-major index.
struct CellMask {
    flags: Vec<bool>,
}

impl CellMask {
    fn new(len: usize) -> Self {
        Self {
            flags: vec![false; len],
        }
    }

    fn get(&self, index: Option<usize>) -> bool {
        index.map_or(false, |index| self.flags[index])
    }

    /// Marks the cell and reports whether it was unmarked before.
    fn insert(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(index) if !self.flags[index] => {
                self.flags[index] = true;
                true
            }
            _ => false,
        }
    }
}

impl<R: Rng> World<R> {
    /// Runs detect passes until the board holds no run.
    pub(crate) fn settle_from(&mut self, chain_start: u32, passes: &mut Vec<CascadePass>) {
        let mut chain = chain_start;
        let mut resolved = 0;
        loop {
            let report = detect_matches(&self.grid);
            if report.is_empty() {
                return;
            }
            if resolved >= self.config.max_cascade_passes {
                log::warn!(
                    "cascade stopped after {resolved} passes with runs still on the board"
                );
                return;
            }

            let (matched, spawns) = report.into_parts();
            self.run_pass(PassPlan::matched(matched, spawns, chain), passes);
            chain = chain.saturating_add(1);
            resolved += 1;
        }
    }

    /// Applies one pass: removal, blockers, spawns, clearing, gravity, refill.
    pub(crate) fn run_pass(&mut self, plan: PassPlan, passes: &mut Vec<CascadePass>) {
        self.grid.clear_tile_flags();
        let cell_count = self.grid.cells().count();

        let mut removal = CellMask::new(cell_count);
        let mut activated = CellMask::new(cell_count);
        for cell in &plan.activated {
            let _ = activated.insert(self.grid.index(*cell));
        }

        let mut pending: VecDeque<CellCoord> = VecDeque::new();
        for cell in &plan.seeds {
            if removal.insert(self.grid.index(*cell)) {
                pending.push_back(*cell);
            }
        }
        while let Some(cell) = pending.pop_front() {
            let Some(special) = self.grid.special(cell) else {
                continue;
            };
            if !activated.insert(self.grid.index(cell)) {
                continue;
            }
            for reached in blast_cells(&self.grid, cell, special, None) {
                if removal.insert(self.grid.index(reached)) {
                    pending.push_back(reached);
                }
            }
        }

        let removed: Vec<CellCoord> = self
            .grid
            .cells()
            .filter(|cell| removal.get(self.grid.index(*cell)))
            .collect();
        let live_removed = removed
            .iter()
            .filter(|cell| {
                self.grid
                    .tile(**cell)
                    .map_or(false, |tile| self.delivery(tile, **cell).is_none())
            })
            .count();

        let blockers = self.damage_blockers(&removed, &removal);

        let mut matched = CellMask::new(cell_count);
        for cell in &plan.matched {
            let _ = matched.insert(self.grid.index(*cell));
        }
        let mut spawned_at = CellMask::new(cell_count);
        let mut spawned = Vec::new();
        let mut released: Vec<TileId> = Vec::new();
        let mut delivered = Vec::new();

        for spawn in &plan.spawns {
            let index = self.grid.index(spawn.cell);
            if !removal.get(index) || !spawned_at.insert(index) {
                continue;
            }
            if let Some(consumed) = self.grid.take_tile(spawn.cell) {
                self.consume(&consumed, spawn.cell, matched.get(index), &mut delivered);
                released.push(consumed.id());
            }
            let mut tile = Tile::special(self.ids.allocate(), spawn.color, spawn.special);
            tile.mark_fresh();
            self.grid.place_tile(spawn.cell, tile);
            spawned.push(*spawn);
        }

        for cell in &removed {
            let index = self.grid.index(*cell);
            if spawned_at.get(index) {
                continue;
            }
            if let Some(tile) = self.grid.take_tile(*cell) {
                self.consume(&tile, *cell, matched.get(index), &mut delivered);
                released.push(tile.id());
            }
        }

        let score = self.pass_score(plan.trigger, plan.chain, live_removed);
        self.stats.add_score(score);

        self.apply_gravity();
        self.refill();
        for id in released {
            self.ids.release(id);
        }

        let pass = CascadePass {
            index: u32::try_from(passes.len() + 1).unwrap_or(u32::MAX),
            trigger: plan.trigger,
            chain: plan.chain,
            removed,
            spawned,
            blockers,
            delivered,
            score,
        };
        log::debug!(
            "pass {} ({:?}, chain {}): removed {} tiles, spawned {}, scored {}",
            pass.index,
            pass.trigger,
            pass.chain,
            live_removed,
            pass.spawned.len(),
            pass.score
        );
        passes.push(pass);
    }

    /// Destroys single-hit blockers in the removal set and cracks adjacent ice.
    fn damage_blockers(&mut self, removed: &[CellCoord], removal: &CellMask) -> Vec<BlockerChange> {
        let mut changes = Vec::new();

        for cell in removed {
            if let Some(blocker @ (Blocker::Jelly | Blocker::Chocolate | Blocker::Licorice)) =
                self.grid.blocker(*cell)
            {
                self.grid.set_blocker(*cell, None);
                self.stats.record_blocker_cleared(blocker.kind());
                changes.push(BlockerChange {
                    cell: *cell,
                    kind: blocker.kind(),
                    remaining_layers: 0,
                });
            }
        }

        let cracked: Vec<CellCoord> = self
            .grid
            .cells()
            .filter(|cell| matches!(self.grid.blocker(*cell), Some(Blocker::Ice { .. })))
            .filter(|cell| {
                self.grid
                    .orthogonal_neighbors(*cell)
                    .any(|neighbor| removal.get(self.grid.index(neighbor)))
            })
            .collect();
        for cell in cracked {
            if let Some(blocker @ Blocker::Ice { layers }) = self.grid.blocker(cell) {
                let remaining = layers.saturating_sub(1);
                if remaining == 0 {
                    self.grid.set_blocker(cell, None);
                    self.stats.record_blocker_cleared(blocker.kind());
                } else {
                    self.grid
                        .set_blocker(cell, Some(Blocker::Ice { layers: remaining }));
                }
                changes.push(BlockerChange {
                    cell,
                    kind: blocker.kind(),
                    remaining_layers: remaining,
                });
            }
        }

        changes
    }

    /// Ingredient a tile hands over when it leaves the board from the bottom row.
    fn delivery(&self, tile: &Tile, cell: CellCoord) -> Option<Ingredient> {
        tile.ingredient().filter(|_| cell.row() + 1 == self.grid.rows())
    }

    /// Credits a removed tile to the level statistics.
    ///
    /// A delivered ingredient counts only as a delivery, never as a cleared
    /// or collected color.
    fn consume(
        &mut self,
        tile: &Tile,
        cell: CellCoord,
        matched: bool,
        delivered: &mut Vec<Ingredient>,
    ) {
        if let Some(ingredient) = self.delivery(tile, cell) {
            self.stats.record_delivered(ingredient);
            delivered.push(ingredient);
            return;
        }
        self.stats.record_cleared(tile.color());
        if matched {
            self.stats.record_collected(tile.color());
        }
    }

    fn pass_score(&self, trigger: PassTrigger, chain: u32, removed: usize) -> u64 {
        let removed = u64::try_from(removed).unwrap_or(u64::MAX);
        let base = removed.saturating_mul(self.config.base_points);
        match trigger {
            PassTrigger::Match => {
                let chained = base.saturating_mul(u64::from(chain));
                let streak_bonus = if chain >= 2 { chained / 2 } else { 0 };
                chained.saturating_add(streak_bonus)
            }
            PassTrigger::Combo(kind) => ComboKind::bonus(kind),
            PassTrigger::Activation => base,
        }
    }

    /// Compacts each column toward the bottom, skipping inert cells.
    fn apply_gravity(&mut self) {
        for column in 0..self.grid.columns() {
            let live: Vec<CellCoord> = self
                .grid
                .column_cells(column)
                .filter(|cell| !self.grid.is_inert(*cell))
                .collect();
            let tiles: Vec<(CellCoord, Tile)> = live
                .iter()
                .filter_map(|cell| self.grid.take_tile(*cell).map(|tile| (*cell, tile)))
                .collect();

            let vacant = live.len() - tiles.len();
            for (target, (origin, mut tile)) in live[vacant..].iter().zip(tiles) {
                if *target != origin {
                    tile.mark_falling();
                }
                self.grid.place_tile(*target, tile);
            }
        }
    }

    /// Fills every vacant live cell with a fresh random tile.
    ///
    /// The topmost refill of a column carries the next queued ingredient when
    /// the queue is waiting on that column.
    fn refill(&mut self) {
        for column in 0..self.grid.columns() {
            let vacant: Vec<CellCoord> = self
                .grid
                .column_cells(column)
                .filter(|cell| !self.grid.is_inert(*cell) && self.grid.tile(*cell).is_none())
                .collect();

            for (position, cell) in vacant.into_iter().enumerate() {
                let color = CandyColor::new(self.rng.gen_range(0..self.definition.colors));
                let mut tile = Tile::new(self.ids.allocate(), color);
                tile.mark_fresh();
                if position == 0
                    && self
                        .ingredient_queue
                        .front()
                        .map_or(false, |spawn| spawn.column == column)
                {
                    if let Some(spawn) = self.ingredient_queue.pop_front() {
                        tile.set_ingredient(Some(spawn.ingredient));
                    }
                }
                self.grid.place_tile(cell, tile);
            }
        }
    }
}
