#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative engine state for Candy Match.
//!
//! The world owns the board, the random source that refills it and the
//! allocator that names its tiles. Every mutation goes through either the
//! methods on [`World`] or the [`apply`] entry point; read access goes through
//! the [`query`] module.

mod cascade;
mod generation;
mod ids;
mod moves;

use std::collections::VecDeque;

use candy_match_core::{
    CascadePass, Command, Event, Grid, IngredientSpawn, LevelDefinition, LevelDefinitionError,
    LevelStats, LevelStatus, MoveOutcome, ObjectiveDelta, ReshuffleReport, Resolution, Tile,
};
use candy_match_system_deadlock::has_valid_move;
use candy_match_system_objectives::ObjectiveTracker;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use ids::TileIdAllocator;

/// Tunables of the engine that are not part of a level definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Points per removed tile before multipliers.
    pub base_points: u64,
    /// Boards generated before a deadlocked one is accepted.
    pub max_generation_attempts: u32,
    /// Match passes resolved in one settle before the loop gives up.
    pub max_cascade_passes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_points: 10,
            max_generation_attempts: 10,
            max_cascade_passes: 1_000,
        }
    }
}

/// Engine state of one level attempt.
#[derive(Debug)]
pub struct World<R = ChaCha8Rng> {
    definition: LevelDefinition,
    config: EngineConfig,
    grid: Grid,
    rng: R,
    ids: TileIdAllocator,
    stats: LevelStats,
    objectives: ObjectiveTracker,
    moves_remaining: u32,
    status: LevelStatus,
    ingredient_queue: VecDeque<IngredientSpawn>,
}

impl World<ChaCha8Rng> {
    /// Starts a level whose refills are drawn from a seeded ChaCha stream.
    pub fn seeded(definition: LevelDefinition, seed: u64) -> Result<Self, LevelDefinitionError> {
        Self::new_level(
            definition,
            ChaCha8Rng::seed_from_u64(seed),
            TileIdAllocator::new(),
        )
    }
}

impl<R: Rng> World<R> {
    /// Starts a level with a freshly generated board.
    pub fn new_level(
        definition: LevelDefinition,
        rng: R,
        ids: TileIdAllocator,
    ) -> Result<Self, LevelDefinitionError> {
        Self::with_config(definition, EngineConfig::default(), rng, ids)
    }

    /// Starts a level with a freshly generated board and custom tunables.
    pub fn with_config(
        definition: LevelDefinition,
        config: EngineConfig,
        rng: R,
        ids: TileIdAllocator,
    ) -> Result<Self, LevelDefinitionError> {
        definition.validate()?;
        let grid = blocker_template(&definition);
        let mut world = Self::assemble(definition, config, grid, rng, ids);
        world.deal_board();
        Ok(world)
    }

    /// Starts a level on a prepared board instead of a generated one.
    ///
    /// Blockers from the definition are laid over the board; inert ones
    /// displace the tile beneath them. The board is not settled first.
    pub fn with_grid(
        definition: LevelDefinition,
        mut grid: Grid,
        rng: R,
    ) -> Result<Self, LevelDefinitionError> {
        definition.validate()?;
        if grid.columns() != definition.columns || grid.rows() != definition.rows {
            return Err(LevelDefinitionError::GridMismatch {
                columns: definition.columns,
                rows: definition.rows,
                found_columns: grid.columns(),
                found_rows: grid.rows(),
            });
        }
        for placement in &definition.blockers {
            grid.set_blocker(placement.cell, Some(placement.blocker));
            if placement.blocker.is_inert() {
                let _ = grid.take_tile(placement.cell);
            }
        }
        let ids = TileIdAllocator::resume(&grid);
        Ok(Self::assemble(
            definition,
            EngineConfig::default(),
            grid,
            rng,
            ids,
        ))
    }

    fn assemble(
        definition: LevelDefinition,
        config: EngineConfig,
        grid: Grid,
        rng: R,
        ids: TileIdAllocator,
    ) -> Self {
        Self {
            objectives: ObjectiveTracker::new(&definition.objectives),
            moves_remaining: definition.move_budget,
            ingredient_queue: definition.ingredient_queue.iter().copied().collect(),
            status: LevelStatus::InProgress,
            stats: LevelStats::default(),
            definition,
            config,
            grid,
            rng,
            ids,
        }
    }

    /// Reports whether any adjacent swap on the current board is productive.
    #[must_use]
    pub fn has_valid_move(&self) -> bool {
        has_valid_move(&self.grid)
    }

    /// Regenerates the board in place without charging a move.
    pub fn reshuffle(&mut self) -> &Grid {
        let _ = self.reshuffle_board();
        &self.grid
    }

    /// Resolves any runs already on the board without charging a move.
    ///
    /// A settled board is left untouched and yields no passes.
    pub fn settle(&mut self) -> Vec<CascadePass> {
        let mut passes = Vec::new();
        self.settle_from(1, &mut passes);
        if !passes.is_empty() {
            let _ = self.refresh_progress();
        }
        passes
    }

    /// Throws the attempt away and starts the level again on a new board.
    ///
    /// The random source keeps its position, so the new board differs.
    pub fn restart(&mut self) {
        for tile in self.grid.tiles() {
            self.ids.release(tile.id());
        }
        self.grid = blocker_template(&self.definition);
        self.stats = LevelStats::default();
        self.objectives = ObjectiveTracker::new(&self.definition.objectives);
        self.moves_remaining = self.definition.move_budget;
        self.status = LevelStatus::InProgress;
        self.ingredient_queue = self.definition.ingredient_queue.iter().copied().collect();
        self.deal_board();
    }

    /// Fills the blocker template with the opening board of an attempt.
    fn deal_board(&mut self) {
        let report = self.regenerate();
        log::info!(
            "generated {}x{} board in {} attempt(s), valid move found: {}",
            self.grid.columns(),
            self.grid.rows(),
            report.attempts,
            report.valid_move_found
        );
    }

    /// Regenerates the board of an attempt in progress.
    pub(crate) fn reshuffle_board(&mut self) -> ReshuffleReport {
        let report = self.regenerate();
        log::info!(
            "reshuffled {}x{} board in {} attempt(s), valid move found: {}",
            self.grid.columns(),
            self.grid.rows(),
            report.attempts,
            report.valid_move_found
        );
        report
    }

    /// Replaces every tile while keeping blockers and on-board ingredients.
    fn regenerate(&mut self) -> ReshuffleReport {
        let ingredients: Vec<_> = self
            .grid
            .cells()
            .filter_map(|cell| {
                self.grid
                    .tile(cell)
                    .and_then(Tile::ingredient)
                    .map(|ingredient| (cell, ingredient))
            })
            .collect();
        for tile in self.grid.tiles() {
            self.ids.release(tile.id());
        }

        let (mut grid, report) = generation::generate_board(
            &self.grid,
            self.definition.colors,
            self.config.max_generation_attempts,
            &mut self.rng,
            &mut self.ids,
        );
        for (cell, ingredient) in ingredients {
            if let Some(tile) = grid.tile_mut(cell) {
                tile.set_ingredient(Some(ingredient));
            }
        }
        self.grid = grid;
        report
    }

    /// Recomputes objectives from the statistics and updates the status.
    fn refresh_progress(&mut self) -> Vec<ObjectiveDelta> {
        let deltas = self.objectives.refresh(&self.stats);
        self.status = self.objectives.status(self.moves_remaining);
        if self.status.is_finished() {
            log::info!(
                "level finished as {:?} with score {}",
                self.status,
                self.stats.score()
            );
        }
        deltas
    }
}

/// Board holding only the definition's blockers.
fn blocker_template(definition: &LevelDefinition) -> Grid {
    let mut grid = Grid::new(definition.columns, definition.rows);
    for placement in &definition.blockers {
        grid.set_blocker(placement.cell, Some(placement.blocker));
    }
    grid
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply<R: Rng>(world: &mut World<R>, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Swap { from, to } => match world.attempt_swap(from, to) {
            MoveOutcome::Rejected(reason) => {
                out_events.push(Event::SwapRejected { from, to, reason });
            }
            MoveOutcome::Reverted => out_events.push(Event::SwapReverted { from, to }),
            MoveOutcome::Resolved(resolution) => {
                push_resolution_events(&resolution, world.stats.score(), out_events);
            }
        },
        Command::Activate { cell, target_color } => {
            match world.manually_activate(cell, target_color) {
                MoveOutcome::Rejected(reason) => {
                    out_events.push(Event::ActivationRejected { cell, reason });
                }
                MoveOutcome::Reverted => {}
                MoveOutcome::Resolved(resolution) => {
                    push_resolution_events(&resolution, world.stats.score(), out_events);
                }
            }
        }
        Command::Reshuffle => {
            let report = world.reshuffle_board();
            out_events.push(Event::BoardReshuffled { report });
        }
        Command::Restart => {
            world.restart();
            out_events.push(Event::LevelRestarted {
                moves_remaining: world.moves_remaining,
            });
        }
    }
}

fn push_resolution_events(resolution: &Resolution, score: u64, out_events: &mut Vec<Event>) {
    if let Some(kind) = resolution.combo {
        out_events.push(Event::ComboTriggered {
            kind,
            bonus: kind.bonus(),
        });
    }
    for pass in &resolution.passes {
        out_events.push(Event::CascadeResolved { pass: pass.clone() });
    }
    out_events.push(Event::MoveCommitted {
        moves_remaining: resolution.moves_remaining,
        score,
        score_delta: resolution.score_delta,
    });
    if let Some(report) = resolution.reshuffle {
        out_events.push(Event::BoardReshuffled { report });
    }
    for delta in &resolution.objective_deltas {
        out_events.push(Event::ObjectiveProgressed { delta: *delta });
    }
    if resolution.status.is_finished() {
        out_events.push(Event::LevelFinished {
            status: resolution.status,
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use candy_match_core::{
        Grid, IngredientSpawn, LevelDefinition, LevelStats, LevelStatus, ObjectiveProgress,
    };

    use super::{EngineConfig, World};

    /// Provides read-only access to the board.
    #[must_use]
    pub fn grid<R>(world: &World<R>) -> &Grid {
        &world.grid
    }

    /// Definition the level was created from.
    #[must_use]
    pub fn definition<R>(world: &World<R>) -> &LevelDefinition {
        &world.definition
    }

    /// Tunables the engine runs with.
    #[must_use]
    pub fn config<R>(world: &World<R>) -> EngineConfig {
        world.config
    }

    /// Moves left in the budget.
    #[must_use]
    pub fn moves_remaining<R>(world: &World<R>) -> u32 {
        world.moves_remaining
    }

    /// Total score of the attempt.
    #[must_use]
    pub fn score<R>(world: &World<R>) -> u64 {
        world.stats.score()
    }

    /// Counters accumulated during the attempt.
    #[must_use]
    pub fn stats<R>(world: &World<R>) -> &LevelStats {
        &world.stats
    }

    /// Lifecycle state of the attempt.
    #[must_use]
    pub fn status<R>(world: &World<R>) -> LevelStatus {
        world.status
    }

    /// Progress of every objective in definition order.
    #[must_use]
    pub fn objectives<R>(world: &World<R>) -> &[ObjectiveProgress] {
        world.objectives.progress()
    }

    /// Ingredients still waiting to enter the board, in queue order.
    #[must_use]
    pub fn pending_ingredients<R>(world: &World<R>) -> Vec<IngredientSpawn> {
        world.ingredient_queue.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candy_match_core::{
        Blocker, BlockerPlacement, CandyColor, CellCoord, ComboKind, Ingredient, IngredientSpawn,
        MoveRejection, ObjectiveGoal, PassTrigger,
    };
    use candy_match_system_match_detection::has_match;

    fn definition(columns: u32, rows: u32) -> LevelDefinition {
        LevelDefinition {
            columns,
            rows,
            colors: 6,
            move_budget: 20,
            objectives: vec![ObjectiveGoal::Score { target: 1_000_000 }],
            blockers: Vec::new(),
            ingredient_queue: Vec::new(),
        }
    }

    fn fixture(layout: &str) -> World {
        let grid = Grid::parse(layout).expect("layout parses");
        let level = definition(grid.columns(), grid.rows());
        World::with_grid(level, grid, ChaCha8Rng::seed_from_u64(17)).expect("world builds")
    }

    #[test]
    fn seeded_level_starts_settled_and_full() {
        let mut level = definition(8, 8);
        level.blockers.push(BlockerPlacement {
            cell: CellCoord::new(3, 3),
            blocker: Blocker::Licorice,
        });
        let world = World::seeded(level, 99).expect("level builds");

        assert!(!has_match(query::grid(&world)));
        assert_eq!(query::grid(&world).live_tile_count(), 63);
        assert_eq!(query::moves_remaining(&world), 20);
        assert_eq!(query::status(&world), LevelStatus::InProgress);
    }

    #[test]
    fn invalid_definition_fails_fast() {
        let mut level = definition(8, 8);
        level.objectives.push(ObjectiveGoal::CollectColor {
            color: CandyColor::new(6),
            target: 5,
        });
        assert_eq!(
            World::seeded(level, 1).err(),
            Some(LevelDefinitionError::UnknownColor {
                objective: 1,
                color: 6
            })
        );
    }

    #[test]
    fn fixture_dimensions_must_match_definition() {
        let grid = Grid::parse("R G B").expect("layout parses");
        let error = World::with_grid(definition(4, 1), grid, ChaCha8Rng::seed_from_u64(1))
            .expect_err("mismatch");
        assert_eq!(
            error,
            LevelDefinitionError::GridMismatch {
                columns: 4,
                rows: 1,
                found_columns: 3,
                found_rows: 1,
            }
        );
    }

    #[test]
    fn out_of_bounds_and_inert_cells_are_rejected() {
        let mut world = fixture(
            "R G #
             G B R",
        );
        assert_eq!(
            world.attempt_swap(CellCoord::new(2, 1), CellCoord::new(3, 1)),
            MoveOutcome::Rejected(MoveRejection::OutOfBounds)
        );
        assert_eq!(
            world.attempt_swap(CellCoord::new(1, 0), CellCoord::new(2, 0)),
            MoveOutcome::Rejected(MoveRejection::InertCell)
        );
        assert_eq!(
            world.manually_activate(CellCoord::new(0, 0), Some(CandyColor::new(6))),
            MoveOutcome::Rejected(MoveRejection::UnknownColor)
        );
    }

    #[test]
    fn hammer_on_plain_tile_is_free() {
        let mut world = fixture(
            "R G B
             G B R
             B R G",
        );
        let outcome = world.manually_activate(CellCoord::new(1, 1), None);
        let MoveOutcome::Resolved(resolution) = outcome else {
            panic!("hammer resolves");
        };

        assert_eq!(resolution.moves_remaining, 20);
        assert_eq!(resolution.passes[0].trigger, PassTrigger::Activation);
        assert_eq!(resolution.passes[0].removed, vec![CellCoord::new(1, 1)]);
        assert_eq!(resolution.passes[0].score, 10);
    }

    #[test]
    fn activating_a_special_costs_a_move_and_clears_its_cell() {
        let mut world = fixture(
            "R G B
             G B- R
             B R G",
        );
        let outcome = world.manually_activate(CellCoord::new(1, 1), None);
        let MoveOutcome::Resolved(resolution) = outcome else {
            panic!("activation resolves");
        };

        assert_eq!(resolution.moves_remaining, 19);
        assert_eq!(
            resolution.passes[0].removed,
            vec![CellCoord::new(0, 1), CellCoord::new(1, 1), CellCoord::new(2, 1)]
        );
    }

    #[test]
    fn targeted_color_bomb_consumes_the_chosen_color() {
        let mut world = fixture(
            "R G B
             G P* R
             B R G",
        );
        let outcome = world.manually_activate(CellCoord::new(1, 1), Some(CandyColor::new(1)));
        let MoveOutcome::Resolved(resolution) = outcome else {
            panic!("activation resolves");
        };

        assert_eq!(
            resolution.passes[0].removed,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 1),
                CellCoord::new(2, 2),
            ]
        );
    }

    #[test]
    fn restart_restores_budget_and_counters() {
        let mut level = definition(6, 6);
        level.ingredient_queue.push(IngredientSpawn {
            column: 2,
            ingredient: Ingredient::Cherry,
        });
        let mut world = World::seeded(level, 5).expect("level builds");
        let swap = candy_match_system_deadlock::find_valid_move(query::grid(&world))
            .expect("generated board is playable");
        let _ = world.attempt_swap(swap.from, swap.to);
        assert!(query::score(&world) > 0);

        let mut events = Vec::new();
        apply(&mut world, Command::Restart, &mut events);

        assert_eq!(events, vec![Event::LevelRestarted { moves_remaining: 20 }]);
        assert_eq!(query::score(&world), 0);
        assert_eq!(query::moves_remaining(&world), 20);
        assert_eq!(query::pending_ingredients(&world).len(), 1);
        assert!(!has_match(query::grid(&world)));
        assert_eq!(query::grid(&world).live_tile_count(), 36);
    }

    #[test]
    fn reshuffle_keeps_blockers_and_ingredients() {
        let mut level = definition(5, 5);
        level.blockers = vec![
            BlockerPlacement {
                cell: CellCoord::new(0, 0),
                blocker: Blocker::Chocolate,
            },
            BlockerPlacement {
                cell: CellCoord::new(4, 4),
                blocker: Blocker::Ice { layers: 2 },
            },
        ];
        let mut world = World::seeded(level, 8).expect("level builds");
        if let Some(tile) = world.grid.tile_mut(CellCoord::new(2, 2)) {
            tile.set_ingredient(Some(Ingredient::Hazelnut));
        }

        let grid = world.reshuffle().clone();
        assert_eq!(grid.blocker(CellCoord::new(0, 0)), Some(Blocker::Chocolate));
        assert_eq!(grid.blocker(CellCoord::new(4, 4)), Some(Blocker::Ice { layers: 2 }));
        assert_eq!(
            grid.tile(CellCoord::new(2, 2)).and_then(Tile::ingredient),
            Some(Ingredient::Hazelnut)
        );
        assert_eq!(grid.live_tile_count(), 24);
        assert_eq!(world.ids.live_count(), 24);
    }

    #[test]
    fn stripe_pair_swap_fires_cross_combo() {
        let mut world = fixture(
            "R G B Y
             G B- R| P
             B R G Y
             Y P R G",
        );
        let outcome = world.attempt_swap(CellCoord::new(1, 1), CellCoord::new(2, 1));
        let MoveOutcome::Resolved(resolution) = outcome else {
            panic!("combo resolves");
        };

        assert_eq!(resolution.combo, Some(ComboKind::StripedPair));
        let first = &resolution.passes[0];
        assert_eq!(first.score, 1_500);
        // Row 1 and column 2, crossed at the cell the first tile moved onto.
        assert_eq!(first.removed.len(), 7);
        assert!(first.removed.contains(&CellCoord::new(2, 3)));
        assert!(first.removed.contains(&CellCoord::new(0, 1)));
        assert!(resolution.score_delta >= 1_500);
        assert_eq!(resolution.moves_remaining, 19);
    }
}
