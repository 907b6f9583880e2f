#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Candy Match engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired moves, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! changed. Systems read the [`Grid`] and [`LevelStats`] without mutating them
//! and answer with plain data the world folds back into its state.

mod grid;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use grid::{Grid, GridParseError};

/// Smallest palette that still lets board generation avoid immediate runs.
pub const MIN_PALETTE_SIZE: u8 = 3;

/// Largest palette the engine can name with a single layout letter.
pub const MAX_PALETTE_SIZE: u8 = 6;

const PALETTE_LETTERS: [char; MAX_PALETTE_SIZE as usize] = ['R', 'G', 'B', 'Y', 'P', 'O'];

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests that the tiles at two orthogonally adjacent cells trade places.
    Swap {
        /// Cell selected first by the player.
        from: CellCoord,
        /// Cell the first tile is moved onto.
        to: CellCoord,
    },
    /// Requests that a booster activates the tile at the provided cell.
    Activate {
        /// Cell holding the tile to activate.
        cell: CellCoord,
        /// Color a color bomb should consume instead of its own.
        target_color: Option<CandyColor>,
    },
    /// Requests that the board is regenerated without charging a move.
    Reshuffle,
    /// Requests that the level restarts from its definition.
    Restart,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Reports that a swap request was rejected without mutating the board.
    SwapRejected {
        /// Cell selected first by the player.
        from: CellCoord,
        /// Cell the first tile would have moved onto.
        to: CellCoord,
        /// Specific reason the swap failed.
        reason: MoveRejection,
    },
    /// Reports that a booster activation was rejected without mutating the board.
    ActivationRejected {
        /// Cell targeted by the activation.
        cell: CellCoord,
        /// Specific reason the activation failed.
        reason: MoveRejection,
    },
    /// Reports that a swap produced neither a match nor a combo and was undone.
    SwapReverted {
        /// Cell selected first by the player.
        from: CellCoord,
        /// Cell the first tile briefly moved onto.
        to: CellCoord,
    },
    /// Announces that two swapped tiles interacted as a special combo.
    ComboTriggered {
        /// Combo rule that fired.
        kind: ComboKind,
        /// Flat bonus awarded for the combo.
        bonus: u64,
    },
    /// Describes one completed cascade pass in resolution order.
    CascadeResolved {
        /// Snapshot of what the pass removed, spawned and scored.
        pass: CascadePass,
    },
    /// Confirms that a move was charged and the board settled.
    MoveCommitted {
        /// Moves left in the level budget after the charge.
        moves_remaining: u32,
        /// Total level score after the move.
        score: u64,
        /// Points earned by the move alone.
        score_delta: u64,
    },
    /// Informs the presentation layer that the board was reshuffled.
    BoardReshuffled {
        /// Outcome of the bounded regeneration loop.
        report: ReshuffleReport,
    },
    /// Reports that an objective's progress changed.
    ObjectiveProgressed {
        /// Before/after view of the objective.
        delta: ObjectiveDelta,
    },
    /// Announces that the level reached a terminal state.
    LevelFinished {
        /// Whether the level was won or lost.
        status: LevelStatus,
    },
    /// Confirms that the level was restarted from its definition.
    LevelRestarted {
        /// Move budget granted to the fresh attempt.
        moves_remaining: u32,
    },
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Row zero is the top of the board; gravity pulls toward increasing rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Reports whether the two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// Identifier assigned to a tile for the lifetime of a session.
///
/// Identifiers are unique among the tiles currently on the board and are only
/// handed out again after the tile that held them was removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index into the level's candy palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandyColor(u8);

impl CandyColor {
    /// Creates a color from its palette index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Palette index of the color.
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.0
    }

    /// Single-letter name used by text layouts, if the index has one.
    #[must_use]
    pub fn letter(&self) -> Option<char> {
        PALETTE_LETTERS.get(usize::from(self.0)).copied()
    }

    /// Resolves a layout letter back into a palette color.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        PALETTE_LETTERS
            .iter()
            .position(|candidate| *candidate == letter)
            .and_then(|index| u8::try_from(index).ok())
            .map(Self)
    }
}

/// Special behaviour carried by a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialKind {
    /// Clears its whole row when activated.
    StripedHorizontal,
    /// Clears its whole column when activated.
    StripedVertical,
    /// Clears the 3×3 block around itself when activated.
    Wrapped,
    /// Clears every tile of one color when activated.
    ColorBomb,
}

impl SpecialKind {
    /// Reports whether the special clears a full line.
    #[must_use]
    pub const fn is_striped(self) -> bool {
        matches!(self, Self::StripedHorizontal | Self::StripedVertical)
    }

    /// Suffix appended to the color letter in text layouts.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::StripedHorizontal => '-',
            Self::StripedVertical => '|',
            Self::Wrapped => '@',
            Self::ColorBomb => '*',
        }
    }

    /// Resolves a layout suffix back into a special kind.
    #[must_use]
    pub const fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '-' => Some(Self::StripedHorizontal),
            '|' => Some(Self::StripedVertical),
            '@' => Some(Self::Wrapped),
            '*' => Some(Self::ColorBomb),
            _ => None,
        }
    }

    /// Relative strength used when two spawns compete for one cell.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::StripedHorizontal | Self::StripedVertical => 1,
            Self::Wrapped => 2,
            Self::ColorBomb => 3,
        }
    }
}

/// Ingredient carried by a tile until it is delivered at the bottom row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ingredient {
    /// Cherry ingredient.
    Cherry,
    /// Hazelnut ingredient.
    Hazelnut,
}

/// Live candy occupying a grid cell.
///
/// Empty cells are represented by the absence of a tile, so a tile always
/// carries a palette color.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    id: TileId,
    color: CandyColor,
    special: Option<SpecialKind>,
    ingredient: Option<Ingredient>,
    fresh: bool,
    falling: bool,
}

impl Tile {
    /// Creates a plain tile with the provided identity and color.
    #[must_use]
    pub const fn new(id: TileId, color: CandyColor) -> Self {
        Self {
            id,
            color,
            special: None,
            ingredient: None,
            fresh: false,
            falling: false,
        }
    }

    /// Creates a special tile with the provided identity, color and kind.
    #[must_use]
    pub const fn special(id: TileId, color: CandyColor, kind: SpecialKind) -> Self {
        Self {
            id,
            color,
            special: Some(kind),
            ingredient: None,
            fresh: false,
            falling: false,
        }
    }

    /// Identifier of the tile.
    #[must_use]
    pub const fn id(&self) -> TileId {
        self.id
    }

    /// Palette color of the tile.
    #[must_use]
    pub const fn color(&self) -> CandyColor {
        self.color
    }

    /// Special behaviour carried by the tile, if any.
    #[must_use]
    pub const fn special_kind(&self) -> Option<SpecialKind> {
        self.special
    }

    /// Ingredient marker carried by the tile, if any.
    #[must_use]
    pub const fn ingredient(&self) -> Option<Ingredient> {
        self.ingredient
    }

    /// Indicates that the tile was spawned during the latest pass.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Indicates that gravity moved the tile during the latest pass.
    #[must_use]
    pub const fn is_falling(&self) -> bool {
        self.falling
    }

    /// Attaches or removes the special behaviour.
    pub fn set_special(&mut self, special: Option<SpecialKind>) {
        self.special = special;
    }

    /// Attaches or removes the ingredient marker.
    pub fn set_ingredient(&mut self, ingredient: Option<Ingredient>) {
        self.ingredient = ingredient;
    }

    /// Flags the tile as newly spawned.
    pub fn mark_fresh(&mut self) {
        self.fresh = true;
    }

    /// Flags the tile as moved by gravity.
    pub fn mark_falling(&mut self) {
        self.falling = true;
    }

    /// Clears the presentation flags.
    pub fn clear_flags(&mut self) {
        self.fresh = false;
        self.falling = false;
    }
}

/// Obstacle overlaying a grid cell independently of its tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Blocker {
    /// Ice over a live tile, cracked by adjacent clears.
    Ice {
        /// Remaining layers, one or two.
        layers: u8,
    },
    /// Chocolate filling an inert cell.
    Chocolate,
    /// Licorice filling an inert cell.
    Licorice,
    /// Jelly under a live tile, removed when that tile is cleared.
    Jelly,
}

impl Blocker {
    /// Kind of the blocker with layer information stripped.
    #[must_use]
    pub const fn kind(self) -> BlockerKind {
        match self {
            Self::Ice { .. } => BlockerKind::Ice,
            Self::Chocolate => BlockerKind::Chocolate,
            Self::Licorice => BlockerKind::Licorice,
            Self::Jelly => BlockerKind::Jelly,
        }
    }

    /// Reports whether the blocker replaces the tile in its cell.
    #[must_use]
    pub const fn is_inert(self) -> bool {
        matches!(self, Self::Chocolate | Self::Licorice)
    }
}

/// Blocker categories used for counting and objectives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockerKind {
    /// Ice of any thickness.
    Ice,
    /// Chocolate.
    Chocolate,
    /// Licorice.
    Licorice,
    /// Jelly.
    Jelly,
}

/// Blocker placed on a cell by the level layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerPlacement {
    /// Cell receiving the blocker.
    pub cell: CellCoord,
    /// Blocker placed on the cell.
    pub blocker: Blocker,
}

/// Queued ingredient that enters the board with the next refill of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientSpawn {
    /// Column whose refill carries the ingredient.
    pub column: u32,
    /// Ingredient attached to the refilled tile.
    pub ingredient: Ingredient,
}

/// Goal a level sets for the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveGoal {
    /// Reach the score target.
    Score {
        /// Points required.
        target: u64,
    },
    /// Clear tiles of one color by any means.
    ClearColor {
        /// Color to clear.
        color: CandyColor,
        /// Tiles required.
        target: u64,
    },
    /// Remove jelly blockers.
    ClearJelly {
        /// Blockers required.
        target: u64,
    },
    /// Remove ice blockers completely.
    ClearIce {
        /// Blockers required.
        target: u64,
    },
    /// Remove chocolate blockers.
    ClearChocolate {
        /// Blockers required.
        target: u64,
    },
    /// Remove blockers of any kind.
    ClearAnyBlocker {
        /// Blockers required.
        target: u64,
    },
    /// Deliver ingredients to the bottom row.
    DropIngredient {
        /// Ingredient to deliver.
        ingredient: Ingredient,
        /// Deliveries required.
        target: u64,
    },
    /// Collect tiles of one color that were part of a matched run.
    CollectColor {
        /// Color to collect.
        color: CandyColor,
        /// Tiles required.
        target: u64,
    },
}

impl ObjectiveGoal {
    /// Amount the objective requires.
    #[must_use]
    pub const fn target(&self) -> u64 {
        match *self {
            Self::Score { target }
            | Self::ClearColor { target, .. }
            | Self::ClearJelly { target }
            | Self::ClearIce { target }
            | Self::ClearChocolate { target }
            | Self::ClearAnyBlocker { target }
            | Self::DropIngredient { target, .. }
            | Self::CollectColor { target, .. } => target,
        }
    }

    /// Palette color referenced by the objective, if any.
    #[must_use]
    pub const fn color(&self) -> Option<CandyColor> {
        match *self {
            Self::ClearColor { color, .. } | Self::CollectColor { color, .. } => Some(color),
            _ => None,
        }
    }
}

/// Current progress of a single objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectiveProgress {
    /// Goal being tracked.
    pub goal: ObjectiveGoal,
    /// Value accumulated so far.
    pub current: u64,
}

impl ObjectiveProgress {
    /// Amount the objective requires.
    #[must_use]
    pub const fn target(&self) -> u64 {
        self.goal.target()
    }

    /// Reports whether the accumulated value meets the target.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.current >= self.goal.target()
    }
}

/// Change of one objective caused by a single move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectiveDelta {
    /// Position of the objective in the level definition.
    pub index: usize,
    /// Value before the move.
    pub before: u64,
    /// Value after the move.
    pub after: u64,
    /// Amount the objective requires.
    pub target: u64,
}

/// Static description of a level supplied by the level-definition collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Number of columns on the board.
    pub columns: u32,
    /// Number of rows on the board.
    pub rows: u32,
    /// Number of palette colors used when generating tiles.
    pub colors: u8,
    /// Moves granted to the player.
    pub move_budget: u32,
    /// Goals that must all be satisfied to win.
    pub objectives: Vec<ObjectiveGoal>,
    /// Blockers placed before the first tile is generated.
    #[serde(default)]
    pub blockers: Vec<BlockerPlacement>,
    /// Ingredients entering the board in queue order.
    #[serde(default)]
    pub ingredient_queue: Vec<IngredientSpawn>,
}

impl LevelDefinition {
    /// Checks the definition for content bugs before a level is built from it.
    pub fn validate(&self) -> Result<(), LevelDefinitionError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(LevelDefinitionError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }

        if !(MIN_PALETTE_SIZE..=MAX_PALETTE_SIZE).contains(&self.colors) {
            return Err(LevelDefinitionError::PaletteSize(self.colors));
        }

        if self.move_budget == 0 {
            return Err(LevelDefinitionError::NoMoves);
        }

        if self.objectives.is_empty() {
            return Err(LevelDefinitionError::NoObjectives);
        }

        let mut occupied = BTreeMap::new();
        for placement in &self.blockers {
            let cell = placement.cell;
            if cell.column() >= self.columns || cell.row() >= self.rows {
                return Err(LevelDefinitionError::BlockerOutOfBounds(cell));
            }
            if let Blocker::Ice { layers } = placement.blocker {
                if !(1..=2).contains(&layers) {
                    return Err(LevelDefinitionError::IceLayers { cell, layers });
                }
            }
            if occupied.insert(cell, placement.blocker).is_some() {
                return Err(LevelDefinitionError::DuplicateBlocker(cell));
            }
        }

        for (index, goal) in self.objectives.iter().enumerate() {
            if let Some(color) = goal.color() {
                if color.index() >= self.colors {
                    return Err(LevelDefinitionError::UnknownColor {
                        objective: index,
                        color: color.index(),
                    });
                }
            }
        }

        for spawn in &self.ingredient_queue {
            if spawn.column >= self.columns {
                return Err(LevelDefinitionError::IngredientColumn(spawn.column));
            }
        }

        Ok(())
    }
}

/// Reasons a level definition is rejected when a level is created.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelDefinitionError {
    /// The grid has no cells.
    #[error("grid must have at least one cell, got {columns}x{rows}")]
    EmptyGrid {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The palette cannot generate a board without immediate runs.
    #[error("palette size {0} is outside the supported range 3..=6")]
    PaletteSize(u8),
    /// The move budget is zero.
    #[error("move budget must be positive")]
    NoMoves,
    /// The level has nothing to win.
    #[error("level must declare at least one objective")]
    NoObjectives,
    /// A blocker lies outside the grid.
    #[error("blocker at ({}, {}) lies outside the grid", .0.column(), .0.row())]
    BlockerOutOfBounds(CellCoord),
    /// Two blockers share one cell.
    #[error("cell ({}, {}) holds more than one blocker", .0.column(), .0.row())]
    DuplicateBlocker(CellCoord),
    /// Ice declares an unsupported number of layers.
    #[error("ice at ({}, {}) has {layers} layers, expected 1 or 2", .cell.column(), .cell.row())]
    IceLayers {
        /// Cell holding the ice.
        cell: CellCoord,
        /// Declared layer count.
        layers: u8,
    },
    /// An objective references a color outside the palette.
    #[error("objective {objective} references color {color} outside the palette")]
    UnknownColor {
        /// Position of the offending objective.
        objective: usize,
        /// Referenced palette index.
        color: u8,
    },
    /// An ingredient is queued for a column outside the grid.
    #[error("ingredient queued for column {0} outside the grid")]
    IngredientColumn(u32),
    /// A supplied grid does not match the definition's dimensions.
    #[error("grid is {found_columns}x{found_rows} but the level declares {columns}x{rows}")]
    GridMismatch {
        /// Declared column count.
        columns: u32,
        /// Declared row count.
        rows: u32,
        /// Column count of the supplied grid.
        found_columns: u32,
        /// Row count of the supplied grid.
        found_rows: u32,
    },
}

/// Running counters accumulated while a level is played.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelStats {
    score: u64,
    cleared_by_color: BTreeMap<CandyColor, u64>,
    collected_by_color: BTreeMap<CandyColor, u64>,
    blockers_cleared: BTreeMap<BlockerKind, u64>,
    ingredients_delivered: BTreeMap<Ingredient, u64>,
}

impl LevelStats {
    /// Total score earned so far.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Tiles of the color removed by any means.
    #[must_use]
    pub fn cleared(&self, color: CandyColor) -> u64 {
        self.cleared_by_color.get(&color).copied().unwrap_or(0)
    }

    /// Tiles of the color removed as part of a matched run.
    #[must_use]
    pub fn collected(&self, color: CandyColor) -> u64 {
        self.collected_by_color.get(&color).copied().unwrap_or(0)
    }

    /// Blockers of the kind removed completely.
    #[must_use]
    pub fn blockers_cleared(&self, kind: BlockerKind) -> u64 {
        self.blockers_cleared.get(&kind).copied().unwrap_or(0)
    }

    /// Blockers of every kind removed completely.
    #[must_use]
    pub fn total_blockers_cleared(&self) -> u64 {
        self.blockers_cleared.values().sum()
    }

    /// Ingredients of the kind delivered to the bottom row.
    #[must_use]
    pub fn delivered(&self, ingredient: Ingredient) -> u64 {
        self.ingredients_delivered
            .get(&ingredient)
            .copied()
            .unwrap_or(0)
    }

    /// Adds points to the running score.
    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    /// Counts a removed tile of the color.
    pub fn record_cleared(&mut self, color: CandyColor) {
        *self.cleared_by_color.entry(color).or_insert(0) += 1;
    }

    /// Counts a matched tile of the color.
    pub fn record_collected(&mut self, color: CandyColor) {
        *self.collected_by_color.entry(color).or_insert(0) += 1;
    }

    /// Counts a blocker that was removed completely.
    pub fn record_blocker_cleared(&mut self, kind: BlockerKind) {
        *self.blockers_cleared.entry(kind).or_insert(0) += 1;
    }

    /// Counts a delivered ingredient.
    pub fn record_delivered(&mut self, ingredient: Ingredient) {
        *self.ingredients_delivered.entry(ingredient).or_insert(0) += 1;
    }
}

/// Lifecycle state of a level attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelStatus {
    /// Moves remain and at least one objective is unmet.
    InProgress,
    /// Every objective was satisfied.
    Won,
    /// The move budget ran out before every objective was satisfied.
    Lost,
}

impl LevelStatus {
    /// Reports whether the level accepts no further moves.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Special tile a detected run asks the resolver to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpecialSpawn {
    /// Cell receiving the special tile.
    pub cell: CellCoord,
    /// Kind of special tile to create.
    pub special: SpecialKind,
    /// Color of the run that produced it.
    pub color: CandyColor,
}

/// Interaction rules fired when a swap involves special tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComboKind {
    /// Two color bombs clear the whole board.
    ColorBombPair,
    /// A color bomb turns every tile of the striped tile's color into a cross sweep.
    ColorBombStriped,
    /// Two striped tiles clear a cross through the swap position.
    StripedPair,
    /// Two wrapped tiles clear the 5×5 block around the swap position.
    WrappedPair,
    /// A color bomb clears every tile of the partner's color.
    ColorBombPlain,
    /// A striped or wrapped tile activates next to a plain partner.
    SpecialPlain,
}

impl ComboKind {
    /// Flat bonus awarded when the combo fires.
    #[must_use]
    pub const fn bonus(self) -> u64 {
        match self {
            Self::ColorBombPair => 5_000,
            Self::ColorBombStriped => 3_000,
            Self::WrappedPair => 2_000,
            Self::StripedPair => 1_500,
            Self::ColorBombPlain => 1_000,
            Self::SpecialPlain => 200,
        }
    }
}

/// What started a cascade pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassTrigger {
    /// Runs reported by the match detector.
    Match,
    /// The destruction set of a swap combo.
    Combo(ComboKind),
    /// A booster activation.
    Activation,
}

/// Blocker touched during a cascade pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockerChange {
    /// Cell holding the blocker.
    pub cell: CellCoord,
    /// Kind of blocker touched.
    pub kind: BlockerKind,
    /// Layers left afterwards; zero means the blocker is gone.
    pub remaining_layers: u8,
}

/// Per-pass snapshot the presentation layer may replay.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CascadePass {
    /// One-based position of the pass within the move.
    pub index: u32,
    /// What started the pass.
    pub trigger: PassTrigger,
    /// Chain multiplier applied to the pass score.
    pub chain: u32,
    /// Cells in the removal set, row-major.
    pub removed: Vec<CellCoord>,
    /// Special tiles created by the pass.
    pub spawned: Vec<SpecialSpawn>,
    /// Blockers damaged or destroyed by the pass.
    pub blockers: Vec<BlockerChange>,
    /// Ingredients delivered by the pass.
    pub delivered: Vec<Ingredient>,
    /// Points earned by the pass.
    pub score: u64,
}

/// Outcome of the bounded board regeneration loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReshuffleReport {
    /// Number of boards generated.
    pub attempts: u32,
    /// Whether the accepted board offers a valid move.
    pub valid_move_found: bool,
}

/// Reasons a swap or activation is refused without touching the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// A referenced cell lies outside the grid.
    OutOfBounds,
    /// The two cells do not share an edge.
    NotAdjacent,
    /// A referenced cell holds no live tile.
    InertCell,
    /// The move budget is exhausted.
    NoMovesRemaining,
    /// The level already ended.
    LevelFinished,
    /// The requested target color is outside the palette.
    UnknownColor,
}

/// Everything an accepted move changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Settled board after the move.
    pub grid: Grid,
    /// Points earned by the move.
    pub score_delta: u64,
    /// Objectives whose progress changed.
    pub objective_deltas: Vec<ObjectiveDelta>,
    /// Cascade passes in resolution order.
    pub passes: Vec<CascadePass>,
    /// Combo rule fired by the swap, if any.
    pub combo: Option<ComboKind>,
    /// Reshuffle performed after settling, if the board deadlocked.
    pub reshuffle: Option<ReshuffleReport>,
    /// Moves left after the move.
    pub moves_remaining: u32,
    /// Level state after the move.
    pub status: LevelStatus,
}

/// Result of a swap or activation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The request was invalid; nothing changed.
    Rejected(MoveRejection),
    /// The swap produced nothing and was undone without charging a move.
    Reverted,
    /// The request was accepted and the board settled.
    Resolved(Box<Resolution>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn definition() -> LevelDefinition {
        LevelDefinition {
            columns: 8,
            rows: 8,
            colors: 6,
            move_budget: 30,
            objectives: vec![ObjectiveGoal::Score { target: 1_000 }],
            blockers: Vec::new(),
            ingredient_queue: Vec::new(),
        }
    }

    #[test]
    fn adjacency_requires_shared_edge() {
        let origin = CellCoord::new(2, 2);
        assert!(origin.is_adjacent(CellCoord::new(3, 2)));
        assert!(origin.is_adjacent(CellCoord::new(2, 1)));
        assert!(!origin.is_adjacent(CellCoord::new(3, 3)));
        assert!(!origin.is_adjacent(origin));
    }

    #[test]
    fn palette_letters_round_trip() {
        for index in 0..MAX_PALETTE_SIZE {
            let color = CandyColor::new(index);
            let letter = color.letter().expect("palette letter");
            assert_eq!(CandyColor::from_letter(letter), Some(color));
        }
        assert_eq!(CandyColor::new(MAX_PALETTE_SIZE).letter(), None);
    }

    #[test]
    fn level_definition_round_trips_through_bincode() {
        let mut level = definition();
        level.blockers.push(BlockerPlacement {
            cell: CellCoord::new(1, 2),
            blocker: Blocker::Ice { layers: 2 },
        });
        level.ingredient_queue.push(IngredientSpawn {
            column: 3,
            ingredient: Ingredient::Cherry,
        });
        assert_round_trip(&level);
    }

    #[test]
    fn move_rejection_round_trips_through_bincode() {
        assert_round_trip(&MoveRejection::NotAdjacent);
    }

    #[test]
    fn valid_definition_passes() {
        assert_eq!(definition().validate(), Ok(()));
    }

    #[test]
    fn blocker_outside_grid_is_rejected() {
        let mut level = definition();
        level.blockers.push(BlockerPlacement {
            cell: CellCoord::new(8, 0),
            blocker: Blocker::Jelly,
        });
        assert_eq!(
            level.validate(),
            Err(LevelDefinitionError::BlockerOutOfBounds(CellCoord::new(8, 0)))
        );
    }

    #[test]
    fn duplicate_blocker_is_rejected() {
        let mut level = definition();
        let cell = CellCoord::new(4, 4);
        level.blockers.push(BlockerPlacement {
            cell,
            blocker: Blocker::Jelly,
        });
        level.blockers.push(BlockerPlacement {
            cell,
            blocker: Blocker::Chocolate,
        });
        assert_eq!(
            level.validate(),
            Err(LevelDefinitionError::DuplicateBlocker(cell))
        );
    }

    #[test]
    fn objective_color_outside_palette_is_rejected() {
        let mut level = definition();
        level.colors = 4;
        level.objectives.push(ObjectiveGoal::ClearColor {
            color: CandyColor::new(5),
            target: 10,
        });
        assert_eq!(
            level.validate(),
            Err(LevelDefinitionError::UnknownColor {
                objective: 1,
                color: 5
            })
        );
    }

    #[test]
    fn thin_palette_is_rejected() {
        let mut level = definition();
        level.colors = 2;
        assert_eq!(level.validate(), Err(LevelDefinitionError::PaletteSize(2)));
    }

    #[test]
    fn error_messages_name_the_cell() {
        let error = LevelDefinitionError::IceLayers {
            cell: CellCoord::new(1, 3),
            layers: 4,
        };
        assert_eq!(
            error.to_string(),
            "ice at (1, 3) has 4 layers, expected 1 or 2"
        );
    }

    #[test]
    fn stats_accumulate_per_kind() {
        let mut stats = LevelStats::default();
        stats.record_blocker_cleared(BlockerKind::Jelly);
        stats.record_blocker_cleared(BlockerKind::Jelly);
        stats.record_blocker_cleared(BlockerKind::Ice);
        stats.record_cleared(CandyColor::new(2));
        stats.add_score(120);

        assert_eq!(stats.blockers_cleared(BlockerKind::Jelly), 2);
        assert_eq!(stats.total_blockers_cleared(), 3);
        assert_eq!(stats.cleared(CandyColor::new(2)), 1);
        assert_eq!(stats.cleared(CandyColor::new(3)), 0);
        assert_eq!(stats.score(), 120);
    }
}
