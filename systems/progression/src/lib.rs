#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that derives campaign levels from a campaign seed.
//!
//! Every level plays on the same board. Later levels grant more moves and
//! demand a higher score, and each level draws its refills from its own
//! seed so replaying one level never depends on how earlier levels went.

use candy_match_core::{LevelDefinition, ObjectiveGoal};
use sha2::{Digest, Sha256};
use thiserror::Error;

const BOARD_COLUMNS: u32 = 8;
const BOARD_ROWS: u32 = 8;
const BOARD_COLORS: u8 = 6;

const FIRST_LEVEL_MOVES: u32 = 30;
const MOVES_PER_LEVEL: u32 = 5;
const FIRST_LEVEL_SCORE_TARGET: u64 = 1_000;
const SCORE_TARGET_PER_LEVEL: u64 = 500;

/// Sequence of score levels derived from one seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Campaign {
    seed: u64,
}

impl Campaign {
    /// Creates a campaign rooted at the provided seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed the campaign was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Builds the definition and refill seed of a one-based level number.
    pub fn level(&self, number: u32) -> Result<CampaignLevel, ProgressionError> {
        if number == 0 {
            return Err(ProgressionError::LevelZero);
        }

        let step = number - 1;
        let move_budget = FIRST_LEVEL_MOVES.saturating_add(step.saturating_mul(MOVES_PER_LEVEL));
        let target = FIRST_LEVEL_SCORE_TARGET
            .saturating_add(u64::from(step).saturating_mul(SCORE_TARGET_PER_LEVEL));

        Ok(CampaignLevel {
            number,
            definition: LevelDefinition {
                columns: BOARD_COLUMNS,
                rows: BOARD_ROWS,
                colors: BOARD_COLORS,
                move_budget,
                objectives: vec![ObjectiveGoal::Score { target }],
                blockers: Vec::new(),
                ingredient_queue: Vec::new(),
            },
            seed: derive_level_seed(self.seed, number),
        })
    }
}

/// Level produced by a [`Campaign`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignLevel {
    /// One-based level number.
    pub number: u32,
    /// Board, budget and objectives of the level.
    pub definition: LevelDefinition,
    /// Seed for the level's random source.
    pub seed: u64,
}

/// Errors raised while deriving campaign levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ProgressionError {
    /// Levels are numbered from one.
    #[error("campaign levels are numbered from 1")]
    LevelZero,
}

fn derive_level_seed(campaign_seed: u64, number: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(campaign_seed.to_le_bytes());
    hasher.update(number.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_level_matches_opening_configuration() {
        let level = Campaign::new(7).level(1).expect("level one");
        assert_eq!(level.definition.columns, 8);
        assert_eq!(level.definition.rows, 8);
        assert_eq!(level.definition.colors, 6);
        assert_eq!(level.definition.move_budget, 30);
        assert_eq!(
            level.definition.objectives,
            vec![ObjectiveGoal::Score { target: 1_000 }]
        );
        assert_eq!(level.definition.validate(), Ok(()));
    }

    #[test]
    fn later_levels_grow_budget_and_target() {
        let level = Campaign::new(7).level(4).expect("level four");
        assert_eq!(level.definition.move_budget, 45);
        assert_eq!(
            level.definition.objectives,
            vec![ObjectiveGoal::Score { target: 2_500 }]
        );
    }

    #[test]
    fn level_zero_is_rejected() {
        assert_eq!(Campaign::new(7).level(0), Err(ProgressionError::LevelZero));
    }

    #[test]
    fn level_seeds_are_stable_and_distinct() {
        let campaign = Campaign::new(0xfeed);
        let first = campaign.level(1).expect("level one").seed;
        let again = campaign.level(1).expect("level one").seed;
        let second = campaign.level(2).expect("level two").seed;
        let other = Campaign::new(0xbeef).level(1).expect("level one").seed;

        assert_eq!(first, again);
        assert_ne!(first, second);
        assert_ne!(first, other);
    }
}
