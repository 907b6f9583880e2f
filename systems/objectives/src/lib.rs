#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that tracks level objectives against accumulated statistics.
//!
//! The tracker never inspects the board. The world hands it the running
//! [`LevelStats`] after every settled move and receives the objectives whose
//! value changed, which it forwards as events.

use candy_match_core::{
    BlockerKind, LevelStats, LevelStatus, ObjectiveDelta, ObjectiveGoal, ObjectiveProgress,
};

/// Progress record for every objective of a level, in definition order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectiveTracker {
    progress: Vec<ObjectiveProgress>,
}

impl ObjectiveTracker {
    /// Creates a tracker with every objective at zero.
    #[must_use]
    pub fn new(goals: &[ObjectiveGoal]) -> Self {
        Self {
            progress: goals
                .iter()
                .map(|goal| ObjectiveProgress {
                    goal: *goal,
                    current: 0,
                })
                .collect(),
        }
    }

    /// Recomputes every objective from the statistics and reports the changes.
    ///
    /// Values never decrease: statistics only accumulate within a level.
    pub fn refresh(&mut self, stats: &LevelStats) -> Vec<ObjectiveDelta> {
        let mut deltas = Vec::new();
        for (index, entry) in self.progress.iter_mut().enumerate() {
            let after = current_value(&entry.goal, stats).max(entry.current);
            if after != entry.current {
                deltas.push(ObjectiveDelta {
                    index,
                    before: entry.current,
                    after,
                    target: entry.goal.target(),
                });
                entry.current = after;
            }
        }
        deltas
    }

    /// Current progress of every objective.
    #[must_use]
    pub fn progress(&self) -> &[ObjectiveProgress] {
        &self.progress
    }

    /// Reports whether every objective met its target.
    #[must_use]
    pub fn all_satisfied(&self) -> bool {
        self.progress.iter().all(ObjectiveProgress::is_satisfied)
    }

    /// Level status implied by the objectives and the remaining budget.
    ///
    /// Satisfying every objective wins even when the final move exhausted
    /// the budget.
    #[must_use]
    pub fn status(&self, moves_remaining: u32) -> LevelStatus {
        if self.all_satisfied() {
            LevelStatus::Won
        } else if moves_remaining == 0 {
            LevelStatus::Lost
        } else {
            LevelStatus::InProgress
        }
    }
}

/// Value the statistics currently contribute to the goal.
#[must_use]
pub fn current_value(goal: &ObjectiveGoal, stats: &LevelStats) -> u64 {
    match *goal {
        ObjectiveGoal::Score { .. } => stats.score(),
        ObjectiveGoal::ClearColor { color, .. } => stats.cleared(color),
        ObjectiveGoal::ClearJelly { .. } => stats.blockers_cleared(BlockerKind::Jelly),
        ObjectiveGoal::ClearIce { .. } => stats.blockers_cleared(BlockerKind::Ice),
        ObjectiveGoal::ClearChocolate { .. } => stats.blockers_cleared(BlockerKind::Chocolate),
        ObjectiveGoal::ClearAnyBlocker { .. } => stats.total_blockers_cleared(),
        ObjectiveGoal::DropIngredient { ingredient, .. } => stats.delivered(ingredient),
        ObjectiveGoal::CollectColor { color, .. } => stats.collected(color),
    }
}
