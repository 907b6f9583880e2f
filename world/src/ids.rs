use std::collections::BTreeSet;

use candy_match_core::{Grid, TileId};

/// Hands out tile identifiers, reusing released ones smallest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileIdAllocator {
    next: u32,
    released: BTreeSet<TileId>,
}

impl TileIdAllocator {
    /// Creates an allocator that starts counting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator that never collides with the tiles on the grid.
    ///
    /// Gaps below the largest identifier in use are treated as released.
    #[must_use]
    pub fn resume(grid: &Grid) -> Self {
        let in_use: BTreeSet<TileId> = grid.tiles().map(|tile| tile.id()).collect();
        let next = in_use
            .iter()
            .next_back()
            .map_or(0, |id| id.get().saturating_add(1));
        let released = (0..next)
            .map(TileId::new)
            .filter(|id| !in_use.contains(id))
            .collect();
        Self { next, released }
    }

    /// Returns the smallest released identifier, or a never-used one.
    pub fn allocate(&mut self) -> TileId {
        if let Some(id) = self.released.pop_first() {
            return id;
        }
        let id = TileId::new(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Makes the identifier available again.
    pub fn release(&mut self, id: TileId) {
        if id.get() < self.next {
            let _ = self.released.insert(id);
        }
    }

    /// Number of identifiers currently handed out.
    #[must_use]
    pub fn live_count(&self) -> usize {
        usize::try_from(self.next).unwrap_or(usize::MAX) - self.released.len()
    }
}
