//! Ordered windows of generated tiles shared by the background and platform generators.
//!
//! A window only ever grows at the top and shrinks at the bottom, so the tiles
//! it holds stay contiguous and sorted by height in spawn order.

use std::collections::VecDeque;

use glam::Vec2;

use crate::{InstanceId, PrefabKey};

/// Generated background or platform tile tracked by a window.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnedTile {
    instance: InstanceId,
    prefab: PrefabKey,
    position: Vec2,
    height: f32,
    has_item: bool,
    attachments: Vec<InstanceId>,
}

impl SpawnedTile {
    /// Creates a tile for a freshly instantiated prefab.
    #[must_use]
    pub fn new(instance: InstanceId, prefab: PrefabKey, position: Vec2, height: f32) -> Self {
        Self {
            instance,
            prefab,
            position,
            height,
            has_item: false,
            attachments: Vec::new(),
        }
    }

    /// Scene instance backing the tile.
    #[must_use]
    pub const fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Prefab the tile was instantiated from.
    #[must_use]
    pub fn prefab(&self) -> &PrefabKey {
        &self.prefab
    }

    /// Spawn position of the tile centre.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Vertical centre of the tile.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.position.y
    }

    /// Vertical extent of the tile.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Height of the tile's upper edge.
    #[must_use]
    pub fn top_edge(&self) -> f32 {
        self.position.y + self.height * 0.5
    }

    /// Whether an item has been attached to the tile.
    #[must_use]
    pub const fn has_item(&self) -> bool {
        self.has_item
    }

    /// Records an attached item owned by the tile.
    ///
    /// A tile carries at most one item; later attachments are refused.
    pub fn attach(&mut self, child: InstanceId) -> bool {
        if self.has_item {
            return false;
        }
        self.has_item = true;
        self.attachments.push(child);
        true
    }

    /// Marks the tile as taken without attaching anything to it.
    pub fn claim(&mut self) {
        self.has_item = true;
    }

    /// Items owned by the tile.
    #[must_use]
    pub fn attachments(&self) -> &[InstanceId] {
        &self.attachments
    }
}

/// Contiguous, bottom-to-top sequence of tiles.
#[derive(Clone, Debug, Default)]
pub struct TileWindow {
    tiles: VecDeque<SpawnedTile>,
}

impl TileWindow {
    /// Creates an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the window holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Lowest tile in the window.
    #[must_use]
    pub fn bottom(&self) -> Option<&SpawnedTile> {
        self.tiles.front()
    }

    /// Highest tile in the window.
    #[must_use]
    pub fn top(&self) -> Option<&SpawnedTile> {
        self.tiles.back()
    }

    /// Appends a tile above the current top tile.
    pub fn push_top(&mut self, tile: SpawnedTile) {
        debug_assert!(
            self.top().map_or(true, |top| top.y() < tile.y()),
            "tiles must be pushed in increasing height order"
        );
        self.tiles.push_back(tile);
    }

    /// Removes the lowest tile.
    pub fn pop_bottom(&mut self) -> Option<SpawnedTile> {
        self.tiles.pop_front()
    }

    /// Removes tiles from the bottom for as long as the predicate holds.
    pub fn pop_bottom_while(
        &mut self,
        mut predicate: impl FnMut(&SpawnedTile) -> bool,
    ) -> Vec<SpawnedTile> {
        let mut removed = Vec::new();
        while self.tiles.front().map_or(false, &mut predicate) {
            if let Some(tile) = self.tiles.pop_front() {
                removed.push(tile);
            }
        }
        removed
    }

    /// Removes every tile, bottom first.
    pub fn drain(&mut self) -> Vec<SpawnedTile> {
        self.tiles.drain(..).collect()
    }

    /// Iterator over the tiles from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &SpawnedTile> {
        self.tiles.iter()
    }

    /// Smallest vertical centre among the live tiles.
    #[must_use]
    pub fn lowest_y(&self) -> Option<f32> {
        self.tiles.iter().map(SpawnedTile::y).reduce(f32::min)
    }
}
