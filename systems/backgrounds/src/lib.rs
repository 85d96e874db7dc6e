#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scrolling background window for Skyward.
//!
//! Background tiles are exactly one view tall and stacked without gaps. The
//! window keeps a configurable number of tiles below and above the camera,
//! destroying tiles that scroll out and spawning new ones at the top. Each
//! zone shows its first variant once and then alternates its second and
//! third variants.

use std::collections::HashMap;

use glam::Vec2;
use serde::Deserialize;
use skyward_core::{
    AssetCategory, AssetResolver, InstanceKind, Prefab, Scene, SpawnRequest, SpawnedTile,
    TileWindow, ViewExtent, ZoneId,
};

const MIN_ROTATING_VARIANTS: usize = 3;

/// Configuration parameters required to construct the background window.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    tile_count: usize,
    keep_below: f32,
    keep_above: f32,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `tile_count` tiles are placed on initialization; `keep_below` and
    /// `keep_above` are measured in tile heights.
    #[must_use]
    pub const fn new(tile_count: usize, keep_below: f32, keep_above: f32) -> Self {
        Self {
            tile_count,
            keep_below,
            keep_above,
        }
    }

    /// Number of tiles placed on initialization.
    #[must_use]
    pub const fn tile_count(&self) -> usize {
        self.tile_count
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(3, 2.0, 1.0)
    }
}

/// Background rotation state of a single zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneRuntimeState {
    used_first_background: bool,
    next_repeated_background: usize,
}

impl ZoneRuntimeState {
    /// Whether the zone's opening variant has been shown.
    #[must_use]
    pub const fn used_first_background(&self) -> bool {
        self.used_first_background
    }

    /// Variant index returned by the next repeated pick, either 1 or 2.
    #[must_use]
    pub const fn next_repeated_background(&self) -> usize {
        self.next_repeated_background
    }

    fn next_variant(&mut self) -> usize {
        if !self.used_first_background {
            self.used_first_background = true;
            return 0;
        }
        let variant = self.next_repeated_background;
        self.next_repeated_background = if variant == 1 { 2 } else { 1 };
        variant
    }
}

impl Default for ZoneRuntimeState {
    fn default() -> Self {
        Self {
            used_first_background: false,
            next_repeated_background: 1,
        }
    }
}

/// Window of background tiles that follows the camera.
#[derive(Debug)]
pub struct BackgroundWindow {
    config: Config,
    tiles: TileWindow,
    zone_states: HashMap<ZoneId, ZoneRuntimeState>,
    tile_height: Option<f32>,
}

impl BackgroundWindow {
    /// Creates an empty window using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tiles: TileWindow::new(),
            zone_states: HashMap::new(),
            tile_height: None,
        }
    }

    /// Places the initial stack of tiles starting at the camera's bottom edge.
    ///
    /// Does nothing when the zone defines fewer than three background variants.
    pub fn initialize<S, A>(
        &mut self,
        scene: &mut S,
        assets: &A,
        zone: ZoneId,
        camera_y: f32,
        view: ViewExtent,
    ) where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
    {
        let variants = assets.prefabs(zone, AssetCategory::Background).len();
        if variants < MIN_ROTATING_VARIANTS {
            log::warn!(
                "zone {} has {variants} background variants; backgrounds disabled",
                zone.get()
            );
            return;
        }
        let tile_height = view.height();
        if tile_height <= 0.0 {
            log::warn!("view height {tile_height} cannot hold background tiles");
            return;
        }

        self.tile_height = Some(tile_height);
        let first_centre = camera_y - view.half_height() + tile_height * 0.5;
        for index in 0..self.config.tile_count {
            let Some(prefab) = self.next_prefab(assets, zone) else {
                break;
            };
            let centre = first_centre + tile_height * index as f32;
            self.spawn_tile(scene, prefab, centre, view);
        }
    }

    /// Retires tiles far below the camera and fills the space above it.
    pub fn tick<S, A>(
        &mut self,
        scene: &mut S,
        assets: &A,
        zone: ZoneId,
        camera_y: f32,
        view: ViewExtent,
    ) where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
    {
        let Some(tile_height) = self.tile_height else {
            return;
        };

        let camera_bottom = camera_y - view.half_height();
        let keep_below = self.config.keep_below * tile_height;
        let retired = self
            .tiles
            .pop_bottom_while(|tile| camera_bottom > tile.top_edge() + keep_below);
        for tile in retired {
            log::debug!("retiring background at {}", tile.y());
            let _ = scene.destroy(tile.instance());
        }

        let camera_top = camera_y + view.half_height();
        let keep_above = self.config.keep_above * tile_height;
        loop {
            let centre = match self.tiles.top() {
                Some(top) if camera_top <= top.top_edge() - keep_above => break,
                Some(top) => top.top_edge() + tile_height * 0.5,
                None => camera_bottom + tile_height * 0.5,
            };
            let Some(prefab) = self.next_prefab(assets, zone) else {
                break;
            };
            self.spawn_tile(scene, prefab, centre, view);
        }
    }

    /// Destroys every live tile and forgets all zone rotation state.
    pub fn reset<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        for tile in self.tiles.drain() {
            let _ = scene.destroy(tile.instance());
        }
        self.zone_states.clear();
        self.tile_height = None;
    }

    /// Live tiles from bottom to top.
    #[must_use]
    pub fn tiles(&self) -> &TileWindow {
        &self.tiles
    }

    /// Rotation state of a zone, if it has been used.
    #[must_use]
    pub fn zone_state(&self, zone: ZoneId) -> Option<ZoneRuntimeState> {
        self.zone_states.get(&zone).copied()
    }

    fn next_prefab<'a, A>(&mut self, assets: &'a A, zone: ZoneId) -> Option<&'a Prefab>
    where
        A: AssetResolver + ?Sized,
    {
        let variants = assets.prefabs(zone, AssetCategory::Background);
        if variants.len() < MIN_ROTATING_VARIANTS {
            return None;
        }
        let index = self.zone_states.entry(zone).or_default().next_variant();
        variants.get(index)
    }

    fn spawn_tile<S>(&mut self, scene: &mut S, prefab: &Prefab, centre: f32, view: ViewExtent)
    where
        S: Scene + ?Sized,
    {
        let view_size = Vec2::new(view.width(), view.height());
        let scale = view_size / prefab.native_size().max(Vec2::splat(f32::EPSILON));
        let position = Vec2::new(0.0, centre);
        let instance = scene.instantiate(
            SpawnRequest::new(InstanceKind::Background, prefab, position).with_scale(scale),
        );
        log::debug!(
            "spawned background `{}` at {centre}",
            prefab.key().as_str()
        );
        self.tiles.push_top(SpawnedTile::new(
            instance,
            prefab.key().clone(),
            position,
            view.height(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_shows_first_variant_once() {
        let mut state = ZoneRuntimeState::default();
        let picks: Vec<_> = (0..6).map(|_| state.next_variant()).collect();
        assert_eq!(picks, vec![0, 1, 2, 1, 2, 1]);
        assert!(state.used_first_background());
        assert_eq!(state.next_repeated_background(), 2);
    }

    #[test]
    fn config_defaults_match_shipped_tuning() {
        let config = Config::default();
        assert_eq!(config.tile_count(), 3);
        assert_eq!(config, Config::new(3, 2.0, 1.0));
    }
}
