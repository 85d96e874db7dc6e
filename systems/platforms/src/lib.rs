#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Endless platform generation for Skyward.
//!
//! The [`PlatformWindow`] keeps a column of evenly spaced platforms ahead of
//! the player. Each tick it spawns at most one platform above the topmost
//! one once the player comes within the lookahead distance, and destroys the
//! platforms that dropped more than the trim distance below the player
//! together with everything attached to them. Freshly spawned platforms are
//! handed to the [`ItemAttachmentPolicy`] which decides whether they carry a
//! star, a power-up or a special platform.
//!
//! Randomness comes from a ChaCha stream derived from the session seed, so a
//! session replays identically for the same seed and inputs.

use glam::Vec2;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use skyward_core::{
    derive_stream_seed, AssetCategory, AssetResolver, InstanceId, InstanceKind, Scene,
    SpawnRequest, SpawnedTile, TileWindow, ZoneId, RNG_STREAM_PLATFORMS,
};

pub mod attachment;

pub use attachment::{Attachment, Counter, ItemAttachmentPolicy};

const INITIAL_DROP: f32 = 2.0;

/// Configuration parameters required to construct the platform window.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    vertical_spacing: f32,
    min_x: f32,
    max_x: f32,
    lookahead: f32,
    trim_distance: f32,
    start_count: usize,
    star_threshold_min: u32,
    star_threshold_max: u32,
    power_up_interval: u32,
    special_interval: u32,
    star_offset: f32,
    power_up_offset: f32,
    special_offset: f32,
    special_jitter: f32,
}

impl Config {
    /// Creates a configuration with the shipped tuning.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertical_spacing: 3.0,
            min_x: -2.0,
            max_x: 2.0,
            lookahead: 10.0,
            trim_distance: 10.0,
            start_count: 5,
            star_threshold_min: 1,
            star_threshold_max: 2,
            power_up_interval: 13,
            special_interval: 3,
            star_offset: 0.6,
            power_up_offset: 1.0,
            special_offset: 1.0,
            special_jitter: 0.5,
        }
    }

    /// Overrides the inclusive range the star threshold is rolled from.
    #[must_use]
    pub const fn with_star_threshold(mut self, min: u32, max: u32) -> Self {
        self.star_threshold_min = min;
        self.star_threshold_max = max;
        self
    }

    /// Overrides the number of platforms placed on initialization.
    #[must_use]
    pub const fn with_start_count(mut self, start_count: usize) -> Self {
        self.start_count = start_count;
        self
    }

    /// Overrides the horizontal range platforms are placed in.
    #[must_use]
    pub const fn with_horizontal_range(mut self, min_x: f32, max_x: f32) -> Self {
        self.min_x = min_x;
        self.max_x = max_x;
        self
    }

    /// Vertical distance between consecutive platforms.
    #[must_use]
    pub const fn vertical_spacing(&self) -> f32 {
        self.vertical_spacing
    }

    /// Horizontal range platforms are placed in.
    #[must_use]
    pub const fn horizontal_range(&self) -> (f32, f32) {
        (self.min_x, self.max_x)
    }

    /// Distance below the player past which platforms are destroyed.
    #[must_use]
    pub const fn trim_distance(&self) -> f32 {
        self.trim_distance
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Window of platforms kept ahead of the player.
#[derive(Debug)]
pub struct PlatformWindow {
    config: Config,
    tiles: TileWindow,
    topmost_y: f32,
    lowest_platform_y: f32,
    policy: ItemAttachmentPolicy,
    rng: ChaCha8Rng,
}

impl PlatformWindow {
    /// Creates an empty window whose randomness derives from the session seed.
    #[must_use]
    pub fn new(config: Config, session_seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(
            session_seed,
            RNG_STREAM_PLATFORMS,
        ));
        let policy = ItemAttachmentPolicy::new(&config, &mut rng);
        Self {
            config,
            tiles: TileWindow::new(),
            topmost_y: 0.0,
            lowest_platform_y: 0.0,
            policy,
            rng,
        }
    }

    /// Places the starting platforms just below and above the player.
    pub fn initialize<S, A>(&mut self, scene: &mut S, assets: &A, zone: ZoneId, player_y: f32)
    where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
    {
        self.topmost_y = player_y - INITIAL_DROP;
        for _ in 0..self.config.start_count {
            let _ = self.spawn_one(scene, assets, zone);
        }
        self.refresh_lowest();
    }

    /// Spawns at most one platform ahead of the player and destroys the ones
    /// that fell too far behind.
    pub fn tick<S, A>(&mut self, scene: &mut S, assets: &A, zone: ZoneId, player_y: f32)
    where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
    {
        if player_y + self.config.lookahead > self.topmost_y {
            let _ = self.spawn_one(scene, assets, zone);
        }

        let cutoff = player_y - self.config.trim_distance;
        for tile in self.tiles.pop_bottom_while(|tile| tile.y() < cutoff) {
            let _ = scene.release_player(tile.instance());
            let removed = destroy_tile(scene, &tile);
            log::debug!(
                "trimmed platform {} at {} ({removed} instances)",
                tile.instance().get(),
                tile.y()
            );
        }

        self.refresh_lowest();
    }

    /// Places one platform a fixed spacing above the topmost one and offers
    /// it to the attachment policy.
    ///
    /// Does nothing when the zone has no platform prefabs.
    pub fn spawn_one<S, A>(&mut self, scene: &mut S, assets: &A, zone: ZoneId) -> Option<InstanceId>
    where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
    {
        let prefabs = assets.prefabs(zone, AssetCategory::Platform);
        if prefabs.is_empty() {
            log::debug!("zone {} has no platform prefabs", zone.get());
            return None;
        }

        let x = if self.config.min_x < self.config.max_x {
            self.rng.gen_range(self.config.min_x..=self.config.max_x)
        } else {
            self.config.min_x
        };
        let y = self.topmost_y + self.config.vertical_spacing;
        self.topmost_y = y;

        let prefab = prefabs.choose(&mut self.rng)?;
        let position = Vec2::new(x, y);
        let instance = scene.instantiate(SpawnRequest::new(InstanceKind::Platform, prefab, position));
        let mut tile = SpawnedTile::new(
            instance,
            prefab.key().clone(),
            position,
            prefab.native_size().y,
        );
        log::debug!("spawned platform `{}` at {position}", prefab.key().as_str());

        let _ = self
            .policy
            .attach(scene, assets, zone, &mut tile, &mut self.rng);
        self.tiles.push_top(tile);
        self.refresh_lowest();
        Some(instance)
    }

    /// Destroys every live platform and restores the initial schedule.
    pub fn reset<S: Scene + ?Sized>(&mut self, scene: &mut S) {
        for tile in self.tiles.drain() {
            let _ = scene.release_player(tile.instance());
            let _ = destroy_tile(scene, &tile);
        }
        self.policy = ItemAttachmentPolicy::new(&self.config, &mut self.rng);
        self.topmost_y = 0.0;
        self.lowest_platform_y = 0.0;
    }

    /// Live platforms from bottom to top.
    #[must_use]
    pub fn platforms(&self) -> &TileWindow {
        &self.tiles
    }

    /// Height of the lowest live platform.
    ///
    /// Keeps its last value while no platform is alive.
    #[must_use]
    pub fn lowest_platform_y(&self) -> f32 {
        self.lowest_platform_y
    }

    /// Height of the most recently spawned platform.
    #[must_use]
    pub fn topmost_y(&self) -> f32 {
        self.topmost_y
    }

    /// Item placement schedule.
    #[must_use]
    pub fn policy(&self) -> &ItemAttachmentPolicy {
        &self.policy
    }

    fn refresh_lowest(&mut self) {
        if let Some(lowest) = self.tiles.lowest_y() {
            self.lowest_platform_y = lowest;
        }
    }
}

/// Destroys a platform together with every item it handed out, including
/// items that were pulled away from it.
fn destroy_tile<S: Scene + ?Sized>(scene: &mut S, tile: &SpawnedTile) -> usize {
    let detached: usize = tile
        .attachments()
        .iter()
        .map(|item| scene.destroy(*item))
        .sum();
    detached + scene.destroy(tile.instance())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_tuning_matches_defaults() {
        let config = Config::default();
        assert_eq!(config.vertical_spacing(), 3.0);
        assert_eq!(config.horizontal_range(), (-2.0, 2.0));
        assert_eq!(config.trim_distance(), 10.0);
        assert_eq!(config, Config::new());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: Config = toml::from_str("start_count = 8").expect("config should parse");
        assert_eq!(config, Config::new().with_start_count(8));
    }
}
