#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skyward engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the generation systems. Adapters submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to. Generation systems place and reclaim content
//! through the [`Scene`] trait and look up prefabs through [`AssetResolver`],
//! so they never depend on how the world stores its instances.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod window;

pub use window::{SpawnedTile, TileWindow};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Skyward.";

/// Label used to derive the platform generator's random stream.
pub const RNG_STREAM_PLATFORMS: &str = "skyward/platforms";

/// Label used to derive the headless autopilot's random stream.
pub const RNG_STREAM_AUTOPILOT: &str = "skyward/autopilot";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Updates the visible extent of the camera in world units.
    ConfigureView {
        /// Half extents of the orthographic view.
        extent: ViewExtent,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Reports the player's position as resolved by the physics provider.
    MovePlayer {
        /// World-space position of the player.
        position: Vec2,
    },
    /// Reports that the player landed on a platform from above.
    LandOnPlatform {
        /// Platform instance that was landed on.
        platform: InstanceId,
    },
    /// Reports that the player stepped or jumped off a platform.
    LeavePlatform {
        /// Platform instance that was left.
        platform: InstanceId,
    },
    /// Reports that the player touched a star or power-up pickup.
    CollectItem {
        /// Pickup instance that was touched.
        item: InstanceId,
    },
    /// Reports that the player entered the trigger area of a special platform.
    EnterHazard {
        /// Special platform instance whose area was entered.
        special: InstanceId,
    },
    /// Reports that the player left every hazard trigger area.
    ExitHazard,
    /// Switches a power-up on or off for the player.
    SetPowerUpActive {
        /// Power-up being toggled.
        kind: PowerUpKind,
        /// Whether the power-up should be active afterwards.
        active: bool,
    },
    /// Publishes the lowest live platform height used as the death floor reference.
    SetDeathFloor {
        /// Vertical centre of the lowest live platform.
        lowest_platform_y: f32,
    },
    /// Pauses or resumes the simulation clock.
    SetPaused {
        /// Whether the simulation should be paused.
        paused: bool,
    },
    /// Tears down every instance and resets the session for a new run.
    Restart,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms the player's position after clamping to the view.
    PlayerMoved {
        /// World-space position of the player.
        position: Vec2,
    },
    /// Announces a new score value.
    ScoreChanged {
        /// Number of platforms cleared during the session.
        score: u32,
    },
    /// Announces that the camera started following the player.
    CameraFollowEnabled,
    /// Confirms that a star was collected.
    StarCollected {
        /// Total number of stars collected during the session.
        total: u32,
    },
    /// Confirms that a power-up pickup was collected.
    PowerUpCollected {
        /// Power-up carried by the pickup.
        kind: PowerUpKind,
    },
    /// Announces that a power-up became active.
    PowerUpActivated {
        /// Power-up that was activated.
        kind: PowerUpKind,
    },
    /// Announces that a power-up stopped being active.
    PowerUpDeactivated {
        /// Power-up that was deactivated.
        kind: PowerUpKind,
    },
    /// Announces that a hazard started pushing and slowing the player.
    HazardEntered {
        /// Effect applied to the player while inside the hazard.
        effect: HazardEffect,
    },
    /// Announces that the player is no longer affected by a hazard.
    HazardExited,
    /// Announces that the shield saved the player from falling.
    ShieldConsumed {
        /// Position the player was moved to.
        respawn: Vec2,
    },
    /// Announces that the player fell below the death floor.
    PlayerFell {
        /// Height at which the fall was detected.
        height: f32,
    },
    /// Announces a pause state change.
    PauseChanged {
        /// Whether the simulation is paused.
        paused: bool,
    },
    /// Announces that the session was reset by a restart.
    SessionReset,
}

/// Unique identifier assigned to an instance placed in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u32);

impl InstanceId {
    /// Creates a new instance identifier with the provided numeric value.
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

/// Identifier of a zone, equal to its position in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(u32);

impl ZoneId {
    /// Creates a new zone identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the zone within its catalog.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Name that identifies a prefab.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabKey(String);

impl PrefabKey {
    /// Creates a prefab key from the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the prefab.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Instantiable template resolved from the asset catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prefab {
    key: PrefabKey,
    #[serde(default = "default_extent")]
    width: f32,
    #[serde(default = "default_extent")]
    height: f32,
    #[serde(default)]
    hazard: bool,
    #[serde(default)]
    moving: bool,
}

fn default_extent() -> f32 {
    1.0
}

impl Prefab {
    /// Creates a prefab with the provided native size in world units.
    #[must_use]
    pub fn new(key: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            key: PrefabKey::new(key),
            width,
            height,
            hazard: false,
            moving: false,
        }
    }

    /// Marks the prefab as the designated hazard special platform.
    #[must_use]
    pub fn with_hazard(mut self) -> Self {
        self.hazard = true;
        self
    }

    /// Marks the prefab as a horizontally oscillating platform.
    #[must_use]
    pub fn with_moving(mut self) -> Self {
        self.moving = true;
        self
    }

    /// Identity of the prefab.
    #[must_use]
    pub fn key(&self) -> &PrefabKey {
        &self.key
    }

    /// Native size of the prefab's sprite in world units.
    #[must_use]
    pub fn native_size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Whether the prefab pushes and slows the player.
    #[must_use]
    pub const fn is_hazard(&self) -> bool {
        self.hazard
    }

    /// Whether instances of the prefab oscillate horizontally.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }
}

/// Score-bound bundle of assets that defines a zone's look and hazards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    name: String,
    start_score: u32,
    end_score: u32,
    #[serde(default)]
    backgrounds: Vec<Prefab>,
    #[serde(default)]
    platforms: Vec<Prefab>,
    #[serde(default)]
    specials: Vec<Prefab>,
}

impl ZoneDefinition {
    /// Creates a zone covering the half-open score range `[start_score, end_score)`.
    #[must_use]
    pub fn new(name: impl Into<String>, start_score: u32, end_score: u32) -> Self {
        Self {
            name: name.into(),
            start_score,
            end_score,
            backgrounds: Vec::new(),
            platforms: Vec::new(),
            specials: Vec::new(),
        }
    }

    /// Replaces the background variants cycled while the zone is active.
    #[must_use]
    pub fn with_backgrounds(mut self, backgrounds: Vec<Prefab>) -> Self {
        self.backgrounds = backgrounds;
        self
    }

    /// Replaces the platform prefabs spawned while the zone is active.
    #[must_use]
    pub fn with_platforms(mut self, platforms: Vec<Prefab>) -> Self {
        self.platforms = platforms;
        self
    }

    /// Replaces the special platform prefabs attached while the zone is active.
    #[must_use]
    pub fn with_specials(mut self, specials: Vec<Prefab>) -> Self {
        self.specials = specials;
        self
    }

    /// Display name of the zone.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First score covered by the zone.
    #[must_use]
    pub const fn start_score(&self) -> u32 {
        self.start_score
    }

    /// First score past the end of the zone.
    #[must_use]
    pub const fn end_score(&self) -> u32 {
        self.end_score
    }

    /// Reports whether the score falls inside `[start_score, end_score)`.
    #[must_use]
    pub const fn contains_score(&self, score: u32) -> bool {
        self.start_score <= score && score < self.end_score
    }

    /// Background variants in rotation order.
    #[must_use]
    pub fn backgrounds(&self) -> &[Prefab] {
        &self.backgrounds
    }

    /// Regular platform prefabs.
    #[must_use]
    pub fn platforms(&self) -> &[Prefab] {
        &self.platforms
    }

    /// Special platform prefabs.
    #[must_use]
    pub fn specials(&self) -> &[Prefab] {
        &self.specials
    }
}

/// Power-ups that can be attached to platforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Pulls nearby stars toward the player.
    Magnet,
    /// Rescues the player from one fall.
    Shield,
    /// Lifts the player upward for a limited height.
    Jetpack,
}

impl PowerUpKind {
    /// Fixed pool of power-ups in declaration order.
    pub const ALL: [PowerUpKind; 3] = [Self::Magnet, Self::Shield, Self::Jetpack];
}

/// Asset categories the resolver can be queried for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// Background variants of a zone.
    Background,
    /// Regular platforms of a zone.
    Platform,
    /// Special platforms of a zone.
    SpecialPlatform,
    /// Star pickups.
    Star,
    /// Pickups for a specific power-up.
    PowerUp(PowerUpKind),
}

/// Maps a zone and an asset category to the prefabs that may be instantiated.
pub trait AssetResolver {
    /// Returns the prefabs registered for the category while the zone is active.
    fn prefabs(&self, zone: ZoneId, category: AssetCategory) -> &[Prefab];
}

/// Role an instance plays in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    /// Full-screen background tile.
    Background,
    /// Regular platform the player can land on.
    Platform,
    /// Star pickup.
    Star,
    /// Power-up pickup.
    PowerUp(PowerUpKind),
    /// Special platform attached above a regular platform.
    SpecialPlatform,
}

/// Half extents of the orthographic camera view in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewExtent {
    half_width: f32,
    half_height: f32,
}

impl ViewExtent {
    /// Creates a view extent from half the view width and half the view height.
    #[must_use]
    pub const fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width,
            half_height,
        }
    }

    /// Half of the view width.
    #[must_use]
    pub const fn half_width(&self) -> f32 {
        self.half_width
    }

    /// Half of the view height.
    #[must_use]
    pub const fn half_height(&self) -> f32 {
        self.half_height
    }

    /// Full view width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.half_width * 2.0
    }

    /// Full view height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.half_height * 2.0
    }
}

impl Default for ViewExtent {
    fn default() -> Self {
        Self::new(2.8, 5.0)
    }
}

/// Push and slow-down applied to the player near a hazard platform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardEffect {
    /// Force pushing the player away from the hazard.
    pub push_force: f32,
    /// Divisor applied to the player's horizontal movement speed.
    pub movement_resistance: f32,
}

impl HazardEffect {
    /// Effect attached to every designated hazard platform.
    pub const STANDARD: HazardEffect = HazardEffect {
        push_force: 5.0,
        movement_resistance: 2.0,
    };
}

/// Request to place a new instance in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Role of the instance.
    pub kind: InstanceKind,
    /// Prefab the instance is created from.
    pub prefab: PrefabKey,
    /// World-space position of the instance centre.
    pub position: Vec2,
    /// Scale applied to the prefab's native size.
    pub scale: Vec2,
    /// Instance that owns the new one and destroys it along with itself.
    pub parent: Option<InstanceId>,
    /// Hazard effect carried by the instance.
    pub hazard: Option<HazardEffect>,
    /// Whether the instance oscillates horizontally.
    pub moving: bool,
}

impl SpawnRequest {
    /// Creates an unscaled, unparented request.
    #[must_use]
    pub fn new(kind: InstanceKind, prefab: &Prefab, position: Vec2) -> Self {
        Self {
            kind,
            prefab: prefab.key().clone(),
            position,
            scale: Vec2::ONE,
            parent: None,
            hazard: None,
            moving: prefab.is_moving(),
        }
    }

    /// Overrides the scale of the instance.
    #[must_use]
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Parents the instance to an existing one.
    #[must_use]
    pub fn with_parent(mut self, parent: InstanceId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attaches a hazard effect to the instance.
    #[must_use]
    pub fn with_hazard(mut self, effect: HazardEffect) -> Self {
        self.hazard = Some(effect);
        self
    }
}

/// Instantiation and destruction facility used by the generation systems.
pub trait Scene {
    /// Creates a positioned instance and returns its identifier.
    fn instantiate(&mut self, request: SpawnRequest) -> InstanceId;

    /// Destroys the instance and everything attached to it.
    ///
    /// Returns the number of instances removed; destroying an instance that no
    /// longer exists removes nothing.
    fn destroy(&mut self, instance: InstanceId) -> usize;

    /// Detaches the player from the instance if the player is riding it.
    fn release_player(&mut self, instance: InstanceId) -> bool;

    /// Reports whether the instance is still alive.
    fn contains(&self, instance: InstanceId) -> bool;
}

/// Derives an independent seed for a named random stream of a session.
#[must_use]
pub fn derive_stream_seed(session_seed: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(session_seed.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_contains_half_open_range() {
        let zone = ZoneDefinition::new("meadow", 10, 20);
        assert!(!zone.contains_score(9));
        assert!(zone.contains_score(10));
        assert!(zone.contains_score(19));
        assert!(!zone.contains_score(20));
    }

    #[test]
    fn stream_seeds_are_stable_and_label_specific() {
        let first = derive_stream_seed(7, RNG_STREAM_PLATFORMS);
        let second = derive_stream_seed(7, RNG_STREAM_PLATFORMS);
        let other = derive_stream_seed(7, RNG_STREAM_AUTOPILOT);
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_ne!(first, derive_stream_seed(8, RNG_STREAM_PLATFORMS));
    }

    #[test]
    fn prefab_defaults_apply_when_deserialising() {
        let prefab: Prefab = toml::from_str(r#"key = "cloud""#).expect("prefab should parse");
        assert_eq!(prefab.key().as_str(), "cloud");
        assert_eq!(prefab.native_size(), Vec2::ONE);
        assert!(!prefab.is_hazard());
        assert!(!prefab.is_moving());
    }

    #[test]
    fn spawn_request_inherits_moving_flag() {
        let prefab = Prefab::new("drifter", 2.0, 0.5).with_moving();
        let request = SpawnRequest::new(InstanceKind::Platform, &prefab, Vec2::new(1.0, 3.0));
        assert!(request.moving);
        assert_eq!(request.scale, Vec2::ONE);
        assert!(request.parent.is_none());
    }
}
