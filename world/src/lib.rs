#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Skyward.
//!
//! The world owns every instance placed in the scene together with the
//! player, the camera and the session counters. Gameplay changes arrive as
//! [`Command`] values through [`apply`]; generation systems place and reclaim
//! content through the [`Scene`] implementation.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    time::Duration,
};

use glam::Vec2;
use skyward_core::{
    Command, Event, HazardEffect, InstanceId, InstanceKind, PowerUpKind, PrefabKey, Scene,
    SpawnRequest, ViewExtent, WELCOME_BANNER,
};

const DEATH_FLOOR_MARGIN: f32 = 2.0;
const SHIELD_RESPAWN_OFFSET: f32 = 1.2;
const JETPACK_SCORE_SPACING: f32 = 3.0;
const CAMERA_SMOOTH_SPEED: f32 = 5.0;
const CAMERA_FOLLOW_SCORE: u32 = 2;
const MOVING_PLATFORM_SPEED: f32 = 3.0;
const MOVING_PLATFORM_DISTANCE: f32 = 3.0;
const MAGNET_RANGE: f32 = 6.0;
const MAGNET_PULL_SPEED: f32 = 10.0;

/// Instance placed in the scene by a generation system.
#[derive(Clone, Debug)]
pub struct Instance {
    kind: InstanceKind,
    prefab: PrefabKey,
    position: Vec2,
    scale: Vec2,
    parent: Option<InstanceId>,
    children: Vec<InstanceId>,
    hazard: Option<HazardEffect>,
    motion: Option<Oscillation>,
}

impl Instance {
    /// Role the instance plays in the scene.
    #[must_use]
    pub const fn kind(&self) -> InstanceKind {
        self.kind
    }

    /// Prefab the instance was created from.
    #[must_use]
    pub fn prefab(&self) -> &PrefabKey {
        &self.prefab
    }

    /// Current world-space position of the instance centre.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Scale applied to the prefab's native size.
    #[must_use]
    pub const fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Instance that owns this one.
    #[must_use]
    pub const fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    /// Instances owned by this one.
    #[must_use]
    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    /// Hazard effect applied to a player entering the instance's area.
    #[must_use]
    pub const fn hazard(&self) -> Option<HazardEffect> {
        self.hazard
    }

    /// Whether the instance oscillates horizontally.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.motion.is_some()
    }
}

#[derive(Clone, Copy, Debug)]
struct Oscillation {
    origin_x: f32,
    direction: f32,
}

#[derive(Debug)]
struct Player {
    position: Vec2,
    parent: Option<InstanceId>,
    last_platform: Option<InstanceId>,
    hazard: Option<HazardEffect>,
}

impl Player {
    fn at(position: Vec2) -> Self {
        Self {
            position,
            parent: None,
            last_platform: None,
            hazard: None,
        }
    }
}

#[derive(Debug)]
struct Camera {
    y: f32,
    following: bool,
    extent: ViewExtent,
}

#[derive(Debug)]
struct Session {
    score: u32,
    stars: u32,
    lowest_platform_y: f32,
    counted: HashSet<InstanceId>,
    ignore_first_landing: bool,
    last_score_y: f32,
    fallen: bool,
}

impl Session {
    fn new(start_y: f32) -> Self {
        Self {
            score: 0,
            stars: 0,
            lowest_platform_y: 0.0,
            counted: HashSet::new(),
            ignore_first_landing: true,
            last_score_y: start_y,
            fallen: false,
        }
    }

    fn reset(&mut self, start_y: f32) {
        *self = Self::new(start_y);
    }
}

/// Represents the authoritative Skyward world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    instances: BTreeMap<InstanceId, Instance>,
    next_instance: u32,
    player_spawn: Vec2,
    player: Player,
    camera: Camera,
    session: Session,
    power_ups: BTreeSet<PowerUpKind>,
    paused: bool,
    tick_index: u64,
}

impl World {
    /// Creates a new world with the player standing at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::with_player_spawn(Vec2::ZERO)
    }

    /// Creates a new world with the player standing at the provided position.
    #[must_use]
    pub fn with_player_spawn(spawn: Vec2) -> Self {
        Self {
            banner: WELCOME_BANNER,
            instances: BTreeMap::new(),
            next_instance: 0,
            player_spawn: spawn,
            player: Player::at(spawn),
            camera: Camera {
                y: spawn.y,
                following: false,
                extent: ViewExtent::default(),
            },
            session: Session::new(spawn.y),
            power_ups: BTreeSet::new(),
            paused: false,
            tick_index: 0,
        }
    }

    fn allocate_instance_id(&mut self) -> InstanceId {
        let id = InstanceId::new(self.next_instance);
        self.next_instance = self.next_instance.wrapping_add(1);
        id
    }

    fn remove_subtree(&mut self, root: InstanceId) -> usize {
        let Some(instance) = self.instances.remove(&root) else {
            return 0;
        };

        if let Some(parent) = instance.parent.and_then(|id| self.instances.get_mut(&id)) {
            parent.children.retain(|child| *child != root);
        }
        if self.player.parent == Some(root) {
            self.player.parent = None;
        }

        let mut removed = 1;
        let mut pending = instance.children;
        while let Some(id) = pending.pop() {
            if let Some(child) = self.instances.remove(&id) {
                if self.player.parent == Some(id) {
                    self.player.parent = None;
                }
                removed += 1;
                pending.extend(child.children);
            }
        }
        removed
    }

    fn translate_subtree(&mut self, root: InstanceId, delta: Vec2) {
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if let Some(instance) = self.instances.get_mut(&id) {
                instance.position += delta;
                pending.extend(instance.children.iter().copied());
            }
        }
        if self.player.parent == Some(root) {
            self.player.position += delta;
        }
    }

    fn advance_moving_platforms(&mut self, dt: Duration) {
        let step = MOVING_PLATFORM_SPEED * dt.as_secs_f32();
        let moving: Vec<InstanceId> = self
            .instances
            .iter()
            .filter(|(_, instance)| instance.motion.is_some())
            .map(|(id, _)| *id)
            .collect();

        for id in moving {
            let Some(instance) = self.instances.get_mut(&id) else {
                continue;
            };
            let Some(motion) = instance.motion.as_mut() else {
                continue;
            };
            let delta = Vec2::new(motion.direction * step, 0.0);
            if (instance.position.x + delta.x - motion.origin_x).abs() >= MOVING_PLATFORM_DISTANCE {
                motion.direction = -motion.direction;
            }
            self.translate_subtree(id, delta);
        }
    }

    fn detach(&mut self, id: InstanceId) {
        let Some(parent) = self
            .instances
            .get_mut(&id)
            .and_then(|instance| instance.parent.take())
        else {
            return;
        };
        if let Some(owner) = self.instances.get_mut(&parent) {
            owner.children.retain(|child| *child != id);
        }
    }

    /// Drags stars near the player toward it while the magnet is active.
    ///
    /// Pulled stars no longer belong to their platform. A star that reaches
    /// the player is collected.
    fn pull_stars(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !self.power_ups.contains(&PowerUpKind::Magnet) {
            return;
        }
        let target = self.player.position;
        let step = MAGNET_PULL_SPEED * dt.as_secs_f32();
        let in_range: Vec<InstanceId> = self
            .instances
            .iter()
            .filter(|(_, instance)| {
                instance.kind == InstanceKind::Star
                    && instance.position.distance(target) < MAGNET_RANGE
            })
            .map(|(id, _)| *id)
            .collect();

        for id in in_range {
            self.detach(id);
            let Some(star) = self.instances.get_mut(&id) else {
                continue;
            };
            let offset = target - star.position;
            let distance = offset.length();
            if distance > step {
                star.position += offset / distance * step;
            } else {
                self.collect(id, out_events);
            }
        }
    }

    fn follow_player(&mut self, dt: Duration) {
        if !self.camera.following {
            return;
        }
        let blend = (CAMERA_SMOOTH_SPEED * dt.as_secs_f32()).min(1.0);
        self.camera.y += (self.player.position.y - self.camera.y) * blend;
    }

    fn check_death_floor(&mut self, out_events: &mut Vec<Event>) {
        if self.session.fallen {
            return;
        }
        let floor = self.session.lowest_platform_y - DEATH_FLOOR_MARGIN;
        if self.player.position.y >= floor {
            return;
        }

        let anchor = self
            .player
            .last_platform
            .and_then(|id| self.instances.get(&id))
            .map(Instance::position);
        match anchor {
            Some(anchor) if self.power_ups.contains(&PowerUpKind::Shield) => {
                let respawn = Vec2::new(anchor.x, anchor.y + SHIELD_RESPAWN_OFFSET);
                self.player.position = respawn;
                self.player.parent = None;
                let _ = self.power_ups.remove(&PowerUpKind::Shield);
                log::debug!("shield rescued player at {respawn}");
                out_events.push(Event::ShieldConsumed { respawn });
                out_events.push(Event::PowerUpDeactivated {
                    kind: PowerUpKind::Shield,
                });
            }
            _ => {
                self.session.fallen = true;
                out_events.push(Event::PlayerFell {
                    height: self.player.position.y,
                });
            }
        }
    }

    fn score_jetpack_climb(&mut self, out_events: &mut Vec<Event>) {
        if !self.power_ups.contains(&PowerUpKind::Jetpack) {
            return;
        }
        let climbed = self.player.position.y - self.session.last_score_y;
        if climbed < JETPACK_SCORE_SPACING {
            return;
        }
        let steps = (climbed / JETPACK_SCORE_SPACING).floor();
        self.session.score = self.session.score.saturating_add(steps as u32);
        self.session.last_score_y += steps * JETPACK_SCORE_SPACING;
        out_events.push(Event::ScoreChanged {
            score: self.session.score,
        });
        self.enable_follow_if_ready(out_events);
    }

    fn land_on(&mut self, platform: InstanceId, out_events: &mut Vec<Event>) {
        let Some(instance) = self.instances.get(&platform) else {
            return;
        };
        if !matches!(
            instance.kind,
            InstanceKind::Platform | InstanceKind::SpecialPlatform
        ) {
            return;
        }

        self.player.last_platform = Some(platform);
        self.player.parent = instance.motion.is_some().then_some(platform);

        if self.session.ignore_first_landing {
            self.session.ignore_first_landing = false;
            return;
        }
        if !self.session.counted.insert(platform) {
            return;
        }
        self.session.score = self.session.score.saturating_add(1);
        out_events.push(Event::ScoreChanged {
            score: self.session.score,
        });
        self.enable_follow_if_ready(out_events);
    }

    fn enable_follow_if_ready(&mut self, out_events: &mut Vec<Event>) {
        if !self.camera.following && self.session.score >= CAMERA_FOLLOW_SCORE {
            self.camera.following = true;
            out_events.push(Event::CameraFollowEnabled);
        }
    }

    fn collect(&mut self, item: InstanceId, out_events: &mut Vec<Event>) {
        let Some(kind) = self.instances.get(&item).map(Instance::kind) else {
            return;
        };
        match kind {
            InstanceKind::Star => {
                let _ = self.remove_subtree(item);
                self.session.stars = self.session.stars.saturating_add(1);
                out_events.push(Event::StarCollected {
                    total: self.session.stars,
                });
            }
            InstanceKind::PowerUp(power_up) => {
                let _ = self.remove_subtree(item);
                out_events.push(Event::PowerUpCollected { kind: power_up });
            }
            InstanceKind::Background | InstanceKind::Platform | InstanceKind::SpecialPlatform => {}
        }
    }

    fn clamp_to_view(&self, position: Vec2) -> Vec2 {
        let half_width = self.camera.extent.half_width();
        Vec2::new(position.x.clamp(-half_width, half_width), position.y)
    }

    fn reset(&mut self) {
        self.instances.clear();
        self.player = Player::at(self.player_spawn);
        self.camera.y = self.player_spawn.y;
        self.camera.following = false;
        self.session.reset(self.player_spawn.y);
        self.power_ups.clear();
        self.paused = false;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene for World {
    fn instantiate(&mut self, request: SpawnRequest) -> InstanceId {
        let id = self.allocate_instance_id();
        let parent = request.parent.filter(|parent| {
            self.instances
                .get_mut(parent)
                .map(|owner| owner.children.push(id))
                .is_some()
        });
        let motion = request.moving.then_some(Oscillation {
            origin_x: request.position.x,
            direction: 1.0,
        });

        let _ = self.instances.insert(
            id,
            Instance {
                kind: request.kind,
                prefab: request.prefab,
                position: request.position,
                scale: request.scale,
                parent,
                children: Vec::new(),
                hazard: request.hazard,
                motion,
            },
        );
        id
    }

    fn destroy(&mut self, instance: InstanceId) -> usize {
        self.remove_subtree(instance)
    }

    fn release_player(&mut self, instance: InstanceId) -> bool {
        if self.player.parent == Some(instance) {
            self.player.parent = None;
            true
        } else {
            false
        }
    }

    fn contains(&self, instance: InstanceId) -> bool {
        self.instances.contains_key(&instance)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureView { extent } => {
            world.camera.extent = extent;
            world.player.position = world.clamp_to_view(world.player.position);
        }
        Command::Tick { dt } => {
            if world.paused {
                return;
            }
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_moving_platforms(dt);
            world.pull_stars(dt, out_events);
            world.follow_player(dt);
            world.check_death_floor(out_events);
        }
        Command::MovePlayer { position } => {
            if world.paused {
                return;
            }
            world.player.position = world.clamp_to_view(position);
            out_events.push(Event::PlayerMoved {
                position: world.player.position,
            });
            world.score_jetpack_climb(out_events);
        }
        Command::LandOnPlatform { platform } => world.land_on(platform, out_events),
        Command::LeavePlatform { platform } => {
            let _ = world.release_player(platform);
        }
        Command::CollectItem { item } => world.collect(item, out_events),
        Command::EnterHazard { special } => {
            if let Some(effect) = world.instances.get(&special).and_then(Instance::hazard) {
                world.player.hazard = Some(effect);
                out_events.push(Event::HazardEntered { effect });
            }
        }
        Command::ExitHazard => {
            if world.player.hazard.take().is_some() {
                out_events.push(Event::HazardExited);
            }
        }
        Command::SetPowerUpActive { kind, active } => {
            if active {
                if world.power_ups.insert(kind) {
                    out_events.push(Event::PowerUpActivated { kind });
                }
            } else if world.power_ups.remove(&kind) {
                out_events.push(Event::PowerUpDeactivated { kind });
            }
        }
        Command::SetDeathFloor { lowest_platform_y } => {
            world.session.lowest_platform_y = lowest_platform_y;
        }
        Command::SetPaused { paused } => {
            if world.paused != paused {
                world.paused = paused;
                out_events.push(Event::PauseChanged { paused });
            }
        }
        Command::Restart => {
            log::debug!(
                "restarting session at score {} with {} live instances",
                world.session.score,
                world.instances.len()
            );
            world.reset();
            out_events.push(Event::SessionReset);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use skyward_core::{HazardEffect, InstanceId, InstanceKind, PowerUpKind, ViewExtent};

    use super::{Instance, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current world-space position of the player.
    #[must_use]
    pub fn player_position(world: &World) -> Vec2 {
        world.player.position
    }

    /// Platform the player is riding, if any.
    #[must_use]
    pub fn player_parent(world: &World) -> Option<InstanceId> {
        world.player.parent
    }

    /// Platform the player most recently landed on.
    #[must_use]
    pub fn last_platform(world: &World) -> Option<InstanceId> {
        world.player.last_platform
    }

    /// Hazard currently pushing and slowing the player.
    #[must_use]
    pub fn hazard_effect(world: &World) -> Option<HazardEffect> {
        world.player.hazard
    }

    /// Vertical centre of the camera.
    #[must_use]
    pub fn camera_y(world: &World) -> f32 {
        world.camera.y
    }

    /// Whether the camera follows the player.
    #[must_use]
    pub fn camera_following(world: &World) -> bool {
        world.camera.following
    }

    /// Visible extent of the camera.
    #[must_use]
    pub fn view_extent(world: &World) -> ViewExtent {
        world.camera.extent
    }

    /// Number of platforms cleared during the session.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.session.score
    }

    /// Number of stars collected during the session.
    #[must_use]
    pub fn stars(world: &World) -> u32 {
        world.session.stars
    }

    /// Lowest live platform height last published by the platform generator.
    #[must_use]
    pub fn lowest_platform_y(world: &World) -> f32 {
        world.session.lowest_platform_y
    }

    /// Whether the player fell and the session awaits a restart.
    #[must_use]
    pub fn has_fallen(world: &World) -> bool {
        world.session.fallen
    }

    /// Whether the simulation clock is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Number of ticks processed while unpaused.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Whether the power-up is currently active.
    #[must_use]
    pub fn power_up_active(world: &World, kind: PowerUpKind) -> bool {
        world.power_ups.contains(&kind)
    }

    /// Looks up a live instance.
    #[must_use]
    pub fn instance(world: &World, id: InstanceId) -> Option<&Instance> {
        world.instances.get(&id)
    }

    /// Number of live instances.
    #[must_use]
    pub fn instance_count(world: &World) -> usize {
        world.instances.len()
    }

    /// Identifiers of live instances of the provided kind in creation order.
    #[must_use]
    pub fn instances_of_kind(world: &World, kind: InstanceKind) -> Vec<InstanceId> {
        world
            .instances
            .iter()
            .filter(|(_, instance)| instance.kind == kind)
            .map(|(id, _)| *id)
            .collect()
    }
}
