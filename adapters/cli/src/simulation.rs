//! Headless session driver.
//!
//! Wires the world and the generation systems into one per-tick loop and
//! replaces player physics with a scripted climber that lands on every
//! platform it passes, picks up what they carry, and now and then misses a
//! landing and falls.

use std::time::Duration;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skyward_core::{
    derive_stream_seed, Command, Event, HazardEffect, InstanceId, InstanceKind, PowerUpKind,
    ViewExtent, ZoneId, RNG_STREAM_AUTOPILOT,
};
use skyward_system_backgrounds::BackgroundWindow;
use skyward_system_platforms::PlatformWindow;
use skyward_system_power_ups::PowerUps;
use skyward_system_zones::{ZoneCatalog, ZoneTracker};
use skyward_world::{self as world, query, World};

use crate::config::{AutopilotConfig, SessionConfig};

const JETPACK_BOOST: f32 = 2.5;

/// Aggregate results of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) ticks: u64,
    pub(crate) restarts: u32,
    pub(crate) shield_rescues: u32,
    pub(crate) best_score: u32,
    pub(crate) score: u32,
    pub(crate) stars: u32,
    pub(crate) power_ups_collected: u32,
    pub(crate) zone: Option<String>,
    pub(crate) live_platforms: usize,
    pub(crate) death_floor: f32,
    pub(crate) player_height: f32,
}

#[derive(Debug)]
struct Autopilot {
    config: AutopilotConfig,
    rng: ChaCha8Rng,
    falling: bool,
    hazard: Option<HazardEffect>,
}

impl Autopilot {
    fn new(config: AutopilotConfig, session_seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(derive_stream_seed(
                session_seed,
                RNG_STREAM_AUTOPILOT,
            )),
            falling: false,
            hazard: None,
        }
    }

    fn vertical_speed(&self, jetpack: bool) -> f32 {
        if self.falling {
            return -self.config.fall_speed;
        }
        let mut speed = self.config.climb_speed;
        if jetpack {
            speed *= JETPACK_BOOST;
        }
        if let Some(effect) = self.hazard {
            speed /= effect.movement_resistance.max(1.0);
        }
        speed
    }

    fn slips(&mut self) -> bool {
        let chance = self.config.slip_chance.clamp(0.0, 1.0);
        chance > 0.0 && self.rng.gen_bool(chance)
    }

    fn recover(&mut self) {
        self.falling = false;
        self.hazard = None;
    }
}

/// World plus systems advanced together one tick at a time.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    catalog: ZoneCatalog,
    view: ViewExtent,
    tracker: ZoneTracker,
    backgrounds: BackgroundWindow,
    platforms: PlatformWindow,
    power_ups: PowerUps,
    autopilot: Autopilot,
    summary: RunSummary,
}

impl Simulation {
    /// Builds the session and places the opening content.
    pub(crate) fn new(config: SessionConfig) -> Self {
        let mut simulation = Self {
            world: World::new(),
            catalog: config.catalog,
            view: config.view,
            tracker: ZoneTracker::new(),
            backgrounds: BackgroundWindow::new(config.backgrounds),
            platforms: PlatformWindow::new(config.platforms, config.seed),
            power_ups: PowerUps::new(config.power_ups),
            autopilot: Autopilot::new(config.autopilot, config.seed),
            summary: RunSummary::default(),
        };
        let mut events = Vec::new();
        world::apply(
            &mut simulation.world,
            Command::ConfigureView {
                extent: simulation.view,
            },
            &mut events,
        );
        simulation.populate();
        simulation
    }

    /// Banner shown when the session boots.
    pub(crate) fn banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Advances the session by one tick.
    pub(crate) fn step(&mut self, dt: Duration) {
        let Some(zone) = self
            .tracker
            .update(&self.catalog, query::score(&self.world))
        else {
            return;
        };
        self.summary.ticks += 1;

        let mut events = Vec::new();
        self.drive_player(dt, &mut events);
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        let player_y = query::player_position(&self.world).y;
        self.power_ups.handle(&events, player_y, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        self.advance_windows(zone);
        world::apply(
            &mut self.world,
            Command::SetDeathFloor {
                lowest_platform_y: self.platforms.lowest_platform_y(),
            },
            &mut events,
        );

        self.record(&events);
        if events
            .iter()
            .any(|event| matches!(event, Event::PlayerFell { .. }))
        {
            self.restart();
        }
    }

    /// Snapshot of the run so far.
    pub(crate) fn summary(&self) -> RunSummary {
        let mut summary = self.summary.clone();
        summary.score = query::score(&self.world);
        summary.stars = query::stars(&self.world);
        summary.best_score = summary.best_score.max(summary.score);
        summary.zone = self
            .tracker
            .current()
            .and_then(|id| self.catalog.zone(id))
            .map(|zone| zone.name().to_owned());
        summary.live_platforms = self.platforms.platforms().len();
        summary.death_floor = query::lowest_platform_y(&self.world);
        summary.player_height = query::player_position(&self.world).y;
        summary
    }

    fn populate(&mut self) {
        let Some(zone) = self
            .tracker
            .update(&self.catalog, query::score(&self.world))
        else {
            return;
        };
        let player_y = query::player_position(&self.world).y;
        let camera_y = query::camera_y(&self.world);
        self.platforms
            .initialize(&mut self.world, &self.catalog, zone, player_y);
        self.backgrounds
            .initialize(&mut self.world, &self.catalog, zone, camera_y, self.view);
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::SetDeathFloor {
                lowest_platform_y: self.platforms.lowest_platform_y(),
            },
            &mut events,
        );
    }

    fn advance_windows(&mut self, zone: ZoneId) {
        let player_y = query::player_position(&self.world).y;
        let camera_y = query::camera_y(&self.world);
        self.backgrounds
            .tick(&mut self.world, &self.catalog, zone, camera_y, self.view);
        self.platforms
            .tick(&mut self.world, &self.catalog, zone, player_y);
    }

    fn drive_player(&mut self, dt: Duration, events: &mut Vec<Event>) {
        let start = query::player_position(&self.world);
        let jetpack = query::power_up_active(&self.world, PowerUpKind::Jetpack);
        let rise = self.autopilot.vertical_speed(jetpack) * dt.as_secs_f32();
        let target_y = start.y + rise;

        let passed: Vec<(InstanceId, Vec<InstanceId>)> = if self.autopilot.falling {
            Vec::new()
        } else {
            self.platforms
                .platforms()
                .iter()
                .filter(|tile| start.y < tile.top_edge() && tile.top_edge() <= target_y)
                .map(|tile| (tile.instance(), tile.attachments().to_vec()))
                .collect()
        };
        let target_x = self
            .platforms
            .platforms()
            .iter()
            .find(|tile| tile.top_edge() > target_y)
            .map_or(start.x, |tile| tile.position().x);

        world::apply(
            &mut self.world,
            Command::MovePlayer {
                position: Vec2::new(target_x, target_y),
            },
            events,
        );

        for (platform, attachments) in passed {
            if self.autopilot.slips() {
                log::debug!("autopilot missed platform {}", platform.get());
                self.autopilot.falling = true;
                if let Some(ridden) = query::player_parent(&self.world) {
                    world::apply(
                        &mut self.world,
                        Command::LeavePlatform { platform: ridden },
                        events,
                    );
                }
                break;
            }
            self.land(platform, &attachments, events);
        }
    }

    fn land(&mut self, platform: InstanceId, attachments: &[InstanceId], events: &mut Vec<Event>) {
        if let Some(ridden) = query::player_parent(&self.world) {
            world::apply(
                &mut self.world,
                Command::LeavePlatform { platform: ridden },
                events,
            );
        }
        if self.autopilot.hazard.take().is_some() {
            world::apply(&mut self.world, Command::ExitHazard, events);
        }
        world::apply(
            &mut self.world,
            Command::LandOnPlatform { platform },
            events,
        );

        for item in attachments {
            let Some((kind, hazard)) =
                query::instance(&self.world, *item).map(|instance| (instance.kind(), instance.hazard()))
            else {
                continue;
            };
            match kind {
                InstanceKind::Star | InstanceKind::PowerUp(_) => {
                    world::apply(&mut self.world, Command::CollectItem { item: *item }, events);
                }
                InstanceKind::SpecialPlatform if hazard.is_some() => {
                    self.autopilot.hazard = hazard;
                    world::apply(
                        &mut self.world,
                        Command::EnterHazard { special: *item },
                        events,
                    );
                }
                _ => {}
            }
        }
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ShieldConsumed { respawn } => {
                    log::info!("shield rescued the player at height {:.1}", respawn.y);
                    self.summary.shield_rescues += 1;
                    self.autopilot.recover();
                }
                Event::PowerUpCollected { kind } => {
                    log::info!("collected {kind:?}");
                    self.summary.power_ups_collected += 1;
                }
                Event::ScoreChanged { score } => {
                    self.summary.best_score = self.summary.best_score.max(*score);
                }
                Event::PlayerFell { height } => {
                    log::info!(
                        "player fell at height {height:.1} with score {}",
                        query::score(&self.world)
                    );
                }
                _ => {}
            }
        }
    }

    fn restart(&mut self) {
        self.summary.restarts += 1;
        self.platforms.reset(&mut self.world);
        self.backgrounds.reset(&mut self.world);
        self.tracker.reset();
        self.autopilot.recover();

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Restart, &mut events);
        let mut commands = Vec::new();
        self.power_ups.handle(&events, 0.0, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.populate();
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config;

    const DT: Duration = Duration::from_millis(16);

    fn session(seed: u64) -> SessionConfig {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/skyward.toml");
        let mut config = config::load(&path).expect("bundled config loads");
        config.seed = seed;
        config
    }

    fn run(seed: u64, ticks: usize) -> RunSummary {
        let mut simulation = Simulation::new(session(seed));
        for _ in 0..ticks {
            simulation.step(DT);
        }
        simulation.summary()
    }

    #[test]
    fn opening_content_is_placed_before_the_first_tick() {
        let simulation = Simulation::new(session(7));
        let summary = simulation.summary();
        assert_eq!(summary.live_platforms, 5);
        assert_eq!(summary.zone.as_deref(), Some("meadow"));
        assert_eq!(summary.death_floor, 1.0);
        assert_eq!(
            query::instances_of_kind(&simulation.world, InstanceKind::Background).len(),
            3
        );
    }

    #[test]
    fn climbing_scores_points() {
        let mut config = session(11);
        config.autopilot.slip_chance = 0.0;
        let mut simulation = Simulation::new(config);
        for _ in 0..1_000 {
            simulation.step(DT);
        }
        let summary = simulation.summary();
        assert!(summary.score > 5, "score was {}", summary.score);
        assert_eq!(summary.restarts, 0);
        assert!(query::camera_following(&simulation.world));
    }

    #[test]
    fn missed_landing_ends_in_restart_or_rescue() {
        let mut config = session(3);
        config.autopilot.slip_chance = 1.0;
        let mut simulation = Simulation::new(config);
        for _ in 0..600 {
            simulation.step(DT);
        }
        let summary = simulation.summary();
        assert!(summary.restarts + summary.shield_rescues > 0);
    }

    #[test]
    fn identical_seeds_replay_identically() {
        assert_eq!(run(42, 2_000), run(42, 2_000));
    }
}
