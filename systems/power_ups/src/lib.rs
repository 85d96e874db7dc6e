#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Power-up timers for Skyward.
//!
//! Collecting a power-up starts a deadline timer and switches the power-up on
//! in the world. Timers advance with [`Event::TimeAdvanced`] and switch the
//! power-up off once they run out. Each timer carries a generation token, so
//! a timer that was cancelled or replaced never fires.

use std::{collections::BTreeMap, time::Duration};

use serde::Deserialize;
use skyward_core::{Command, Event, PowerUpKind};

/// Configuration parameters required to construct the power-up system.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    magnet_seconds: f32,
    shield_seconds: f32,
    jetpack_seconds: f32,
    jetpack_max_height_gain: f32,
}

impl Config {
    /// Creates a configuration from durations in seconds and the jetpack's
    /// maximum height gain in world units.
    #[must_use]
    pub const fn new(
        magnet_seconds: f32,
        shield_seconds: f32,
        jetpack_seconds: f32,
        jetpack_max_height_gain: f32,
    ) -> Self {
        Self {
            magnet_seconds,
            shield_seconds,
            jetpack_seconds,
            jetpack_max_height_gain,
        }
    }

    /// Time a freshly collected power-up stays active.
    #[must_use]
    pub fn duration(&self, kind: PowerUpKind) -> Duration {
        let seconds = match kind {
            PowerUpKind::Magnet => self.magnet_seconds,
            PowerUpKind::Shield => self.shield_seconds,
            PowerUpKind::Jetpack => self.jetpack_seconds,
        };
        Duration::from_secs_f32(seconds.max(0.0))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(10.0, 10.0, 10.0, 20.0)
    }
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    token: u64,
    remaining: Duration,
    activation_y: f32,
}

/// System that owns the deadline of every active power-up.
#[derive(Debug)]
pub struct PowerUps {
    config: Config,
    timers: BTreeMap<PowerUpKind, Timer>,
    next_token: u64,
}

impl PowerUps {
    /// Creates the system with no active power-ups.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            timers: BTreeMap::new(),
            next_token: 0,
        }
    }

    /// Consumes world events and emits the commands that toggle power-ups.
    pub fn handle(&mut self, events: &[Event], player_y: f32, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::PowerUpCollected { kind } => self.start(*kind, player_y, out),
                Event::TimeAdvanced { dt } => self.advance(*dt, player_y, out),
                Event::ShieldConsumed { .. } => {
                    let _ = self.timers.remove(&PowerUpKind::Shield);
                }
                Event::PowerUpDeactivated { kind } => {
                    let _ = self.timers.remove(kind);
                }
                Event::SessionReset => self.timers.clear(),
                _ => {}
            }
        }
    }

    /// Cancels a running power-up ahead of its deadline.
    ///
    /// Returns whether a timer was live.
    pub fn deactivate(&mut self, kind: PowerUpKind, out: &mut Vec<Command>) -> bool {
        if self.timers.remove(&kind).is_none() {
            return false;
        }
        out.push(Command::SetPowerUpActive {
            kind,
            active: false,
        });
        true
    }

    /// Whether a timer is running for the power-up.
    #[must_use]
    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.timers.contains_key(&kind)
    }

    /// Time left before the power-up switches off.
    #[must_use]
    pub fn remaining(&self, kind: PowerUpKind) -> Option<Duration> {
        self.timers.get(&kind).map(|timer| timer.remaining)
    }

    fn start(&mut self, kind: PowerUpKind, player_y: f32, out: &mut Vec<Command>) {
        if self.timers.contains_key(&kind) {
            log::warn!("{kind:?} already active; ignoring pickup");
            return;
        }
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);
        let _ = self.timers.insert(
            kind,
            Timer {
                token,
                remaining: self.config.duration(kind),
                activation_y: player_y,
            },
        );
        log::debug!("{kind:?} activated with timer {token}");
        out.push(Command::SetPowerUpActive { kind, active: true });
    }

    fn advance(&mut self, dt: Duration, player_y: f32, out: &mut Vec<Command>) {
        let max_gain = self.config.jetpack_max_height_gain;
        let mut expired = Vec::new();
        for (kind, timer) in &mut self.timers {
            timer.remaining = timer.remaining.saturating_sub(dt);
            let climbed_out =
                *kind == PowerUpKind::Jetpack && player_y - timer.activation_y >= max_gain;
            if timer.remaining.is_zero() || climbed_out {
                expired.push((*kind, timer.token));
            }
        }

        for (kind, token) in expired {
            let live = self
                .timers
                .get(&kind)
                .map_or(false, |timer| timer.token == token);
            if live {
                let _ = self.timers.remove(&kind);
                log::debug!("{kind:?} expired");
                out.push(Command::SetPowerUpActive {
                    kind,
                    active: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(system: &mut PowerUps, millis: u64, player_y: f32) -> Vec<Command> {
        let mut out = Vec::new();
        system.handle(
            &[Event::TimeAdvanced {
                dt: Duration::from_millis(millis),
            }],
            player_y,
            &mut out,
        );
        out
    }

    fn collect(system: &mut PowerUps, kind: PowerUpKind, player_y: f32) -> Vec<Command> {
        let mut out = Vec::new();
        system.handle(&[Event::PowerUpCollected { kind }], player_y, &mut out);
        out
    }

    #[test]
    fn timer_expires_after_its_duration() {
        let mut system = PowerUps::new(Config::default());
        assert_eq!(
            collect(&mut system, PowerUpKind::Magnet, 0.0),
            vec![Command::SetPowerUpActive {
                kind: PowerUpKind::Magnet,
                active: true
            }]
        );

        assert!(tick(&mut system, 9_900, 0.0).is_empty());
        assert_eq!(
            tick(&mut system, 100, 0.0),
            vec![Command::SetPowerUpActive {
                kind: PowerUpKind::Magnet,
                active: false
            }]
        );
        assert!(tick(&mut system, 1_000, 0.0).is_empty());
    }

    #[test]
    fn duplicate_pickup_keeps_the_running_timer() {
        let mut system = PowerUps::new(Config::default());
        let _ = collect(&mut system, PowerUpKind::Shield, 0.0);
        let _ = tick(&mut system, 4_000, 0.0);

        assert!(collect(&mut system, PowerUpKind::Shield, 0.0).is_empty());
        assert_eq!(
            system.remaining(PowerUpKind::Shield),
            Some(Duration::from_secs(6))
        );
    }

    #[test]
    fn jetpack_stops_after_maximum_height_gain() {
        let mut system = PowerUps::new(Config::default());
        let _ = collect(&mut system, PowerUpKind::Jetpack, 5.0);

        assert!(tick(&mut system, 16, 24.0).is_empty());
        assert_eq!(
            tick(&mut system, 16, 25.0),
            vec![Command::SetPowerUpActive {
                kind: PowerUpKind::Jetpack,
                active: false
            }]
        );
    }

    #[test]
    fn manual_deactivation_cancels_the_timer() {
        let mut system = PowerUps::new(Config::default());
        let _ = collect(&mut system, PowerUpKind::Magnet, 0.0);
        let mut out = Vec::new();

        assert!(system.deactivate(PowerUpKind::Magnet, &mut out));
        assert!(!system.deactivate(PowerUpKind::Magnet, &mut out));
        assert_eq!(out.len(), 1);
        assert!(tick(&mut system, 20_000, 0.0).is_empty());
    }

    #[test]
    fn consumed_shield_never_deactivates_twice() {
        let mut system = PowerUps::new(Config::default());
        let _ = collect(&mut system, PowerUpKind::Shield, 0.0);
        let mut out = Vec::new();

        system.handle(
            &[Event::ShieldConsumed {
                respawn: Default::default(),
            }],
            0.0,
            &mut out,
        );

        assert!(out.is_empty());
        assert!(!system.is_active(PowerUpKind::Shield));
        assert!(tick(&mut system, 20_000, 0.0).is_empty());
    }

    #[test]
    fn session_reset_cancels_every_timer() {
        let mut system = PowerUps::new(Config::default());
        for kind in PowerUpKind::ALL {
            let _ = collect(&mut system, kind, 0.0);
        }
        let mut out = Vec::new();

        system.handle(&[Event::SessionReset], 0.0, &mut out);

        assert!(out.is_empty());
        assert!(PowerUpKind::ALL.iter().all(|kind| !system.is_active(*kind)));
        assert!(tick(&mut system, 20_000, 0.0).is_empty());
    }
}
