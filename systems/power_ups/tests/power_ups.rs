use std::time::Duration;

use glam::Vec2;
use skyward_core::{Command, Event, InstanceKind, PowerUpKind, Prefab, Scene, SpawnRequest};
use skyward_system_power_ups::{Config, PowerUps};
use skyward_world::{self as world, query, World};

fn pump(world: &mut World, system: &mut PowerUps, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    let mut seen = events.clone();
    let mut commands = Vec::new();
    system.handle(&events, query::player_position(world).y, &mut commands);
    for command in commands {
        let mut follow_up = Vec::new();
        world::apply(world, command, &mut follow_up);
        seen.extend(follow_up);
    }
    seen
}

fn tick(world: &mut World, system: &mut PowerUps, millis: u64) -> Vec<Event> {
    pump(
        world,
        system,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
    )
}

#[test]
fn collected_pickup_activates_then_expires_in_the_world() {
    let mut world = World::new();
    let mut system = PowerUps::new(Config::default());
    let pickup = world.instantiate(SpawnRequest::new(
        InstanceKind::PowerUp(PowerUpKind::Magnet),
        &Prefab::new("magnet", 0.6, 0.6),
        Vec2::new(0.0, 1.0),
    ));

    let events = pump(&mut world, &mut system, Command::CollectItem { item: pickup });
    assert!(events.contains(&Event::PowerUpActivated {
        kind: PowerUpKind::Magnet
    }));
    assert!(query::power_up_active(&world, PowerUpKind::Magnet));
    assert!(!world.contains(pickup));

    for _ in 0..9 {
        let _ = tick(&mut world, &mut system, 1_000);
    }
    assert!(query::power_up_active(&world, PowerUpKind::Magnet));

    let events = tick(&mut world, &mut system, 1_000);
    assert!(events.contains(&Event::PowerUpDeactivated {
        kind: PowerUpKind::Magnet
    }));
    assert!(!query::power_up_active(&world, PowerUpKind::Magnet));
}

#[test]
fn shield_rescue_cancels_the_pending_timer() {
    let mut world = World::new();
    let mut system = PowerUps::new(Config::default());
    let platform = world.instantiate(SpawnRequest::new(
        InstanceKind::Platform,
        &Prefab::new("grass", 2.0, 0.4),
        Vec2::ZERO,
    ));
    let shield = world.instantiate(
        SpawnRequest::new(
            InstanceKind::PowerUp(PowerUpKind::Shield),
            &Prefab::new("bubble", 0.6, 0.6),
            Vec2::new(0.0, 1.0),
        )
        .with_parent(platform),
    );
    let _ = pump(
        &mut world,
        &mut system,
        Command::LandOnPlatform { platform },
    );
    let _ = pump(&mut world, &mut system, Command::CollectItem { item: shield });
    assert!(system.is_active(PowerUpKind::Shield));

    let _ = pump(
        &mut world,
        &mut system,
        Command::MovePlayer {
            position: Vec2::new(0.0, -6.0),
        },
    );
    let events = tick(&mut world, &mut system, 16);

    let deactivations = events
        .iter()
        .filter(|event| {
            **event
                == Event::PowerUpDeactivated {
                    kind: PowerUpKind::Shield,
                }
        })
        .count();
    assert_eq!(deactivations, 1);
    assert!(!system.is_active(PowerUpKind::Shield));

    let mut later = Vec::new();
    for _ in 0..12 {
        later.extend(tick(&mut world, &mut system, 1_000));
    }
    assert!(!later.iter().any(|event| matches!(
        event,
        Event::PowerUpDeactivated {
            kind: PowerUpKind::Shield
        }
    )));
}

#[test]
fn restart_cancels_timers_without_late_deactivations() {
    let mut world = World::new();
    let mut system = PowerUps::new(Config::default());
    let mut events = Vec::new();
    system.handle(
        &[Event::PowerUpCollected {
            kind: PowerUpKind::Jetpack,
        }],
        0.0,
        &mut Vec::new(),
    );
    world::apply(
        &mut world,
        Command::SetPowerUpActive {
            kind: PowerUpKind::Jetpack,
            active: true,
        },
        &mut events,
    );

    let reset = pump(&mut world, &mut system, Command::Restart);
    assert!(reset.contains(&Event::SessionReset));
    assert!(!system.is_active(PowerUpKind::Jetpack));

    let mut later = Vec::new();
    for _ in 0..12 {
        later.extend(tick(&mut world, &mut system, 1_000));
    }
    assert!(!later
        .iter()
        .any(|event| matches!(event, Event::PowerUpDeactivated { .. })));
}
