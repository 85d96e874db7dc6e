use skyward_core::{AssetCategory, AssetResolver, PowerUpKind, ZoneId};
use skyward_system_zones::{parse_catalog, ZoneTracker};

const MANIFEST: &str = r#"
version = 1

[items]
star = { key = "star", width = 0.5, height = 0.5 }
power_ups = [
    { kind = "magnet", prefab = { key = "magnet" } },
    { kind = "jetpack", prefab = { key = "jetpack", width = 0.6, height = 0.9 } },
]

[[zones]]
name = "meadow"
start_score = 0
end_score = 20
backgrounds = [
    { key = "meadow_sky_a", width = 5.6, height = 10.0 },
    { key = "meadow_sky_b", width = 5.6, height = 10.0 },
    { key = "meadow_sky_c", width = 5.6, height = 10.0 },
]
platforms = [{ key = "grass", width = 2.0, height = 0.4 }]

[[zones]]
name = "storm"
start_score = 20
end_score = 50
platforms = [
    { key = "cloud", width = 2.0, height = 0.4 },
    { key = "drifter", width = 2.0, height = 0.4, moving = true },
]
specials = [{ key = "lightning", hazard = true }]
"#;

#[test]
fn manifest_builds_a_resolving_catalog() {
    let catalog = parse_catalog(MANIFEST).expect("manifest should load");

    assert_eq!(catalog.len(), 2);
    let meadow = ZoneId::new(0);
    let storm = ZoneId::new(1);
    assert_eq!(catalog.prefabs(meadow, AssetCategory::Background).len(), 3);
    assert!(catalog.prefabs(meadow, AssetCategory::SpecialPlatform).is_empty());

    let specials = catalog.prefabs(storm, AssetCategory::SpecialPlatform);
    assert_eq!(specials.len(), 1);
    assert!(specials[0].is_hazard());
    assert!(catalog.prefabs(storm, AssetCategory::Platform)[1].is_moving());

    assert_eq!(catalog.prefabs(storm, AssetCategory::Star).len(), 1);
    assert!(catalog
        .prefabs(storm, AssetCategory::PowerUp(PowerUpKind::Shield))
        .is_empty());
    assert_eq!(
        catalog.prefabs(meadow, AssetCategory::PowerUp(PowerUpKind::Jetpack))[0]
            .key()
            .as_str(),
        "jetpack"
    );
}

#[test]
fn tracker_follows_score_through_zones() {
    let catalog = parse_catalog(MANIFEST).expect("manifest should load");
    let mut tracker = ZoneTracker::new();

    let visited: Vec<_> = [0, 19, 20, 49, 50, 400]
        .into_iter()
        .map(|score| tracker.update(&catalog, score))
        .collect();

    assert_eq!(
        visited,
        vec![
            Some(ZoneId::new(0)),
            Some(ZoneId::new(0)),
            Some(ZoneId::new(1)),
            Some(ZoneId::new(1)),
            Some(ZoneId::new(1)),
            Some(ZoneId::new(1)),
        ]
    );
    assert_eq!(
        tracker.current().and_then(|id| catalog.zone(id)).map(|zone| zone.name()),
        Some("storm")
    );
}
