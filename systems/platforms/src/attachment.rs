//! Per-platform item placement.
//!
//! Every freshly spawned platform is offered to three slots in a fixed
//! order: star, power-up and special platform. Each slot keeps its own
//! counter of platforms seen since it last fired. A slot fires when its
//! counter reached its threshold and the platform is still free; otherwise
//! the counter advances, even when a higher-priority slot already took the
//! platform.
//!
//! A firing star or power-up slot takes the platform even when no prefab is
//! available for it. A firing special slot without prefabs leaves the
//! platform free.

use glam::Vec2;
use rand::{seq::SliceRandom, Rng};
use skyward_core::{
    AssetCategory, AssetResolver, HazardEffect, InstanceId, InstanceKind, PowerUpKind, Prefab,
    Scene, SpawnRequest, SpawnedTile, ZoneId,
};

use crate::Config;

/// Platforms seen since a slot last fired, and the count that makes it fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Counter {
    count: u32,
    threshold: u32,
}

impl Counter {
    /// Creates a counter that fires once `threshold` platforms were skipped.
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    /// Platforms seen since the slot last fired.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Count at which the slot fires.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    const fn is_due(&self) -> bool {
        self.count >= self.threshold
    }

    fn advance(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    fn fire(&mut self, threshold: u32) {
        self.count = 0;
        self.threshold = threshold;
    }
}

/// Item placed on a platform by the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Instance that was placed.
    pub instance: InstanceId,
    /// Role of the placed instance.
    pub kind: InstanceKind,
}

/// Stateful schedule deciding which item, if any, a platform carries.
#[derive(Clone, Debug)]
pub struct ItemAttachmentPolicy {
    star: Counter,
    power_up: Counter,
    special: Counter,
    star_threshold_min: u32,
    star_threshold_max: u32,
    star_offset: f32,
    power_up_offset: f32,
    special_offset: f32,
    special_jitter: f32,
}

impl ItemAttachmentPolicy {
    /// Creates a policy with fresh counters and a freshly rolled star threshold.
    pub fn new<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Self {
        let mut policy = Self {
            star: Counter::new(0),
            power_up: Counter::new(config.power_up_interval),
            special: Counter::new(config.special_interval),
            star_threshold_min: config.star_threshold_min,
            star_threshold_max: config.star_threshold_max.max(config.star_threshold_min),
            star_offset: config.star_offset,
            power_up_offset: config.power_up_offset,
            special_offset: config.special_offset,
            special_jitter: config.special_jitter.abs(),
        };
        let threshold = policy.roll_star_threshold(rng);
        policy.star.fire(threshold);
        policy
    }

    /// Star slot state.
    #[must_use]
    pub const fn star(&self) -> Counter {
        self.star
    }

    /// Power-up slot state.
    #[must_use]
    pub const fn power_up(&self) -> Counter {
        self.power_up
    }

    /// Special platform slot state.
    #[must_use]
    pub const fn special(&self) -> Counter {
        self.special
    }

    /// Offers the platform to the star, power-up and special slots in order.
    ///
    /// At most one item is placed. A star or power-up slot that fires without
    /// a usable prefab still takes the platform; a special slot in the same
    /// situation is consumed and leaves the platform free.
    pub fn attach<S, A, R>(
        &mut self,
        scene: &mut S,
        assets: &A,
        zone: ZoneId,
        platform: &mut SpawnedTile,
        rng: &mut R,
    ) -> Option<Attachment>
    where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
        R: Rng + ?Sized,
    {
        let mut placed = None;

        if !platform.has_item() && self.star.is_due() {
            placed = self.place_star(scene, assets, zone, platform);
            platform.claim();
            let threshold = self.roll_star_threshold(rng);
            self.star.fire(threshold);
        } else {
            self.star.advance();
        }

        if !platform.has_item() && self.power_up.is_due() {
            placed = self.place_power_up(scene, assets, zone, platform, rng);
            platform.claim();
            self.power_up.fire(self.power_up.threshold());
        } else {
            self.power_up.advance();
        }

        if !platform.has_item() && self.special.is_due() {
            placed = self.place_special(scene, assets, zone, platform, rng);
            self.special.fire(self.special.threshold());
        } else {
            self.special.advance();
        }

        placed
    }

    fn roll_star_threshold<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.star_threshold_min..=self.star_threshold_max)
    }

    fn place_star<S, A>(
        &self,
        scene: &mut S,
        assets: &A,
        zone: ZoneId,
        platform: &mut SpawnedTile,
    ) -> Option<Attachment>
    where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
    {
        let prefab = assets.prefabs(zone, AssetCategory::Star).first()?;
        let position = platform.position() + Vec2::new(0.0, self.star_offset);
        Some(place(scene, platform, InstanceKind::Star, prefab, position, None))
    }

    fn place_power_up<S, A, R>(
        &self,
        scene: &mut S,
        assets: &A,
        zone: ZoneId,
        platform: &mut SpawnedTile,
        rng: &mut R,
    ) -> Option<Attachment>
    where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
        R: Rng + ?Sized,
    {
        let available: Vec<PowerUpKind> = PowerUpKind::ALL
            .into_iter()
            .filter(|kind| !assets.prefabs(zone, AssetCategory::PowerUp(*kind)).is_empty())
            .collect();
        let kind = *available.choose(rng)?;
        let prefab = assets
            .prefabs(zone, AssetCategory::PowerUp(kind))
            .choose(rng)?;
        let position = platform.position() + Vec2::new(0.0, self.power_up_offset);
        Some(place(
            scene,
            platform,
            InstanceKind::PowerUp(kind),
            prefab,
            position,
            None,
        ))
    }

    fn place_special<S, A, R>(
        &self,
        scene: &mut S,
        assets: &A,
        zone: ZoneId,
        platform: &mut SpawnedTile,
        rng: &mut R,
    ) -> Option<Attachment>
    where
        S: Scene + ?Sized,
        A: AssetResolver + ?Sized,
        R: Rng + ?Sized,
    {
        let prefab = assets
            .prefabs(zone, AssetCategory::SpecialPlatform)
            .choose(rng)?;
        let jitter = if self.special_jitter > 0.0 {
            rng.gen_range(-self.special_jitter..=self.special_jitter)
        } else {
            0.0
        };
        let position = platform.position() + Vec2::new(jitter, self.special_offset);
        let hazard = prefab.is_hazard().then_some(HazardEffect::STANDARD);
        Some(place(
            scene,
            platform,
            InstanceKind::SpecialPlatform,
            prefab,
            position,
            hazard,
        ))
    }
}

fn place<S: Scene + ?Sized>(
    scene: &mut S,
    platform: &mut SpawnedTile,
    kind: InstanceKind,
    prefab: &Prefab,
    position: Vec2,
    hazard: Option<HazardEffect>,
) -> Attachment {
    let mut request = SpawnRequest::new(kind, prefab, position).with_parent(platform.instance());
    if let Some(effect) = hazard {
        request = request.with_hazard(effect);
    }
    let instance = scene.instantiate(request);
    let _ = platform.attach(instance);
    log::debug!(
        "attached {kind:?} `{}` to platform {}",
        prefab.key().as_str(),
        platform.instance().get()
    );
    Attachment { instance, kind }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use skyward_core::PrefabKey;

    use super::*;

    #[derive(Default)]
    struct RecordingScene {
        spawned: Vec<SpawnRequest>,
    }

    impl Scene for RecordingScene {
        fn instantiate(&mut self, request: SpawnRequest) -> InstanceId {
            self.spawned.push(request);
            InstanceId::new(100 + self.spawned.len() as u32)
        }

        fn destroy(&mut self, _instance: InstanceId) -> usize {
            0
        }

        fn release_player(&mut self, _instance: InstanceId) -> bool {
            false
        }

        fn contains(&self, _instance: InstanceId) -> bool {
            false
        }
    }

    struct Assets {
        star: Vec<Prefab>,
        special: Vec<Prefab>,
        shield: Vec<Prefab>,
    }

    impl AssetResolver for Assets {
        fn prefabs(&self, _zone: ZoneId, category: AssetCategory) -> &[Prefab] {
            match category {
                AssetCategory::Star => &self.star,
                AssetCategory::SpecialPlatform => &self.special,
                AssetCategory::PowerUp(PowerUpKind::Shield) => &self.shield,
                _ => &[],
            }
        }
    }

    fn full_assets() -> Assets {
        Assets {
            star: vec![Prefab::new("star", 0.5, 0.5)],
            special: vec![Prefab::new("thorns", 1.0, 1.0).with_hazard()],
            shield: vec![Prefab::new("bubble", 0.8, 0.8)],
        }
    }

    fn platform(index: u32) -> SpawnedTile {
        SpawnedTile::new(
            InstanceId::new(index),
            PrefabKey::new("slab"),
            Vec2::new(0.0, index as f32 * 3.0),
            0.4,
        )
    }

    fn fixed_star_config() -> Config {
        Config::default().with_star_threshold(2, 2)
    }

    fn run(
        policy: &mut ItemAttachmentPolicy,
        assets: &Assets,
        count: u32,
    ) -> Vec<Option<InstanceKind>> {
        let mut scene = RecordingScene::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        (1..=count)
            .map(|index| {
                let mut tile = platform(index);
                policy
                    .attach(&mut scene, assets, ZoneId::new(0), &mut tile, &mut rng)
                    .map(|attachment| attachment.kind)
            })
            .collect()
    }

    #[test]
    fn slots_fire_in_priority_order_without_overlap() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut policy = ItemAttachmentPolicy::new(&fixed_star_config(), &mut rng);

        let kinds = run(&mut policy, &full_assets(), 15);

        let star = Some(InstanceKind::Star);
        let special = Some(InstanceKind::SpecialPlatform);
        let shield = Some(InstanceKind::PowerUp(PowerUpKind::Shield));
        assert_eq!(
            kinds,
            vec![
                None, None, star, special, None, star, None, special, star, None, None, star,
                special, shield, star,
            ]
        );
    }

    #[test]
    fn lower_slots_advance_when_a_star_takes_the_platform() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut policy = ItemAttachmentPolicy::new(&fixed_star_config(), &mut rng);

        let _ = run(&mut policy, &full_assets(), 3);

        assert_eq!(policy.star().count(), 0);
        assert_eq!(policy.power_up().count(), 3);
        assert_eq!(policy.special().count(), 3);
    }

    #[test]
    fn star_slot_without_prefab_still_takes_the_platform() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = Config::default().with_star_threshold(1, 1);
        let mut policy = ItemAttachmentPolicy::new(&config, &mut rng);
        let assets = Assets {
            star: Vec::new(),
            ..full_assets()
        };
        let mut scene = RecordingScene::default();

        let tiles: Vec<SpawnedTile> = (1..=5)
            .map(|index| {
                let mut tile = platform(index);
                let _ = policy.attach(&mut scene, &assets, ZoneId::new(0), &mut tile, &mut rng);
                tile
            })
            .collect();

        let taken: Vec<bool> = tiles.iter().map(SpawnedTile::has_item).collect();
        assert_eq!(taken, vec![false, true, false, true, true]);
        assert!(tiles[1].attachments().is_empty());
        assert_eq!(scene.spawned.len(), 1);
        assert_eq!(scene.spawned[0].kind, InstanceKind::SpecialPlatform);
        assert_eq!(scene.spawned[0].parent, Some(InstanceId::new(5)));
    }

    #[test]
    fn star_threshold_rolls_within_configured_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..32 {
            let policy = ItemAttachmentPolicy::new(&Config::default(), &mut rng);
            assert!((1..=2).contains(&policy.star().threshold()));
        }
    }

    #[test]
    fn hazard_specials_carry_the_standard_effect() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut policy = ItemAttachmentPolicy::new(&fixed_star_config(), &mut rng);
        let mut scene = RecordingScene::default();
        let assets = full_assets();

        for index in 1..=4 {
            let mut tile = platform(index);
            let _ = policy.attach(&mut scene, &assets, ZoneId::new(0), &mut tile, &mut rng);
        }

        let special = scene
            .spawned
            .iter()
            .find(|request| request.kind == InstanceKind::SpecialPlatform)
            .expect("fourth platform should carry a special");
        assert_eq!(special.hazard, Some(HazardEffect::STANDARD));
        assert_eq!(special.parent, Some(InstanceId::new(4)));
        assert!((special.position.x).abs() <= 0.5);
        assert!((special.position.y - 13.0).abs() < 1e-5);
    }
}
