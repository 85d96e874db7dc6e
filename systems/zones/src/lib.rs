#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Zone progression for Skyward.
//!
//! The [`ZoneCatalog`] holds the ordered zone definitions together with the
//! global pickup prefabs and answers asset lookups for the generation
//! systems. The [`ZoneTracker`] resolves the active zone from the current
//! score every tick.

use std::collections::BTreeMap;

use skyward_core::{AssetCategory, AssetResolver, PowerUpKind, Prefab, ZoneDefinition, ZoneId};

pub mod manifest;

pub use manifest::{parse_catalog, CatalogError, CatalogManifest};

/// Ordered list of zones plus the prefabs shared by every zone.
#[derive(Clone, Debug, Default)]
pub struct ZoneCatalog {
    zones: Vec<ZoneDefinition>,
    stars: Vec<Prefab>,
    power_ups: BTreeMap<PowerUpKind, Vec<Prefab>>,
}

impl ZoneCatalog {
    /// Creates a catalog from zones listed in progression order.
    #[must_use]
    pub fn new(zones: Vec<ZoneDefinition>) -> Self {
        Self {
            zones,
            stars: Vec::new(),
            power_ups: BTreeMap::new(),
        }
    }

    /// Registers the star pickup prefab.
    #[must_use]
    pub fn with_star(mut self, prefab: Prefab) -> Self {
        self.stars = vec![prefab];
        self
    }

    /// Registers the pickup prefab for a power-up.
    #[must_use]
    pub fn with_power_up(mut self, kind: PowerUpKind, prefab: Prefab) -> Self {
        let _ = self.power_ups.insert(kind, vec![prefab]);
        self
    }

    /// Number of zones in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the catalog defines no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Zones in progression order.
    #[must_use]
    pub fn zones(&self) -> &[ZoneDefinition] {
        &self.zones
    }

    /// Looks up the definition of a zone.
    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&ZoneDefinition> {
        self.zones.get(id.index())
    }

    /// Resolves the zone active at the provided score.
    ///
    /// The first zone whose `[start, end)` range contains the score wins. A
    /// score past every range falls back to the last zone, so only an empty
    /// catalog yields `None`.
    #[must_use]
    pub fn resolve(&self, score: u32) -> Option<ZoneId> {
        let index = self
            .zones
            .iter()
            .position(|zone| zone.contains_score(score))
            .or_else(|| self.zones.len().checked_sub(1))?;
        u32::try_from(index).ok().map(ZoneId::new)
    }
}

impl AssetResolver for ZoneCatalog {
    fn prefabs(&self, zone: ZoneId, category: AssetCategory) -> &[Prefab] {
        match category {
            AssetCategory::Star => &self.stars,
            AssetCategory::PowerUp(kind) => {
                self.power_ups.get(&kind).map(Vec::as_slice).unwrap_or_default()
            }
            AssetCategory::Background => self
                .zone(zone)
                .map(ZoneDefinition::backgrounds)
                .unwrap_or_default(),
            AssetCategory::Platform => self
                .zone(zone)
                .map(ZoneDefinition::platforms)
                .unwrap_or_default(),
            AssetCategory::SpecialPlatform => self
                .zone(zone)
                .map(ZoneDefinition::specials)
                .unwrap_or_default(),
        }
    }
}

/// Resolves the active zone every tick and remembers the previous answer.
#[derive(Debug, Default)]
pub struct ZoneTracker {
    current: Option<ZoneId>,
}

impl ZoneTracker {
    /// Creates a tracker that has not resolved any zone yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the zone for the score and records it as the current zone.
    pub fn update(&mut self, catalog: &ZoneCatalog, score: u32) -> Option<ZoneId> {
        let resolved = catalog.resolve(score);
        if resolved != self.current {
            if let Some(zone) = resolved.and_then(|id| catalog.zone(id)) {
                log::info!("entered zone `{}` at score {score}", zone.name());
            }
            self.current = resolved;
        }
        resolved
    }

    /// Zone resolved by the most recent update.
    #[must_use]
    pub fn current(&self) -> Option<ZoneId> {
        self.current
    }

    /// Forgets the cached zone so the next update reports a change again.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
