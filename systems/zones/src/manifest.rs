//! TOML manifest describing the zone catalog.
//!
//! ```toml
//! version = 1
//!
//! [items]
//! star = { key = "star", width = 0.5, height = 0.5 }
//! power_ups = [{ kind = "shield", prefab = { key = "bubble" } }]
//!
//! [[zones]]
//! name = "meadow"
//! start_score = 0
//! end_score = 30
//! backgrounds = [{ key = "sky_a", width = 5.6, height = 10.0 }]
//! platforms = [{ key = "grass", width = 2.0, height = 0.4 }]
//! specials = [{ key = "thorns", hazard = true }]
//! ```

use std::collections::HashSet;

use serde::Deserialize;
use skyward_core::{PowerUpKind, Prefab, ZoneDefinition};
use thiserror::Error;

use crate::ZoneCatalog;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const MIN_ROTATING_BACKGROUNDS: usize = 3;

/// Problems that prevent a zone catalog from loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The manifest is not valid TOML or does not match the expected layout.
    #[error("failed to parse zone catalog manifest")]
    Parse(#[from] toml::de::Error),
    /// The manifest declares a version this build does not understand.
    #[error("unsupported zone catalog version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the manifest.
        found: u32,
        /// Version understood by this build.
        expected: u32,
    },
    /// A zone's score range is empty.
    #[error("zone `{name}` has an empty score range [{start}, {end})")]
    InvalidScoreRange {
        /// Name of the offending zone.
        name: String,
        /// First score of the range.
        start: u32,
        /// First score past the range.
        end: u32,
    },
    /// Two zones share the same name.
    #[error("zone `{0}` is defined more than once")]
    DuplicateZoneName(String),
}

/// Deserialized contents of a zone catalog manifest.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogManifest {
    version: u32,
    #[serde(default)]
    items: ItemManifest,
    #[serde(default)]
    zones: Vec<ZoneDefinition>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct ItemManifest {
    star: Option<Prefab>,
    #[serde(default)]
    power_ups: Vec<PowerUpEntry>,
}

#[derive(Clone, Debug, Deserialize)]
struct PowerUpEntry {
    kind: PowerUpKind,
    prefab: Prefab,
}

impl CatalogManifest {
    /// Parses a manifest from TOML text and checks its version.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let manifest: Self = toml::from_str(contents)?;
        if manifest.version != SUPPORTED_MANIFEST_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: manifest.version,
                expected: SUPPORTED_MANIFEST_VERSION,
            });
        }
        Ok(manifest)
    }

    /// Validates the zones and builds the catalog.
    pub fn into_catalog(self) -> Result<ZoneCatalog, CatalogError> {
        let mut names = HashSet::new();
        for zone in &self.zones {
            if zone.start_score() >= zone.end_score() {
                return Err(CatalogError::InvalidScoreRange {
                    name: zone.name().to_owned(),
                    start: zone.start_score(),
                    end: zone.end_score(),
                });
            }
            if !names.insert(zone.name()) {
                return Err(CatalogError::DuplicateZoneName(zone.name().to_owned()));
            }
            if zone.backgrounds().len() < MIN_ROTATING_BACKGROUNDS {
                log::warn!(
                    "zone `{}` has {} background variants; backgrounds stay empty without {MIN_ROTATING_BACKGROUNDS}",
                    zone.name(),
                    zone.backgrounds().len()
                );
            }
            if zone.platforms().is_empty() {
                log::warn!("zone `{}` has no platform prefabs", zone.name());
            }
        }
        if self.zones.is_empty() {
            log::warn!("zone catalog defines no zones");
        }

        let mut catalog = ZoneCatalog::new(self.zones);
        if let Some(star) = self.items.star {
            catalog = catalog.with_star(star);
        }
        for entry in self.items.power_ups {
            catalog = catalog.with_power_up(entry.kind, entry.prefab);
        }
        Ok(catalog)
    }
}

/// Parses and validates a zone catalog manifest in one step.
pub fn parse_catalog(contents: &str) -> Result<ZoneCatalog, CatalogError> {
    CatalogManifest::from_toml_str(contents)?.into_catalog()
}
