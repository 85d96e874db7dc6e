//! Session configuration loaded from TOML.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use skyward_core::ViewExtent;
use skyward_system_backgrounds::Config as BackgroundConfig;
use skyward_system_platforms::Config as PlatformConfig;
use skyward_system_power_ups::Config as PowerUpConfig;
use skyward_system_zones::{parse_catalog, ZoneCatalog};

const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Everything needed to run a headless session.
#[derive(Debug)]
pub(crate) struct SessionConfig {
    pub(crate) seed: u64,
    pub(crate) view: ViewExtent,
    pub(crate) catalog: ZoneCatalog,
    pub(crate) platforms: PlatformConfig,
    pub(crate) backgrounds: BackgroundConfig,
    pub(crate) power_ups: PowerUpConfig,
    pub(crate) autopilot: AutopilotConfig,
}

/// Tuning of the scripted player.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct AutopilotConfig {
    /// Upward speed in world units per second.
    pub(crate) climb_speed: f32,
    /// Downward speed after a missed landing.
    pub(crate) fall_speed: f32,
    /// Probability of missing a landing.
    pub(crate) slip_chance: f64,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            climb_speed: 4.0,
            fall_speed: 6.0,
            slip_chance: 0.02,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    version: u32,
    #[serde(default)]
    seed: u64,
    catalog: PathBuf,
    #[serde(default)]
    view: ViewSection,
    #[serde(default)]
    platforms: PlatformConfig,
    #[serde(default)]
    backgrounds: BackgroundConfig,
    #[serde(default)]
    power_ups: PowerUpConfig,
    #[serde(default)]
    autopilot: AutopilotConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ViewSection {
    half_width: f32,
    half_height: f32,
}

impl Default for ViewSection {
    fn default() -> Self {
        let extent = ViewExtent::default();
        Self {
            half_width: extent.half_width(),
            half_height: extent.half_height(),
        }
    }
}

/// Loads the session configuration and the zone catalog it points at.
///
/// The catalog path is resolved relative to the configuration file.
pub(crate) fn load(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse(&contents, base)
}

fn parse(contents: &str, base: &Path) -> Result<SessionConfig> {
    let file: ConfigFile =
        toml::from_str(contents).context("failed to parse session config toml contents")?;
    if file.version != SUPPORTED_CONFIG_VERSION {
        bail!(
            "unsupported session config version {}; expected {}",
            file.version,
            SUPPORTED_CONFIG_VERSION
        );
    }
    if file.view.half_width <= 0.0 || file.view.half_height <= 0.0 {
        bail!(
            "view extent must be positive, got {}x{}",
            file.view.half_width,
            file.view.half_height
        );
    }

    let catalog_path = base.join(&file.catalog);
    let catalog_source = fs::read_to_string(&catalog_path).with_context(|| {
        format!(
            "failed to read zone catalog at {}",
            catalog_path.display()
        )
    })?;
    let catalog = parse_catalog(&catalog_source)
        .with_context(|| format!("invalid zone catalog at {}", catalog_path.display()))?;
    if catalog.is_empty() {
        bail!("zone catalog at {} defines no zones", catalog_path.display());
    }

    Ok(SessionConfig {
        seed: file.seed,
        view: ViewExtent::new(file.view.half_width, file.view.half_height),
        catalog,
        platforms: file.platforms,
        backgrounds: file.backgrounds,
        power_ups: file.power_ups,
        autopilot: file.autopilot,
    })
}
