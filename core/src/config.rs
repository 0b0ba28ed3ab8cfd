// Scene configuration: one TOML document for every generator.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ocean::OceanConfig;
use crate::placement::PlacementConfig;
use crate::terrain::TerrainConfig;
use crate::tree::TreeParameters;

// Everything needed to grow a scene. Missing sections take their defaults,
// so an empty document is a valid scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub seed: u64, // engine seed for ocean, placement and trees
    pub terrain: TerrainConfig,
    pub ocean: OceanConfig,
    pub tree: TreeParameters,
    pub placement: PlacementConfig,
}

impl SceneConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SceneConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    // First invalid parameter of any section
    pub fn validate(&self) -> Result<()> {
        self.terrain.validate()?;
        self.ocean.validate()?;
        self.tree.validate()?;
        self.placement.validate()?;
        Ok(())
    }
}
