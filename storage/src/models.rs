use isle_core::utils::{HeightMap2D, flatten2, unflatten2};
use isle_core::{NoiseParameters, TerrainConfig, TerrainGenerator};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

// One stored terrain: the parameters it was built from plus the heights it produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub name: String,
    pub seed: u64, // scene seed the terrain was generated alongside
    pub params: NoiseParameters,
    pub width: usize,
    pub height: usize,
    pub scale: f32,
    // Flattened row-major: length = width×height
    pub height_map: Vec<f32>,
}

impl TerrainSnapshot {
    // Capture the terrain's current heightmap along with the configuration
    // it was built from; pending setter changes are not included.
    pub fn from_terrain(name: impl Into<String>, seed: u64, terrain: &TerrainGenerator) -> Self {
        let built = terrain.built_config();
        Self {
            id: None,
            name: name.into(),
            seed,
            params: built.noise,
            width: built.width,
            height: built.height,
            scale: built.scale,
            height_map: flatten2(terrain.height_map()),
        }
    }

    // Configuration that regenerates this terrain
    pub fn terrain_config(&self) -> TerrainConfig {
        TerrainConfig {
            width: self.width,
            height: self.height,
            scale: self.scale,
            noise: self.params,
        }
    }

    pub fn to_height_map(&self) -> HeightMap2D {
        unflatten2(&self.height_map, self.width)
    }

    // The stored buffer matches the stored dimensions
    pub fn is_consistent(&self) -> bool {
        self.height_map.len() == self.width * self.height
    }
}
