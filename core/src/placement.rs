use std::f32::consts::TAU;

use glam::{EulerRot, Quat, Vec3};
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, require_at_least, require_finite, require_range};
use crate::terrain::TerrainGenerator;

// Where to put trees on a terrain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub count: usize,
    pub min_height: f32,        // no trees on beaches or under water
    pub max_slope_degrees: f32, // no trees on cliffs
    pub normal_alignment: f32,  // 0 = upright, 1 = perpendicular to the ground
    pub attempts_per_tree: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            count: 25,
            min_height: 0.5,
            max_slope_degrees: 30.0,
            normal_alignment: 0.3,
            attempts_per_tree: 30,
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_finite("placement.min_height", self.min_height)?;
        require_range("placement.max_slope_degrees", self.max_slope_degrees, 0.0, 90.0)?;
        require_range("placement.normal_alignment", self.normal_alignment, 0.0, 1.0)?;
        require_at_least("placement.attempts_per_tree", self.attempts_per_tree, 1)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreePlacement {
    pub position: Vec3,
    pub rotation: Vec3, // Euler XYZ radians, as taken by `Tree::set_rotation`
}

// Tilt from +Y toward `normal` by `alignment`, then a yaw about the tilted axis
fn placement_rotation(normal: Vec3, alignment: f32, yaw: f32) -> Vec3 {
    let tilt = Quat::IDENTITY.slerp(Quat::from_rotation_arc(Vec3::Y, normal), alignment);
    let (x, y, z) = (tilt * Quat::from_rotation_y(yaw)).to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

// Sample tree sites on the terrain.
//
// Candidates are drawn uniformly over the terrain footprint; a site is kept
// when its cell is at least `min_height` high and no steeper than
// `max_slope_degrees`. Gives up after `count * attempts_per_tree` draws, so
// the result may hold fewer than `count` trees.
pub fn scatter_trees<R: Rng + ?Sized>(
    terrain: &TerrainGenerator,
    config: &PlacementConfig,
    rng: &mut R,
) -> Vec<TreePlacement> {
    let half = terrain.built_config().scale * 0.5;
    let max_attempts = config.count * config.attempts_per_tree;
    let min_up = config.max_slope_degrees.to_radians().cos();
    let mut placements = Vec::with_capacity(config.count);

    let mut attempts = 0;
    while placements.len() < config.count && attempts < max_attempts {
        attempts += 1;
        let x = rng.random_range(-half..=half);
        let z = rng.random_range(-half..=half);

        let height = terrain.height_at_world(x, z);
        if height < config.min_height {
            continue;
        }
        let normal = terrain.normal_at_world(x, z);
        if normal.y < min_up {
            continue;
        }

        let yaw = rng.random_range(0.0..TAU);
        placements.push(TreePlacement {
            position: Vec3::new(x, height, z),
            rotation: placement_rotation(normal, config.normal_alignment, yaw),
        });
    }

    if placements.len() < config.count {
        warn!(
            "placed {} of {} trees after {} attempts",
            placements.len(),
            config.count,
            attempts
        );
    } else {
        debug!("placed {} trees in {} attempts", placements.len(), attempts);
    }
    placements
}
