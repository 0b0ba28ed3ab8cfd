use glam::{Vec2, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, require_at_least, require_positive};
use crate::fractal::{NoiseParameters, fbm};
use crate::mesh::{Mesh, MeshBuilder, Vertex, grid_normal, push_grid_indices};
use crate::perlin3::Perlin3D;
use crate::state::GenerationState;
use crate::utils::{HeightMap2D, flatten2};

// Normalized radius of the flat island plateau
const PLATEAU_RADIUS: f32 = 0.4;
// Exponent of the height redistribution curve
const REDISTRIBUTION_POWER: f32 = 1.3;

// Grid dimensions plus noise parameters: everything the terrain is built from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub width: usize,  // cells along x
    pub height: usize, // cells along z
    pub scale: f32,    // world-space extent of the whole grid
    pub noise: NoiseParameters,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            scale: 20.0,
            noise: NoiseParameters::default(),
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_at_least("terrain.width", self.width, 2)?;
        require_at_least("terrain.height", self.height, 2)?;
        require_positive("terrain.scale", self.scale)?;
        self.noise.validate()
    }
}

// Radial attenuation of a cell at normalized coordinates (nx, nz) in [-1, 1]:
// 1 inside the plateau, then a linear ramp to 0 at distance 1 raised to `exponent`.
pub fn island_falloff(nx: f32, nz: f32, exponent: f32) -> f32 {
    let distance = (nx * nx + nz * nz).sqrt();
    if distance < PLATEAU_RADIUS {
        return 1.0;
    }
    let ramp = (1.0 - (distance - PLATEAU_RADIUS) / (1.0 - PLATEAU_RADIUS)).max(0.0);
    ramp.powf(exponent)
}

// Flattens beaches and sharpens peaks. Only positive heights are reshaped.
pub fn redistribute(height: f32, amplitude: f32) -> f32 {
    if height > 0.0 {
        (height / amplitude).powf(REDISTRIBUTION_POWER) * amplitude
    } else {
        height
    }
}

fn noise_for(params: &NoiseParameters) -> Perlin3D {
    match params.seed {
        Some(seed) => Perlin3D::with_seed(seed),
        None => Perlin3D::reference(),
    }
}

// Island heightmap built from fractal Perlin noise, plus its surface mesh.
// Setters only mark the terrain dirty; `update` or `regenerate` rebuild it.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    config: TerrainConfig,
    built: TerrainConfig, // what `heights` and `mesh` were last generated from
    noise: Perlin3D,
    heights: HeightMap2D,
    mesh: Mesh,
    state: GenerationState,
}

impl TerrainGenerator {
    // Builds the heightmap and mesh synchronously with the default noise parameters
    pub fn new(width: usize, height: usize, scale: f32) -> Result<Self, ConfigurationError> {
        Self::from_config(&TerrainConfig {
            width,
            height,
            scale,
            noise: NoiseParameters::default(),
        })
    }

    pub fn from_config(config: &TerrainConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let mut terrain = Self {
            config: *config,
            built: *config,
            noise: noise_for(&config.noise),
            heights: Vec::new(),
            mesh: Mesh::default(),
            state: GenerationState::Dirty,
        };
        terrain.regenerate();
        Ok(terrain)
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn scale(&self) -> f32 {
        self.config.scale
    }

    // Configuration of the current heightmap and mesh. Differs from `config`
    // while setter changes wait for `update`.
    pub fn built_config(&self) -> &TerrainConfig {
        &self.built
    }

    pub fn noise_parameters(&self) -> &NoiseParameters {
        &self.config.noise
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    // Validates a modified copy of the config and only then commits it
    fn reconfigure(
        &mut self,
        change: impl FnOnce(&mut TerrainConfig),
    ) -> Result<(), ConfigurationError> {
        let mut next = self.config;
        change(&mut next);
        next.validate()?;
        if next.noise.seed != self.config.noise.seed {
            self.noise = noise_for(&next.noise);
        }
        self.config = next;
        self.state.mark_dirty();
        Ok(())
    }

    pub fn set_width(&mut self, width: usize) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.width = width)
    }

    pub fn set_height(&mut self, height: usize) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.height = height)
    }

    pub fn set_scale(&mut self, scale: f32) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.scale = scale)
    }

    pub fn set_amplitude(&mut self, amplitude: f32) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise.amplitude = amplitude)
    }

    pub fn set_frequency(&mut self, frequency: f32) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise.frequency = frequency)
    }

    pub fn set_octaves(&mut self, octaves: usize) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise.octaves = octaves)
    }

    pub fn set_persistence(&mut self, persistence: f32) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise.persistence = persistence)
    }

    pub fn set_lacunarity(&mut self, lacunarity: f32) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise.lacunarity = lacunarity)
    }

    pub fn set_island_falloff(&mut self, falloff: f32) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise.island_falloff = falloff)
    }

    pub fn set_min_height(&mut self, min_height: f32) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise.min_height = min_height)
    }

    pub fn set_seed(&mut self, seed: Option<u64>) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise.seed = seed)
    }

    pub fn set_noise_parameters(&mut self, params: NoiseParameters) -> Result<(), ConfigurationError> {
        self.reconfigure(|c| c.noise = params)
    }

    // Regenerates only if a parameter changed since the last build
    pub fn update(&mut self) -> bool {
        if !self.state.is_dirty() {
            return false;
        }
        self.regenerate();
        true
    }

    // Unconditionally rebuilds heightmap and mesh
    pub fn regenerate(&mut self) {
        self.state.begin();
        self.built = self.config;
        self.generate_height_map();
        self.generate_mesh();
        self.state.finish();
        debug!(
            "terrain {}x{} regenerated: {} vertices, {} indices",
            self.config.width,
            self.config.height,
            self.mesh.vertex_count(),
            self.mesh.indices.len()
        );
    }

    fn generate_height_map(&mut self) {
        let TerrainConfig {
            width,
            height,
            scale,
            noise: params,
        } = self.built;
        let span_x = (width - 1) as f32;
        let span_z = (height - 1) as f32;

        let mut map = vec![vec![0.0f32; width]; height];
        for (z, row) in map.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                let world_x = x as f32 / span_x * scale;
                let world_z = z as f32 / span_z * scale;
                let noise_value = fbm(&self.noise, world_x, world_z, &params);

                let nx = x as f32 / span_x * 2.0 - 1.0;
                let nz = z as f32 / span_z * 2.0 - 1.0;
                let shaped = noise_value * island_falloff(nx, nz, params.island_falloff);

                *cell = redistribute(shaped, params.amplitude).max(params.min_height);
            }
        }
        self.heights = map;
    }

    fn generate_mesh(&mut self) {
        let TerrainConfig {
            width,
            height,
            scale,
            ..
        } = self.built;
        let span_x = (width - 1) as f32;
        let span_z = (height - 1) as f32;
        let flat = flatten2(&self.heights);

        let mut mb = MeshBuilder::with_capacity(width * height, (width - 1) * (height - 1) * 6);
        for z in 0..height {
            for x in 0..width {
                let position = Vec3::new(
                    x as f32 / span_x * scale - scale * 0.5,
                    flat[z * width + x],
                    z as f32 / span_z * scale - scale * 0.5,
                );
                let normal = grid_normal(&flat, width, height, x, z);
                let uv = Vec2::new(x as f32 / span_x, z as f32 / span_z);
                mb.push_vertex(Vertex::new(position, normal, uv));
            }
        }
        push_grid_indices(&mut mb, width, height);

        self.mesh = mb.build();
    }

    pub fn height_map(&self) -> &HeightMap2D {
        &self.heights
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    // Queries answer from the last built grid, even while the terrain is dirty.

    // Height of grid cell (x, z); 0 outside the grid
    pub fn height_at(&self, x: i64, z: i64) -> f32 {
        self.cell(x, z).map_or(0.0, |(x, z)| self.heights[z][x])
    }

    fn cell(&self, x: i64, z: i64) -> Option<(usize, usize)> {
        let in_x = (0..self.built.width as i64).contains(&x);
        let in_z = (0..self.built.height as i64).contains(&z);
        (in_x && in_z).then_some((x as usize, z as usize))
    }

    // Nearest grid cell under a world-space position, if the terrain covers it
    pub fn world_to_cell(&self, x: f32, z: f32) -> Option<(usize, usize)> {
        if !x.is_finite() || !z.is_finite() {
            return None;
        }
        let TerrainConfig {
            width,
            height,
            scale,
            ..
        } = self.built;
        let nx = (x + scale * 0.5) / scale;
        let nz = (z + scale * 0.5) / scale;
        let gx = (nx * (width - 1) as f32).round() as i64;
        let gz = (nz * (height - 1) as f32).round() as i64;
        self.cell(gx, gz)
    }

    pub fn height_at_world(&self, x: f32, z: f32) -> f32 {
        self.world_to_cell(x, z)
            .map_or(0.0, |(cx, cz)| self.heights[cz][cx])
    }

    pub fn normal_at_world(&self, x: f32, z: f32) -> Vec3 {
        self.world_to_cell(x, z)
            .map_or(Vec3::Y, |(cx, cz)| {
                self.mesh.vertices[cz * self.built.width + cx].normal
            })
    }
}
