// Ocean surface models.
//
// Two interchangeable strategies sit behind [`OceanModel`]:
// - [`GerstnerOcean`]: closed-form superposition of trochoidal waves. The CPU
//   mesh is a flat grid; displacement is evaluated per vertex downstream and
//   `height_at` answers point queries analytically.
// - [`SpectralOcean`]: Tessendorf synthesis from a Phillips spectrum, stepped
//   through an inverse FFT every update and written into the mesh.

pub mod fft;
mod gerstner;
mod spectral;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub use gerstner::{GerstnerOcean, GerstnerWave, dispersion_speed};
pub use spectral::SpectralOcean;

use crate::error::{ConfigurationError, require_at_least, require_finite, require_positive};
use crate::mesh::Mesh;

// Standard gravity, m/s²
pub const GRAVITY: f32 = 9.81;

pub trait OceanModel {
    // Advance the simulation by `dt` seconds. Negative or NaN steps are ignored.
    fn update(&mut self, dt: f32);

    // Surface height at world (x, z). Gerstner evaluates at `time`, the
    // spectral grid answers for its current state.
    fn height_at(&self, x: f32, z: f32, time: f32) -> f32;

    fn mesh(&self) -> &Mesh;

    // Simulation clock in seconds
    fn time(&self) -> f32;

    // Rewind the clock to zero and rebuild the mesh
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OceanKind {
    #[default]
    Gerstner,
    Spectral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GerstnerConfig {
    pub wave_count: usize,
    pub base_wavelength: f32,
    pub base_amplitude: f32,
    pub wavelength_growth: f32, // wavelength multiplier per wave
    pub amplitude_decay: f32,   // amplitude multiplier per wave
    pub direction_jitter: f32,  // max random heading offset, radians
    pub time_scale: f32,        // simulation seconds per elapsed second
}

impl Default for GerstnerConfig {
    fn default() -> Self {
        Self {
            wave_count: 8,
            base_wavelength: 8.0,
            base_amplitude: 0.15,
            wavelength_growth: 1.8,
            amplitude_decay: 0.6,
            direction_jitter: 0.05,
            time_scale: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    pub wind_speed: f32,     // m/s
    pub wind_direction: Vec2,
    pub amplitude: f32,      // Phillips constant A
    pub damping: f32,        // suppression length of small waves
    pub choppiness: f32,     // horizontal displacement factor
    pub height_scale: f32,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            wind_speed: 10.0,
            wind_direction: Vec2::new(1.0, 1.0).normalize(),
            amplitude: 0.0005,
            damping: 0.1,
            choppiness: 1.0,
            height_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanConfig {
    pub model: OceanKind,
    pub grid_size: usize,   // vertices per side
    pub length_scale: f32,  // world size of the simulated patch
    pub sea_level: f32,
    pub gerstner: GerstnerConfig,
    pub spectral: SpectralConfig,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            model: OceanKind::Gerstner,
            grid_size: 128,
            length_scale: 64.0,
            sea_level: 0.0,
            gerstner: GerstnerConfig::default(),
            spectral: SpectralConfig::default(),
        }
    }
}

impl OceanConfig {
    // Checks the shared grid settings and those of the selected model.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_at_least("ocean.grid_size", self.grid_size, 2)?;
        require_positive("ocean.length_scale", self.length_scale)?;
        require_finite("ocean.sea_level", self.sea_level)?;
        match self.model {
            OceanKind::Gerstner => gerstner::validate(&self.gerstner),
            OceanKind::Spectral => spectral::validate(self.grid_size, &self.spectral),
        }
    }
}

// Build the model selected by `config.model`.
pub fn build_ocean<R: Rng + ?Sized>(
    config: &OceanConfig,
    rng: &mut R,
) -> Result<Box<dyn OceanModel>, ConfigurationError> {
    Ok(match config.model {
        OceanKind::Gerstner => Box::new(GerstnerOcean::new(config, rng)?),
        OceanKind::Spectral => Box::new(SpectralOcean::new(config, rng)?),
    })
}

// World position of grid vertex (x, z) on a patch centred at the origin
pub(crate) fn grid_position(index: usize, grid_size: usize, length_scale: f32) -> f32 {
    let cell = length_scale / grid_size as f32;
    (index as f32 - grid_size as f32 / 2.0) * cell
}

// Inverse of `grid_position`, None outside the patch
pub(crate) fn grid_index(world: f32, grid_size: usize, length_scale: f32) -> Option<usize> {
    if !world.is_finite() {
        return None;
    }
    let cell = length_scale / grid_size as f32;
    let index = (world / cell + grid_size as f32 / 2.0).round();
    (index >= 0.0 && index < grid_size as f32).then_some(index as usize)
}
