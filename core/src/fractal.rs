use serde::{Deserialize, Serialize};

use crate::NoiseField;
use crate::error::{
    ConfigurationError, require_at_least, require_finite, require_non_negative, require_positive,
};

// Parameters of the fractal height function and the island shaping applied on top
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParameters {
    pub amplitude: f32,      // height of the first octave
    pub frequency: f32,      // lattice cells per world unit of the first octave
    pub octaves: usize,      // number of octaves to sum (>= 1)
    pub persistence: f32,    // amplitude multiplier per octave
    pub lacunarity: f32,     // frequency multiplier per octave
    pub island_falloff: f32, // exponent of the radial falloff outside the plateau
    pub min_height: f32,     // floor applied after shaping
    pub seed: Option<u64>,   // None keeps the reference permutation table
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            amplitude: 7.544,
            frequency: 0.158,
            octaves: 7,
            persistence: 0.453,
            lacunarity: 1.914,
            island_falloff: 3.0,
            min_height: 0.0,
            seed: None,
        }
    }
}

impl NoiseParameters {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_positive("terrain.noise.amplitude", self.amplitude)?;
        require_finite("terrain.noise.frequency", self.frequency)?;
        require_at_least("terrain.noise.octaves", self.octaves, 1)?;
        require_finite("terrain.noise.persistence", self.persistence)?;
        require_finite("terrain.noise.lacunarity", self.lacunarity)?;
        require_non_negative("terrain.noise.island_falloff", self.island_falloff)?;
        require_finite("terrain.noise.min_height", self.min_height)
    }
}

// Sum of `octaves` layers of noise sampled on the third-axis-zero slice:
// amplitude * persistence^i * noise(x * frequency * lacunarity^i, z * ..., 0)
pub fn fbm<N: NoiseField + ?Sized>(noise: &N, x: f32, z: f32, params: &NoiseParameters) -> f32 {
    let mut value = 0.0;
    let mut amplitude = params.amplitude;
    let mut frequency = params.frequency;

    for _ in 0..params.octaves {
        value += amplitude * noise.sample3(x * frequency, z * frequency, 0.0);
        amplitude *= params.persistence;
        frequency *= params.lacunarity;
    }

    value
}
