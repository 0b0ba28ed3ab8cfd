use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use log::debug;
use num_complex::Complex32;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg64Mcg;

use super::fft::ifft_2d;
use super::{GRAVITY, OceanConfig, OceanModel, SpectralConfig, grid_index, grid_position};
use crate::error::{
    ConfigurationError, require_at_least, require_finite, require_non_negative, require_positive,
};
use crate::mesh::{Mesh, MeshBuilder, Vertex, grid_normal, push_grid_indices};

// Wave vectors shorter than this carry no energy
const MIN_WAVE_NUMBER: f32 = 1.0e-6;

pub(super) fn validate(grid_size: usize, config: &SpectralConfig) -> Result<(), ConfigurationError> {
    if !grid_size.is_power_of_two() {
        return Err(ConfigurationError::NotPowerOfTwo {
            field: "ocean.grid_size",
            value: grid_size,
        });
    }
    require_positive("ocean.spectral.wind_speed", config.wind_speed)?;
    validate_wind_direction(config.wind_direction)?;
    require_positive("ocean.spectral.amplitude", config.amplitude)?;
    require_non_negative("ocean.spectral.damping", config.damping)?;
    require_non_negative("ocean.spectral.choppiness", config.choppiness)?;
    require_positive("ocean.spectral.height_scale", config.height_scale)?;
    Ok(())
}

fn validate_wind_direction(direction: Vec2) -> Result<(), ConfigurationError> {
    require_finite("ocean.spectral.wind_direction", direction.x)?;
    require_finite("ocean.spectral.wind_direction", direction.y)?;
    require_positive("ocean.spectral.wind_direction", direction.length())
}

// Phillips spectrum
//
// `P(k) = A * exp(-1 / (k L)^2) / k^4 * (k̂ · ŵ)^2 * exp(-k^2 damping^2)`
// with `L = V^2 / g`. `wind_direction` must be normalized.
pub fn phillips(k: Vec2, config: &SpectralConfig) -> f32 {
    let k_len = k.length();
    if k_len < MIN_WAVE_NUMBER {
        return 0.0;
    }
    let k2 = k_len * k_len;
    let largest_wave = config.wind_speed * config.wind_speed / GRAVITY;
    let alignment = (k / k_len).dot(config.wind_direction);

    config.amplitude * (-1.0 / (k2 * largest_wave * largest_wave)).exp() / (k2 * k2)
        * alignment
        * alignment
        * (-k2 * config.damping * config.damping).exp()
}

// Complex sample with independent standard normal parts
fn gaussian_pair<R: Rng + ?Sized>(rng: &mut R) -> Complex32 {
    Complex32::new(rng.sample(StandardNormal), rng.sample(StandardNormal))
}

// Tessendorf ocean: a Phillips-spectrum height field evolved in the
// frequency domain and brought back to a displaced grid with an inverse FFT
// every step.
#[derive(Debug, Clone)]
pub struct SpectralOcean {
    grid_size: usize,
    length_scale: f32,
    sea_level: f32,
    config: SpectralConfig,
    seed: u64, // spectrum draws replay from here on every rebuild
    time: f32,

    // Frequency domain, row-major, lattice centred at (n/2, n/2)
    wave_vectors: Vec<Vec2>,
    h0: Vec<Complex32>,
    h0_conj: Vec<Complex32>,

    // Spatial domain
    heights: Vec<f32>,
    displacement_x: Vec<f32>,
    displacement_z: Vec<f32>,

    mesh: Mesh,
}

impl SpectralOcean {
    // Draws the spectrum seed from `rng`; the grid size must be a power of two.
    pub fn new<R: Rng + ?Sized>(config: &OceanConfig, rng: &mut R) -> Result<Self, ConfigurationError> {
        require_at_least("ocean.grid_size", config.grid_size, 2)?;
        require_positive("ocean.length_scale", config.length_scale)?;
        require_finite("ocean.sea_level", config.sea_level)?;
        validate(config.grid_size, &config.spectral)?;

        let n = config.grid_size;
        let mut spectral = config.spectral;
        spectral.wind_direction = spectral.wind_direction.normalize();

        let wave_vectors = (0..n * n)
            .map(|i| {
                let (x, z) = (i % n, i / n);
                let centred = |v: usize| TAU * (v as f32 - n as f32 / 2.0) / config.length_scale;
                Vec2::new(centred(x), centred(z))
            })
            .collect();

        let mut ocean = Self {
            grid_size: n,
            length_scale: config.length_scale,
            sea_level: config.sea_level,
            config: spectral,
            seed: rng.random(),
            time: 0.0,
            wave_vectors,
            h0: Vec::new(),
            h0_conj: Vec::new(),
            heights: vec![0.0; n * n],
            displacement_x: vec![0.0; n * n],
            displacement_z: vec![0.0; n * n],
            mesh: Mesh::default(),
        };
        ocean.initialize_spectrum();
        ocean.evaluate();
        Ok(ocean)
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    pub fn sea_level(&self) -> f32 {
        self.sea_level
    }

    // Spatial-domain heights above sea level, row-major
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn set_wind_speed(&mut self, speed: f32) -> Result<(), ConfigurationError> {
        require_positive("ocean.spectral.wind_speed", speed)?;
        self.config.wind_speed = speed;
        self.respectrum();
        Ok(())
    }

    // Any non-zero direction; stored normalized.
    pub fn set_wind_direction(&mut self, direction: Vec2) -> Result<(), ConfigurationError> {
        validate_wind_direction(direction)?;
        self.config.wind_direction = direction.normalize();
        self.respectrum();
        Ok(())
    }

    pub fn set_amplitude(&mut self, amplitude: f32) -> Result<(), ConfigurationError> {
        require_positive("ocean.spectral.amplitude", amplitude)?;
        self.config.amplitude = amplitude;
        self.respectrum();
        Ok(())
    }

    pub fn set_damping(&mut self, damping: f32) -> Result<(), ConfigurationError> {
        require_non_negative("ocean.spectral.damping", damping)?;
        self.config.damping = damping;
        self.respectrum();
        Ok(())
    }

    pub fn set_choppiness(&mut self, choppiness: f32) -> Result<(), ConfigurationError> {
        require_non_negative("ocean.spectral.choppiness", choppiness)?;
        self.config.choppiness = choppiness;
        self.evaluate();
        Ok(())
    }

    pub fn set_height_scale(&mut self, scale: f32) -> Result<(), ConfigurationError> {
        require_positive("ocean.spectral.height_scale", scale)?;
        self.config.height_scale = scale;
        self.evaluate();
        Ok(())
    }

    pub fn set_sea_level(&mut self, level: f32) -> Result<(), ConfigurationError> {
        require_finite("ocean.sea_level", level)?;
        self.sea_level = level;
        self.evaluate();
        Ok(())
    }

    fn respectrum(&mut self) {
        self.initialize_spectrum();
        self.evaluate();
    }

    // h0(k) and the conjugate partner at -k are drawn independently
    fn initialize_spectrum(&mut self) {
        let mut rng = Pcg64Mcg::seed_from_u64(self.seed);
        let config = self.config;
        let (h0, h0_conj): (Vec<_>, Vec<_>) = self
            .wave_vectors
            .iter()
            .map(|&k| {
                let h = gaussian_pair(&mut rng) * (phillips(k, &config) / 2.0).sqrt();
                let h_minus = gaussian_pair(&mut rng) * (phillips(-k, &config) / 2.0).sqrt();
                (h, h_minus.conj())
            })
            .unzip();
        self.h0 = h0;
        self.h0_conj = h0_conj;
        debug!(
            "spectral ocean: spectrum sampled on {n}x{n} grid, wind {:.1} m/s",
            self.config.wind_speed,
            n = self.grid_size
        );
    }

    // h(k, t) at the current clock, back to the spatial grid, into the mesh
    fn evaluate(&mut self) {
        let n = self.grid_size;
        let zero = Complex32::new(0.0, 0.0);
        let mut height = vec![zero; n * n];
        let mut slope_x = vec![zero; n * n];
        let mut slope_z = vec![zero; n * n];

        for (i, &k) in self.wave_vectors.iter().enumerate() {
            let k_len = k.length();
            let omega = (GRAVITY * k_len).sqrt();
            let phase = Complex32::from_polar(1.0, omega * self.time);
            let h = self.h0[i] * phase + self.h0_conj[i] * phase.conj();
            height[i] = h;
            if k_len >= MIN_WAVE_NUMBER {
                let ih = Complex32::i() * h;
                slope_x[i] = ih * (k.x / k_len);
                slope_z[i] = ih * (k.y / k_len);
            }
        }

        ifft_2d(&mut height, n);
        ifft_2d(&mut slope_x, n);
        ifft_2d(&mut slope_z, n);

        let scale = self.config.height_scale;
        let chop = self.config.choppiness;
        for z in 0..n {
            for x in 0..n {
                let i = z * n + x;
                // Undo the half-grid shift of the centred lattice
                let sign = if (x + z) % 2 == 0 { 1.0 } else { -1.0 };
                self.heights[i] = sign * height[i].re * scale;
                self.displacement_x[i] = sign * slope_x[i].re * chop;
                self.displacement_z[i] = sign * slope_z[i].re * chop;
            }
        }

        self.generate_mesh();
    }

    fn generate_mesh(&mut self) {
        let n = self.grid_size;
        let last = (n - 1) as f32;
        let mut mb = MeshBuilder::with_capacity(n * n, (n - 1) * (n - 1) * 6);
        for z in 0..n {
            for x in 0..n {
                let i = z * n + x;
                let position = Vec3::new(
                    grid_position(x, n, self.length_scale) + self.displacement_x[i],
                    self.sea_level + self.heights[i],
                    grid_position(z, n, self.length_scale) + self.displacement_z[i],
                );
                mb.push_vertex(Vertex::new(
                    position,
                    grid_normal(&self.heights, n, n, x, z),
                    Vec2::new(x as f32 / last, z as f32 / last),
                ));
            }
        }
        push_grid_indices(&mut mb, n, n);
        self.mesh = mb.build();
    }
}

impl OceanModel for SpectralOcean {
    fn update(&mut self, dt: f32) {
        if dt > 0.0 {
            self.time += dt;
            self.evaluate();
        }
    }

    // Reads the current grid; `time` is ignored. Outside the patch: 0.
    fn height_at(&self, x: f32, z: f32, _time: f32) -> f32 {
        let n = self.grid_size;
        match (
            grid_index(x, n, self.length_scale),
            grid_index(z, n, self.length_scale),
        ) {
            (Some(gx), Some(gz)) => self.sea_level + self.heights[gz * n + gx],
            _ => 0.0,
        }
    }

    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.evaluate();
    }
}
