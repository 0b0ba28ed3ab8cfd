use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use rand::Rng;

use super::{GRAVITY, GerstnerConfig, OceanConfig, OceanModel, grid_position};
use crate::error::{
    ConfigurationError, require_at_least, require_finite, require_positive, require_range,
};
use crate::mesh::{Mesh, MeshBuilder, Vertex, push_grid_indices};

// Each wave heads off by up to this fraction of a radian, alternating sides
const DIRECTION_SPREAD: f32 = 0.3;
// Steepness budget shared by the whole wave set
const STEEPNESS_BUDGET: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GerstnerWave {
    pub wavelength: f32,
    pub amplitude: f32,
    pub speed: f32,     // phase speed from deep-water dispersion
    pub steepness: f32, // 0 = sinusoid, 1 = sharpest crest
    pub direction: Vec2,
}

impl GerstnerWave {
    fn wave_number(&self) -> f32 {
        TAU / self.wavelength
    }

    fn phase(&self, position: Vec2, time: f32) -> f32 {
        let k = self.wave_number();
        k * self.direction.dot(position) - self.speed * k * time
    }
}

// Deep-water phase speed of a wave with the given wavelength
pub fn dispersion_speed(wavelength: f32) -> f32 {
    (GRAVITY * wavelength / TAU).sqrt()
}

pub(super) fn validate(config: &GerstnerConfig) -> Result<(), ConfigurationError> {
    require_at_least("ocean.gerstner.wave_count", config.wave_count, 1)?;
    require_positive("ocean.gerstner.base_wavelength", config.base_wavelength)?;
    require_positive("ocean.gerstner.base_amplitude", config.base_amplitude)?;
    require_positive("ocean.gerstner.wavelength_growth", config.wavelength_growth)?;
    require_positive("ocean.gerstner.amplitude_decay", config.amplitude_decay)?;
    require_range("ocean.gerstner.direction_jitter", config.direction_jitter, 0.0, PI)?;
    require_positive("ocean.gerstner.time_scale", config.time_scale)?;
    Ok(())
}

// Geometric wave progression with alternating headings around +X
fn build_waves<R: Rng + ?Sized>(config: &GerstnerConfig, rng: &mut R) -> Vec<GerstnerWave> {
    let count = config.wave_count;
    (0..count)
        .map(|i| {
            let wavelength = config.base_wavelength * config.wavelength_growth.powi(i as i32);
            let amplitude = config.base_amplitude * config.amplitude_decay.powi(i as i32);
            let steepness = (STEEPNESS_BUDGET / (count as f32 * amplitude)).clamp(0.0, 1.0);

            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            let mut angle = side * DIRECTION_SPREAD * i as f32 / count as f32;
            if config.direction_jitter > 0.0 {
                angle += rng.random_range(-config.direction_jitter..=config.direction_jitter);
            }

            GerstnerWave {
                wavelength,
                amplitude,
                speed: dispersion_speed(wavelength),
                steepness,
                direction: Vec2::from_angle(angle),
            }
        })
        .collect()
}

// Closed-form ocean: a fixed set of Gerstner waves and a clock.
//
// The mesh is a flat grid at sea level. Displacement is applied per vertex
// by whoever draws it, using the same wave set exposed through [`waves`].
//
// [`waves`]: GerstnerOcean::waves
#[derive(Debug, Clone)]
pub struct GerstnerOcean {
    grid_size: usize,
    length_scale: f32,
    sea_level: f32,
    time_scale: f32,
    waves: Vec<GerstnerWave>,
    time: f32,
    mesh: Mesh,
}

impl GerstnerOcean {
    pub fn new<R: Rng + ?Sized>(config: &OceanConfig, rng: &mut R) -> Result<Self, ConfigurationError> {
        require_at_least("ocean.grid_size", config.grid_size, 2)?;
        require_positive("ocean.length_scale", config.length_scale)?;
        require_finite("ocean.sea_level", config.sea_level)?;
        validate(&config.gerstner)?;

        let mut ocean = Self {
            grid_size: config.grid_size,
            length_scale: config.length_scale,
            sea_level: config.sea_level,
            time_scale: config.gerstner.time_scale,
            waves: build_waves(&config.gerstner, rng),
            time: 0.0,
            mesh: Mesh::default(),
        };
        ocean.generate_mesh();
        Ok(ocean)
    }

    pub fn waves(&self) -> &[GerstnerWave] {
        &self.waves
    }

    pub fn sea_level(&self) -> f32 {
        self.sea_level
    }

    pub fn set_sea_level(&mut self, level: f32) -> Result<(), ConfigurationError> {
        require_finite("ocean.sea_level", level)?;
        self.sea_level = level;
        self.generate_mesh();
        Ok(())
    }

    // Displaced position of the surface point that rests at (x, z).
    pub fn displacement_at(&self, x: f32, z: f32, time: f32) -> Vec3 {
        let position = Vec2::new(x, z);
        let mut result = Vec3::new(x, 0.0, z);
        for wave in &self.waves {
            let (sin, cos) = wave.phase(position, time).sin_cos();
            let horizontal = wave.steepness * wave.amplitude * cos;
            result.x += horizontal * wave.direction.x;
            result.y += wave.amplitude * sin;
            result.z += horizontal * wave.direction.y;
        }
        result
    }

    pub fn normal_at(&self, x: f32, z: f32, time: f32) -> Vec3 {
        let position = Vec2::new(x, z);
        let mut normal = Vec3::Y;
        for wave in &self.waves {
            let (sin, cos) = wave.phase(position, time).sin_cos();
            let wa = wave.wave_number() * wave.amplitude;
            normal.x -= wave.direction.x * wa * cos;
            normal.y -= wave.steepness * wa * sin;
            normal.z -= wave.direction.y * wa * cos;
        }
        normal.normalize()
    }

    fn generate_mesh(&mut self) {
        let n = self.grid_size;
        let mut mb = MeshBuilder::with_capacity(n * n, (n - 1) * (n - 1) * 6);
        let last = (n - 1) as f32;
        for z in 0..n {
            for x in 0..n {
                let world_x = grid_position(x, n, self.length_scale);
                let world_z = grid_position(z, n, self.length_scale);
                mb.push_vertex(Vertex::new(
                    Vec3::new(world_x, self.sea_level, world_z),
                    Vec3::Y,
                    Vec2::new(x as f32 / last, z as f32 / last),
                ));
            }
        }
        push_grid_indices(&mut mb, n, n);
        self.mesh = mb.build();
    }
}

impl OceanModel for GerstnerOcean {
    fn update(&mut self, dt: f32) {
        if dt > 0.0 {
            self.time += dt * self.time_scale;
        }
    }

    fn height_at(&self, x: f32, z: f32, time: f32) -> f32 {
        self.sea_level + self.displacement_at(x, z, time).y
    }

    fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn reset(&mut self) {
        self.time = 0.0;
        self.generate_mesh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn ocean(config: &OceanConfig) -> GerstnerOcean {
        GerstnerOcean::new(config, &mut Pcg64Mcg::seed_from_u64(350)).unwrap()
    }

    fn small() -> OceanConfig {
        OceanConfig {
            grid_size: 8,
            length_scale: 16.0,
            ..Default::default()
        }
    }

    #[test]
    fn every_wave_obeys_dispersion() {
        let ocean = ocean(&small());
        assert_eq!(ocean.waves().len(), 8);
        for wave in ocean.waves() {
            let expected = (9.81 * wave.wavelength / (2.0 * PI)).sqrt();
            assert!((wave.speed - expected).abs() < 1e-5);
            assert!((0.0..=1.0).contains(&wave.steepness));
            assert!((wave.direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn waves_follow_geometric_progression() {
        let ocean = ocean(&small());
        let waves = ocean.waves();
        assert_eq!(waves[0].wavelength, 8.0);
        assert_eq!(waves[0].amplitude, 0.15);
        for pair in waves.windows(2) {
            assert!((pair[1].wavelength / pair[0].wavelength - 1.8).abs() < 1e-4);
            assert!((pair[1].amplitude / pair[0].amplitude - 0.6).abs() < 1e-4);
        }
        // 0.3 / (8 * 0.15)
        assert!((waves[0].steepness - 0.25).abs() < 1e-6);
        assert_eq!(waves[7].steepness, 1.0);
    }

    #[test]
    fn without_jitter_directions_are_fixed() {
        let mut config = small();
        config.gerstner.direction_jitter = 0.0;
        let a = GerstnerOcean::new(&config, &mut Pcg64Mcg::seed_from_u64(1)).unwrap();
        let b = GerstnerOcean::new(&config, &mut Pcg64Mcg::seed_from_u64(2)).unwrap();
        assert_eq!(a.waves(), b.waves());
        assert_eq!(a.waves()[0].direction, Vec2::X);
        let expected = Vec2::from_angle(-0.3 / 8.0);
        assert!((a.waves()[1].direction - expected).length() < 1e-6);
    }

    #[test]
    fn clock_advances_at_half_speed() {
        let mut ocean = ocean(&small());
        ocean.update(1.0);
        ocean.update(-3.0);
        ocean.update(f32::NAN);
        assert_eq!(ocean.time(), 0.5);
        ocean.reset();
        assert_eq!(ocean.time(), 0.0);
    }

    #[test]
    fn mesh_is_flat_grid_at_sea_level() {
        let mut config = small();
        config.sea_level = 2.5;
        let ocean = ocean(&config);
        let mesh = ocean.mesh();
        assert_eq!(mesh.vertex_count(), 64);
        assert_eq!(mesh.triangle_count(), 7 * 7 * 2);
        assert!(mesh.vertices.iter().all(|v| v.position.y == 2.5 && v.normal == Vec3::Y));
        // Patch is centred: first vertex sits half a patch from the origin
        assert_eq!(mesh.vertices[0].position.x, -8.0);
        assert_eq!(mesh.vertices[63].uv, Vec2::ONE);
    }

    #[test]
    fn height_sums_wave_sines_over_sea_level() {
        let mut config = small();
        config.sea_level = 1.0;
        let ocean = ocean(&config);
        let (x, z, t) = (3.0, -2.0, 1.7);
        let expected = 1.0
            + ocean
                .waves()
                .iter()
                .map(|w| w.amplitude * w.phase(Vec2::new(x, z), t).sin())
                .sum::<f32>();
        assert!((ocean.height_at(x, z, t) - expected).abs() < 1e-6);
        // Defined everywhere, even far outside the mesh
        assert!(ocean.height_at(1.0e4, -1.0e4, 0.0).is_finite());
    }

    #[test]
    fn normals_are_unit_length() {
        let ocean = ocean(&small());
        for (x, z) in [(0.0, 0.0), (1.3, 4.4), (-7.0, 2.0)] {
            let n = ocean.normal_at(x, z, 2.0);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn rejects_degenerate_wave_sets() {
        let mut config = small();
        config.gerstner.wave_count = 0;
        let err = GerstnerOcean::new(&config, &mut Pcg64Mcg::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, ConfigurationError::BelowMinimum { .. }));

        let mut config = small();
        config.gerstner.base_wavelength = 0.0;
        assert!(GerstnerOcean::new(&config, &mut Pcg64Mcg::seed_from_u64(0)).is_err());
    }
}
