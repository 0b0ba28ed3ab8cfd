// core holds the scene generators: island terrain, ocean surfaces and trees
pub mod config;
pub mod error;
pub mod fractal;
pub mod mesh;
pub mod ocean;
pub mod perlin3;
pub mod placement;
pub mod preview;
pub mod state;
pub mod terrain;
pub mod tree;
pub mod utils;

pub use glam;

pub use config::SceneConfig;
pub use error::{ConfigurationError, Result, SceneError};
pub use fractal::{NoiseParameters, fbm};
pub use mesh::{Mesh, MeshBuilder, Vertex};
pub use ocean::{GerstnerOcean, OceanConfig, OceanKind, OceanModel, SpectralOcean, build_ocean};
pub use perlin3::Perlin3D;
pub use placement::{PlacementConfig, TreePlacement, scatter_trees};
pub use preview::render_preview;
pub use state::GenerationState;
pub use terrain::{TerrainConfig, TerrainGenerator};
pub use tree::{Tree, TreeParameters};
pub use utils::{HeightMap2D, flatten2, unflatten2};

// Scalar noise field over 3D space.
// Terrain reads the slice noise(x, z, 0) through `sample2`.
pub trait NoiseField {
    fn sample3(&self, x: f32, y: f32, z: f32) -> f32;

    fn sample2(&self, x: f32, z: f32) -> f32 {
        self.sample3(x, z, 0.0)
    }
}
