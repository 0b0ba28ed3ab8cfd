// Recursive tree generation: stems, tube meshes and leaves.

mod leaf;
mod mesh;
mod params;
mod stem;

use glam::{Mat4, Vec3};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub use mesh::extrude_stems;
pub use params::{BranchLevel, LeafParameters, MAX_LEVELS, TreeParameters};
pub use stem::{Stem, StemSegment, TreeGenerator, branch_count_at};

use leaf::build_leaves;

use crate::error::{ConfigurationError, require_finite};
use crate::mesh::Mesh;
use crate::state::GenerationState;

// A tree instance: parameters, placement and lazily built geometry.
//
// Every regeneration runs on a fresh clone of the injected engine, so the
// same parameters and engine always give the same geometry. Use
// [`Tree::set_rng`] for a different tree.
#[derive(Debug, Clone)]
pub struct Tree<R: Rng + Clone = Pcg64Mcg> {
    params: TreeParameters,
    position: Vec3,
    rotation: Vec3, // Euler angles, radians: pitch (x), yaw (y), roll (z)
    rng: R,
    state: GenerationState,

    stems: Vec<Stem>,
    trunk_mesh: Mesh,
    branches_mesh: Mesh,
    leaves_mesh: Mesh,
}

impl Tree<Pcg64Mcg> {
    pub fn with_seed(params: TreeParameters, seed: u64) -> Result<Self, ConfigurationError> {
        Self::new(params, Pcg64Mcg::seed_from_u64(seed))
    }
}

impl<R: Rng + Clone> Tree<R> {
    pub fn new(params: TreeParameters, rng: R) -> Result<Self, ConfigurationError> {
        params.validate()?;
        Ok(Self {
            params,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            rng,
            state: GenerationState::Dirty,
            stems: Vec::new(),
            trunk_mesh: Mesh::default(),
            branches_mesh: Mesh::default(),
            leaves_mesh: Mesh::default(),
        })
    }

    pub fn parameters(&self) -> &TreeParameters {
        &self.params
    }

    pub fn set_parameters(&mut self, params: TreeParameters) -> Result<(), ConfigurationError> {
        params.validate()?;
        self.params = params;
        self.state.mark_dirty();
        Ok(())
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    // Moves the instance; geometry is tree-local and stays clean.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) -> Result<(), ConfigurationError> {
        require_finite("tree.rotation", rotation.x)?;
        require_finite("tree.rotation", rotation.y)?;
        require_finite("tree.rotation", rotation.z)?;
        self.rotation = rotation;
        self.state.mark_dirty();
        Ok(())
    }

    // Replace the engine; the next `ensure_generated` grows a different tree.
    pub fn set_rng(&mut self, rng: R) {
        self.rng = rng;
        self.state.mark_dirty();
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    // Regenerate if dirty. Returns true when work was done.
    pub fn ensure_generated(&mut self) -> bool {
        if !self.state.is_dirty() {
            return false;
        }
        self.regenerate();
        true
    }

    // Unconditionally rebuild stems and meshes.
    pub fn regenerate(&mut self) {
        self.state.begin();
        let mut rng = self.rng.clone();

        self.stems = TreeGenerator::from_validated(&self.params, &mut rng).generate();
        let (trunk, branches) = extrude_stems(&self.stems, self.params.radial_segments);
        self.trunk_mesh = trunk;
        self.branches_mesh = branches;
        self.leaves_mesh = build_leaves(&self.params, &self.stems, &mut rng);

        debug!("tree: {} stems", self.stems.len());
        debug!(
            "tree: trunk {} vertices / {} indices, branches {} / {}, leaves {} / {}",
            self.trunk_mesh.vertex_count(),
            self.trunk_mesh.indices.len(),
            self.branches_mesh.vertex_count(),
            self.branches_mesh.indices.len(),
            self.leaves_mesh.vertex_count(),
            self.leaves_mesh.indices.len()
        );
        self.state.finish();
    }

    // Translation, then pitch, yaw and roll, applied to tree-local geometry.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
    }

    // The accessors below return the last generated geometry; call
    // `ensure_generated` first.

    pub fn stems(&self) -> &[Stem] {
        &self.stems
    }

    pub fn trunk_mesh(&self) -> &Mesh {
        &self.trunk_mesh
    }

    pub fn branches_mesh(&self) -> &Mesh {
        &self.branches_mesh
    }

    pub fn leaves_mesh(&self) -> &Mesh {
        &self.leaves_mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leafy() -> TreeParameters {
        let mut params = TreeParameters::default();
        params.level[1].n_down_angle_v = 10.0;
        params.level[1].n_rotate_v = 30.0;
        params.level[2].n_length_v = 0.05;
        params
    }

    #[test]
    fn generation_is_lazy_and_idempotent() {
        let mut tree = Tree::with_seed(leafy(), 42).unwrap();
        assert!(tree.state().is_dirty());
        assert!(tree.trunk_mesh().is_empty());

        assert!(tree.ensure_generated());
        assert_eq!(tree.state(), GenerationState::Clean);
        assert!(!tree.ensure_generated());

        let leaves = tree.leaves_mesh().clone();
        let branches = tree.branches_mesh().clone();
        tree.set_parameters(leafy()).unwrap();
        assert!(tree.ensure_generated());
        assert_eq!(tree.leaves_mesh(), &leaves);
        assert_eq!(tree.branches_mesh(), &branches);
    }

    #[test]
    fn new_engine_grows_a_different_tree() {
        let mut tree = Tree::with_seed(leafy(), 1).unwrap();
        tree.ensure_generated();
        let before = tree.leaves_mesh().clone();

        tree.set_rng(Pcg64Mcg::seed_from_u64(2));
        assert!(tree.state().is_dirty());
        tree.ensure_generated();
        assert_ne!(tree.leaves_mesh(), &before);
    }

    #[test]
    fn disabling_leaves_empties_leaf_mesh() {
        let mut tree = Tree::with_seed(TreeParameters::default(), 7).unwrap();
        tree.ensure_generated();
        assert!(!tree.leaves_mesh().is_empty());

        let params = TreeParameters {
            has_leaves: false,
            ..Default::default()
        };
        tree.set_parameters(params).unwrap();
        tree.ensure_generated();
        assert_eq!(tree.leaves_mesh().vertex_count(), 0);
        assert_eq!(tree.leaves_mesh().indices.len(), 0);
        assert!(!tree.trunk_mesh().is_empty());
    }

    #[test]
    fn invalid_parameters_leave_tree_clean() {
        let mut tree = Tree::with_seed(TreeParameters::default(), 0).unwrap();
        tree.ensure_generated();
        let bad = TreeParameters {
            radial_segments: 2,
            ..Default::default()
        };
        assert!(tree.set_parameters(bad).is_err());
        assert!(!tree.state().is_dirty());
        assert_eq!(tree.parameters().radial_segments, 16);

        assert!(Tree::with_seed(TreeParameters { levels: 9, ..Default::default() }, 0).is_err());
        assert!(Tree::with_seed(TreeParameters { levels: 0, ..Default::default() }, 0).is_err());
    }

    #[test]
    fn rotation_marks_dirty_and_composes_model_matrix() {
        let mut tree = Tree::with_seed(TreeParameters::default(), 0).unwrap();
        tree.ensure_generated();
        tree.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(!tree.state().is_dirty());

        tree.set_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0)).unwrap();
        assert!(tree.state().is_dirty());
        assert!(tree.set_rotation(Vec3::new(f32::NAN, 0.0, 0.0)).is_err());

        let m = tree.model_matrix();
        let p = m.transform_point3(Vec3::X);
        // yaw by 90° turns +X into -Z, then the translation applies
        assert!((p - Vec3::new(1.0, 2.0, 2.0)).length() < 1e-5);
    }
}
