use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{
    ConfigurationError, require_at_least, require_finite, require_non_negative, require_positive,
};

// Trunk plus up to three generations of branches
pub const MAX_LEVELS: usize = 4;

// Shape of one generation of stems (level 0 is the trunk).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchLevel {
    pub n_length: f32,   // length relative to the parent stem
    pub n_length_v: f32, // length variance
    pub n_curve_res: usize, // segments per stem
    pub n_curve: f32,       // total bend over the stem, degrees
    pub n_curve_v: f32,
    pub n_curve_back: f32, // bend of the second half, degrees; 0 bends the whole stem by n_curve
    pub n_branches: usize, // child stems spawned along each stem of this level
    pub n_down_angle: f32, // degrees away from the parent direction
    pub n_down_angle_v: f32,
    pub n_rotate: f32, // degrees around the parent, per segment
    pub n_rotate_v: f32,
}

impl Default for BranchLevel {
    fn default() -> Self {
        Self {
            n_length: 1.0,
            n_length_v: 0.0,
            n_curve_res: 5,
            n_curve: 0.0,
            n_curve_v: 0.0,
            n_curve_back: 0.0,
            n_branches: 0,
            n_down_angle: 45.0,
            n_down_angle_v: 0.0,
            n_rotate: 140.0,
            n_rotate_v: 0.0,
        }
    }
}

impl BranchLevel {
    fn validate(&self) -> Result<(), ConfigurationError> {
        require_at_least("tree.level.n_curve_res", self.n_curve_res, 1)?;
        require_positive("tree.level.n_length", self.n_length)?;
        require_non_negative("tree.level.n_length_v", self.n_length_v)?;
        require_finite("tree.level.n_curve", self.n_curve)?;
        require_non_negative("tree.level.n_curve_v", self.n_curve_v)?;
        require_finite("tree.level.n_curve_back", self.n_curve_back)?;
        require_finite("tree.level.n_down_angle", self.n_down_angle)?;
        require_non_negative("tree.level.n_down_angle_v", self.n_down_angle_v)?;
        require_finite("tree.level.n_rotate", self.n_rotate)?;
        require_non_negative("tree.level.n_rotate_v", self.n_rotate_v)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafParameters {
    pub lobe_width: f32,
    pub lobe_height: f32,
    pub lobe_offset: f32, // fan centre shift along the leaf axis
    pub lobe_count: usize, // 1 = simple pointed leaf
    pub lobe_scale: f32,   // length of side lobes relative to the first
    pub color: Vec3,
}

impl Default for LeafParameters {
    fn default() -> Self {
        Self {
            lobe_width: 0.4,
            lobe_height: 0.8,
            lobe_offset: 0.1,
            lobe_count: 1,
            lobe_scale: 0.8,
            color: Vec3::new(0.2, 0.6, 0.2),
        }
    }
}

impl LeafParameters {
    fn validate(&self) -> Result<(), ConfigurationError> {
        require_positive("tree.leaf.lobe_width", self.lobe_width)?;
        require_positive("tree.leaf.lobe_height", self.lobe_height)?;
        require_finite("tree.leaf.lobe_offset", self.lobe_offset)?;
        require_at_least("tree.leaf.lobe_count", self.lobe_count, 1)?;
        require_positive("tree.leaf.lobe_scale", self.lobe_scale)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParameters {
    pub scale: f32,      // trunk height
    pub base_size: f32,  // flare bulge at the base
    pub levels: usize,   // active entries of `level`
    pub ratio: f32,      // radius to height ratio
    pub ratio_power: f32, // taper exponent
    pub flare: f32,       // fraction of the trunk that flares

    pub level: [BranchLevel; MAX_LEVELS],

    pub has_leaves: bool,
    pub leaf_scale: f32,
    pub leaves_per_branch: usize,
    pub leaf: LeafParameters,

    pub radial_segments: usize,
}

impl Default for TreeParameters {
    fn default() -> Self {
        let trunk = BranchLevel {
            n_length: 1.0,
            n_curve_res: 10,
            n_branches: 20,
            ..BranchLevel::default()
        };
        let branches = BranchLevel {
            n_length: 0.3,
            n_curve_res: 8,
            n_down_angle: 45.0,
            n_rotate: 72.0,
            n_branches: 16,
            ..BranchLevel::default()
        };
        let twigs = BranchLevel {
            n_length: 0.25,
            n_curve_res: 6,
            n_down_angle: 35.0,
            n_rotate: 120.0,
            n_branches: 0,
            ..BranchLevel::default()
        };

        Self {
            scale: 10.0,
            base_size: 0.15,
            levels: 3,
            ratio: 0.015,
            ratio_power: 1.2,
            flare: 0.6,
            level: [trunk, branches, twigs, BranchLevel::default()],
            has_leaves: true,
            leaf_scale: 0.25,
            leaves_per_branch: 12,
            leaf: LeafParameters::default(),
            radial_segments: 16,
        }
    }
}

impl TreeParameters {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        require_at_least("tree.levels", self.levels, 1)?;
        if self.levels > MAX_LEVELS {
            return Err(ConfigurationError::TooManyLevels {
                value: self.levels,
                max: MAX_LEVELS,
            });
        }
        require_at_least("tree.radial_segments", self.radial_segments, 3)?;
        require_positive("tree.scale", self.scale)?;
        require_non_negative("tree.base_size", self.base_size)?;
        require_positive("tree.ratio", self.ratio)?;
        require_finite("tree.ratio_power", self.ratio_power)?;
        require_non_negative("tree.flare", self.flare)?;
        for level in &self.level[..self.levels] {
            level.validate()?;
        }
        require_positive("tree.leaf_scale", self.leaf_scale)?;
        self.leaf.validate()
    }

    // Parameters of the active levels only
    pub fn active_levels(&self) -> &[BranchLevel] {
        &self.level[..self.levels.min(MAX_LEVELS)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_reference_tree() {
        let p = TreeParameters::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.active_levels().len(), 3);
        assert_eq!(p.level[0].n_branches, 20);
        assert_eq!(p.level[1].n_rotate, 72.0);
        assert_eq!(p.level[2].n_down_angle, 35.0);
        assert_eq!(p.leaves_per_branch, 12);
    }

    #[test]
    fn level_count_is_bounded() {
        let mut p = TreeParameters { levels: 0, ..Default::default() };
        assert!(matches!(
            p.validate(),
            Err(ConfigurationError::BelowMinimum { field: "tree.levels", .. })
        ));
        p.levels = 5;
        assert_eq!(
            p.validate(),
            Err(ConfigurationError::TooManyLevels { value: 5, max: 4 })
        );
        p.levels = 4;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_cylinders_and_leaves() {
        let p = TreeParameters { radial_segments: 2, ..Default::default() };
        assert_eq!(
            p.validate(),
            Err(ConfigurationError::BelowMinimum {
                field: "tree.radial_segments",
                min: 3,
                value: 2
            })
        );

        let mut p = TreeParameters::default();
        p.leaf.lobe_count = 0;
        assert!(p.validate().is_err());

        let mut p = TreeParameters::default();
        p.level[1].n_curve_res = 0;
        assert!(p.validate().is_err());
        // Inactive levels are not checked
        let mut p = TreeParameters::default();
        p.level[3].n_curve_res = 0;
        assert!(p.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let p: TreeParameters = toml::from_str("scale = 6.0\nhas_leaves = false").unwrap();
        assert_eq!(p.scale, 6.0);
        assert!(!p.has_leaves);
        assert_eq!(p.radial_segments, 16);
        assert_eq!(p.level, TreeParameters::default().level);
    }
}
