use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::Rng;

use super::params::TreeParameters;
use crate::error::ConfigurationError;

// Thinnest radius a stem ring may have
const MIN_RADIUS: f32 = 0.005;
// A child stem is never thicker than this fraction of the ring it grows from
const CHILD_RADIUS_CAP: f32 = 0.5;

// One ring along a stem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StemSegment {
    pub position: Vec3,
    pub direction: Vec3, // unit
    pub rotation: Quat,  // maps +Y onto `direction`
    pub radius: f32,
    pub length: f32,
    pub level: usize,
    pub segment_index: usize,
    pub total_segments: usize,
}

// A trunk, branch or twig. Rings run base to tip, `n_curve_res + 1` of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Stem {
    pub position: Vec3,
    pub direction: Vec3,
    pub radius: f32, // radius of the parent ring, or the base size for the trunk
    pub length: f32,
    pub level: usize,
    pub parent: Option<usize>, // index into the stem list
    pub parent_segment: Option<usize>,
    pub segments: Vec<StemSegment>,
}

// Uniform offset in `[-variance, variance]`; no draw for a zero variance.
pub(crate) fn variance<R: Rng + ?Sized>(rng: &mut R, variance: f32) -> f32 {
    if variance > 0.0 {
        rng.random_range(-variance..=variance)
    } else {
        0.0
    }
}

// Any unit vector perpendicular to `dir`
pub(crate) fn perpendicular(dir: Vec3) -> Vec3 {
    if dir.dot(Vec3::Z).abs() < 0.99 {
        dir.cross(Vec3::Z).normalize()
    } else {
        dir.cross(Vec3::X).normalize()
    }
}

// How many of `n_branches` children grow from ring `segment_index` of a stem
// with `total_segments` segments.
//
// The base ring and the tip never branch. When there are enough inner rings
// the children are spread one per ring; otherwise they are packed several
// per ring from the base up. Summed over all rings the result is
// `n_branches` whenever the stem has at least one inner ring.
pub fn branch_count_at(n_branches: usize, segment_index: usize, total_segments: usize) -> usize {
    if n_branches == 0 || segment_index == 0 || segment_index >= total_segments {
        return 0;
    }
    let available = total_segments.saturating_sub(2);
    if available == 0 {
        return 0;
    }

    if n_branches <= available {
        let per_branch = available as f32 / n_branches as f32;
        let hit = (0..n_branches).any(|b| {
            let target = 1 + (b as f32 * per_branch + per_branch * 0.5).round() as usize;
            target == segment_index
        });
        usize::from(hit)
    } else {
        let per_segment = n_branches.div_ceil(available);
        let start = (segment_index - 1) * per_segment;
        let end = (start + per_segment).min(n_branches);
        end.saturating_sub(start)
    }
}

// Recursive stem walk.
//
// Stems are stored flat in pre-order: a stem's index is reserved before its
// children are generated, so the trunk is always stem 0.
pub struct TreeGenerator<'a, R: Rng + ?Sized> {
    params: &'a TreeParameters,
    rng: &'a mut R,
    stems: Vec<Stem>,
}

impl<'a, R: Rng + ?Sized> TreeGenerator<'a, R> {
    // Rejects the parameters `Tree::new` would reject
    pub fn new(params: &'a TreeParameters, rng: &'a mut R) -> Result<Self, ConfigurationError> {
        params.validate()?;
        Ok(Self::from_validated(params, rng))
    }

    pub(crate) fn from_validated(params: &'a TreeParameters, rng: &'a mut R) -> Self {
        Self {
            params,
            rng,
            stems: Vec::new(),
        }
    }

    pub fn stems(&self) -> &[Stem] {
        &self.stems
    }

    // Walk the whole tree from a vertical trunk at the origin.
    pub fn generate(mut self) -> Vec<Stem> {
        let trunk_length = self.params.scale * self.params.level[0].n_length;
        self.generate_stem(0, Vec3::ZERO, Vec3::Y, trunk_length, self.params.base_size, None);
        self.stems
    }

    // Taper law for a ring at distance `offset` from the base of a stem.
    pub fn stem_radius(&self, level: usize, offset: f32, length: f32) -> f32 {
        let p = self.params;
        let unit_taper = offset / length;
        let taper = (1.0 - unit_taper).max(0.0).powf(p.ratio_power);

        let radius = if level == 0 {
            let mut radius = p.scale * p.ratio * taper;
            if offset < p.flare * length {
                let flare_amount = 1.0 - offset / (p.flare * length);
                radius += flare_amount * flare_amount * p.flare * p.base_size;
            }
            radius
        } else {
            p.scale * p.ratio * length.powf(p.ratio_power) * taper
        };
        radius.max(MIN_RADIUS)
    }

    // Children at ring `segment_index`; the deepest level never branches.
    pub fn branches_at_segment(&self, level: usize, segment_index: usize, total_segments: usize) -> usize {
        if level + 1 >= self.params.levels {
            return 0;
        }
        branch_count_at(self.params.level[level].n_branches, segment_index, total_segments)
    }

    // Generate one stem and, recursively, everything growing from it.
    // Returns the index of the new stem, or None past the deepest level.
    pub fn generate_stem(
        &mut self,
        level: usize,
        start: Vec3,
        direction: Vec3,
        length: f32,
        base_radius: f32,
        parent: Option<(usize, usize)>,
    ) -> Option<usize> {
        if level >= self.params.levels {
            return None;
        }
        let lp = self.params.level[level];
        let direction = direction.normalize();

        let index = self.stems.len();
        self.stems.push(Stem {
            position: start,
            direction,
            radius: base_radius,
            length,
            level,
            parent: parent.map(|(stem, _)| stem),
            parent_segment: parent.map(|(_, segment)| segment),
            segments: Vec::with_capacity(lp.n_curve_res + 1),
        });

        let res = lp.n_curve_res;
        let segment_length = length / res as f32;
        let bend_axis = perpendicular(direction);
        let curve = lp.n_curve + variance(&mut *self.rng, lp.n_curve_v);
        let mut position = start;
        let mut current = direction;

        for i in 0..=res {
            let offset = i as f32 * segment_length;
            let mut radius = self.stem_radius(level, offset, length);
            if level > 0 && base_radius > 0.0 {
                radius = radius.min(base_radius * CHILD_RADIUS_CAP);
            }

            self.stems[index].segments.push(StemSegment {
                position,
                direction: current,
                rotation: Quat::from_rotation_arc(Vec3::Y, current),
                radius,
                length: segment_length,
                level,
                segment_index: i,
                total_segments: res,
            });

            let count = self.branches_at_segment(level, i, res);
            if count > 0 {
                self.spawn_children(level, index, i, position, current, length, radius, count);
            }

            if i < res {
                position += current * segment_length;
                let bend = self.segment_bend(curve, lp.n_curve_back, i, res);
                if bend != 0.0 {
                    current = (Quat::from_axis_angle(bend_axis, bend.to_radians()) * current).normalize();
                }
            }
        }

        Some(index)
    }

    // Bend in degrees applied after segment `i`
    fn segment_bend(&self, curve: f32, curve_back: f32, i: usize, res: usize) -> f32 {
        if curve_back == 0.0 || res < 2 {
            curve / res as f32
        } else if i < res / 2 {
            curve / (res / 2) as f32
        } else {
            curve_back / (res - res / 2) as f32
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_children(
        &mut self,
        level: usize,
        stem: usize,
        segment: usize,
        position: Vec3,
        direction: Vec3,
        length: f32,
        radius: f32,
        count: usize,
    ) {
        let child = self.params.level[level + 1];
        let spacing = TAU / count as f32;
        let around = perpendicular(direction);

        for b in 0..count {
            let rotate = (child.n_rotate * segment as f32).to_radians()
                + b as f32 * spacing
                + variance(&mut *self.rng, child.n_rotate_v).to_radians();
            let down = (child.n_down_angle + variance(&mut *self.rng, child.n_down_angle_v)).to_radians();

            let outward = Quat::from_axis_angle(direction, rotate) * around;
            let down_axis = direction.cross(outward).normalize();
            let child_direction = Quat::from_axis_angle(down_axis, down) * direction;

            let child_length = length * (child.n_length + variance(&mut *self.rng, child.n_length_v)).max(0.0);
            if child_length <= 0.0 {
                continue;
            }
            self.generate_stem(
                level + 1,
                position,
                child_direction,
                child_length,
                radius,
                Some((stem, segment)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn total(n_branches: usize, total_segments: usize) -> usize {
        (0..=total_segments)
            .map(|i| branch_count_at(n_branches, i, total_segments))
            .sum()
    }

    #[test]
    fn branch_counts_are_conserved() {
        // one per ring
        assert_eq!(total(3, 10), 3);
        assert_eq!(total(8, 10), 8);
        // packed several per ring
        assert_eq!(total(20, 10), 20);
        assert_eq!(total(16, 8), 16);
        assert_eq!(total(13, 5), 13);
        // more branches than rings at all
        assert_eq!(total(30, 4), 30);
    }

    #[test]
    fn base_and_tip_never_branch() {
        for (n, res) in [(3, 10), (20, 10), (7, 3)] {
            assert_eq!(branch_count_at(n, 0, res), 0);
            assert_eq!(branch_count_at(n, res, res), 0);
        }
        // No inner ring to grow from
        assert_eq!(total(5, 2), 0);
        assert_eq!(total(0, 10), 0);
    }

    #[test]
    fn packing_fills_from_the_base() {
        // 20 over 8 inner rings: 3 each, 2 on the seventh, none on the eighth
        let counts: Vec<usize> = (1..=8).map(|i| branch_count_at(20, i, 10)).collect();
        assert_eq!(counts, vec![3, 3, 3, 3, 3, 3, 2, 0]);
    }

    #[test]
    fn stem_past_last_level_is_not_generated() {
        let params = TreeParameters::default();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        for depth in [params.levels, params.levels + 1] {
            let mut generator = TreeGenerator::new(&params, &mut rng).unwrap();
            let index = generator.generate_stem(depth, Vec3::ZERO, Vec3::Y, 1.0, 0.1, None);
            assert_eq!(index, None);
            assert!(generator.stems().is_empty());
        }
    }

    #[test]
    fn generator_rejects_invalid_parameters() {
        let mut rng = Pcg64Mcg::seed_from_u64(0);

        let mut too_deep = TreeParameters {
            levels: 5,
            ..Default::default()
        };
        for level in &mut too_deep.level {
            level.n_branches = 1;
        }
        assert!(matches!(
            TreeGenerator::new(&too_deep, &mut rng),
            Err(ConfigurationError::TooManyLevels { value: 5, max: 4 })
        ));

        let empty = TreeParameters {
            levels: 0,
            ..Default::default()
        };
        assert!(matches!(
            TreeGenerator::new(&empty, &mut rng),
            Err(ConfigurationError::BelowMinimum { value: 0, .. })
        ));

        let mut unsegmented = TreeParameters::default();
        unsegmented.level[1].n_curve_res = 0;
        assert!(TreeGenerator::new(&unsegmented, &mut rng).is_err());
    }

    #[test]
    fn reference_tree_has_expected_hierarchy() {
        let params = TreeParameters::default();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let stems = TreeGenerator::new(&params, &mut rng).unwrap().generate();

        // trunk + 20 branches + 16 twigs on each branch
        assert_eq!(stems.len(), 1 + 20 + 20 * 16);
        assert_eq!(stems[0].level, 0);
        assert_eq!(stems[0].parent, None);
        assert_eq!(stems[0].segments.len(), 11);
        assert_eq!(stems.iter().filter(|s| s.level == 2).count(), 320);

        for stem in &stems[1..] {
            let parent = &stems[stem.parent.unwrap()];
            assert_eq!(parent.level + 1, stem.level);
            let ring = &parent.segments[stem.parent_segment.unwrap()];
            assert_eq!(ring.position, stem.position);
            assert!(stem.radius <= ring.radius + 1e-6);
        }
    }

    #[test]
    fn radius_tapers_and_respects_floor() {
        let params = TreeParameters::default();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let generator = TreeGenerator::new(&params, &mut rng).unwrap();

        let base = generator.stem_radius(0, 0.0, 10.0);
        // scale * ratio + full flare bulge
        assert!((base - (0.15 + 0.6 * 0.15)).abs() < 1e-6);
        let mid = generator.stem_radius(0, 5.0, 10.0);
        assert!(mid < base);
        assert_eq!(generator.stem_radius(0, 10.0, 10.0), MIN_RADIUS);
        assert_eq!(generator.stem_radius(2, 0.5, 0.5), MIN_RADIUS);
    }

    #[test]
    fn children_are_capped_by_parent_ring() {
        let params = TreeParameters::default();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let stems = TreeGenerator::new(&params, &mut rng).unwrap().generate();
        for stem in stems.iter().filter(|s| s.level > 0) {
            for seg in &stem.segments {
                assert!(seg.radius <= stem.radius * 0.5 + 1e-6 || seg.radius == MIN_RADIUS);
            }
        }
    }

    #[test]
    fn branches_leave_at_the_down_angle() {
        let params = TreeParameters::default();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let stems = TreeGenerator::new(&params, &mut rng).unwrap().generate();
        let branch = stems.iter().find(|s| s.level == 1).unwrap();
        let angle = branch.direction.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees();
        assert!((angle - 45.0).abs() < 1e-3);
    }

    #[test]
    fn curvature_bends_the_stem() {
        let mut params = TreeParameters {
            levels: 1,
            ..Default::default()
        };
        params.level[0].n_curve = 90.0;
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let stems = TreeGenerator::new(&params, &mut rng).unwrap().generate();
        let segments = &stems[0].segments;
        assert_eq!(segments[0].direction, Vec3::Y);
        let tip = segments.last().unwrap().direction;
        assert!(tip.dot(Vec3::Y).abs() < 1e-4);
        for seg in segments {
            assert!((seg.direction.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn straight_tree_draws_no_randomness() {
        let params = TreeParameters::default();
        let mut a = Pcg64Mcg::seed_from_u64(1);
        let mut b = Pcg64Mcg::seed_from_u64(2);
        let first = TreeGenerator::new(&params, &mut a).unwrap().generate();
        let second = TreeGenerator::new(&params, &mut b).unwrap().generate();
        assert_eq!(first, second);
    }
}
