use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use super::stem::Stem;
use crate::mesh::{Mesh, MeshBuilder, Vertex};

// Extrude one stem as a tube: a ring of `radial_segments` vertices per
// segment, consecutive rings joined by two triangles per quad.
fn extrude_stem(mb: &mut MeshBuilder, stem: &Stem, radial_segments: usize) {
    let start = mb.next_index();
    let radial = radial_segments as u32;

    for seg in &stem.segments {
        let v = seg.segment_index as f32 / seg.total_segments as f32;
        for j in 0..radial_segments {
            let t = j as f32 / radial_segments as f32;
            let (sin, cos) = (t * TAU).sin_cos();
            let offset = seg.rotation * Vec3::new(cos * seg.radius, 0.0, sin * seg.radius);
            // Radial normal, no correction for taper
            mb.push_vertex(Vertex::new(seg.position + offset, offset.normalize(), Vec2::new(t, v)));
        }
    }

    for ring in 0..stem.segments.len().saturating_sub(1) as u32 {
        let base = start + ring * radial;
        for j in 0..radial {
            let next = (j + 1) % radial;
            mb.push_triangle(base + j, base + next, base + radial + j);
            mb.push_triangle(base + next, base + radial + next, base + radial + j);
        }
    }
}

// Trunk and branch meshes of a stem list. Level 0 goes to the first mesh,
// every deeper level to the second.
pub fn extrude_stems(stems: &[Stem], radial_segments: usize) -> (Mesh, Mesh) {
    let mut trunk = MeshBuilder::new();
    let mut branches = MeshBuilder::new();
    for stem in stems {
        let mb = if stem.level == 0 { &mut trunk } else { &mut branches };
        extrude_stem(mb, stem, radial_segments);
    }
    (trunk.build(), branches.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::params::TreeParameters;
    use crate::tree::stem::TreeGenerator;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn stems(params: &TreeParameters) -> Vec<Stem> {
        TreeGenerator::new(params, &mut Pcg64Mcg::seed_from_u64(0))
            .unwrap()
            .generate()
    }

    #[test]
    fn trunk_only_tree_fills_trunk_mesh() {
        let params = TreeParameters {
            levels: 1,
            radial_segments: 8,
            ..Default::default()
        };
        let (trunk, branches) = extrude_stems(&stems(&params), params.radial_segments);

        // 11 rings of 8 vertices, 10 bands of 8 quads
        assert_eq!(trunk.vertex_count(), 88);
        assert_eq!(trunk.triangle_count(), 160);
        assert!(branches.is_empty());
        assert!(trunk.indices.iter().all(|&i| (i as usize) < trunk.vertex_count()));
    }

    #[test]
    fn ring_vertices_sit_at_segment_radius() {
        let params = TreeParameters {
            levels: 1,
            ..Default::default()
        };
        let stems = stems(&params);
        let (trunk, _) = extrude_stems(&stems, params.radial_segments);
        let seg = &stems[0].segments[3];
        for v in &trunk.vertices[3 * 16..4 * 16] {
            let radial = v.position - seg.position;
            assert!((radial.length() - seg.radius).abs() < 1e-5);
            assert!(radial.dot(seg.direction).abs() < 1e-5);
            assert!((v.normal.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn deeper_levels_go_to_branch_mesh() {
        let params = TreeParameters::default();
        let stems = stems(&params);
        let (trunk, branches) = extrude_stems(&stems, params.radial_segments);

        let rings: usize = stems[1..].iter().map(|s| s.segments.len()).sum();
        assert_eq!(trunk.vertex_count(), 11 * 16);
        assert_eq!(branches.vertex_count(), rings * 16);
        // 20 branches of 9 rings, 320 twigs of 7 rings
        assert_eq!(rings, 20 * 9 + 320 * 7);
        assert!(branches.indices.iter().all(|&i| (i as usize) < branches.vertex_count()));
    }
}
