use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec2, Vec3};
use rand::Rng;

use super::params::{LeafParameters, TreeParameters};
use super::stem::{Stem, perpendicular, variance};
use crate::mesh::{Mesh, MeshBuilder, Vertex};

// Leaves start this far along a stem
const LEAF_START: f32 = 0.2;
const LEAVES_AROUND: usize = 2;
const SIMPLE_LEAF_SEGMENTS: usize = 10;
const POINTS_PER_LOBE: usize = 5;

// Leaf-local frame: `right` across the blade, `up` along it, `normal` out of it
#[derive(Debug, Clone, Copy)]
struct LeafFrame {
    center: Vec3,
    right: Vec3,
    up: Vec3,
    normal: Vec3,
}

// Leaf mesh for every stem of the deepest level. Empty when leaves are off.
pub(crate) fn build_leaves<R: Rng + ?Sized>(params: &TreeParameters, stems: &[Stem], rng: &mut R) -> Mesh {
    let mut mb = MeshBuilder::new();
    if !params.has_leaves || params.leaves_per_branch == 0 {
        return mb.build();
    }

    let deepest = params.levels - 1;
    let count = params.leaves_per_branch;
    for stem in stems.iter().filter(|s| s.level == deepest) {
        let last = stem.segments.len().saturating_sub(1);
        for i in 0..count {
            let spread = if count > 1 { i as f32 / (count - 1) as f32 } else { 0.0 };
            let t = (LEAF_START + spread * (1.0 - LEAF_START) + variance(rng, 0.05)).clamp(0.0, 1.0);
            let seg = &stem.segments[((t * last as f32) as usize).min(last)];

            for j in 0..LEAVES_AROUND {
                let angle = i as f32 / count as f32 * TAU * 3.0
                    + j as f32 / LEAVES_AROUND as f32 * TAU
                    + variance(rng, 0.3);
                let position = seg.position + seg.direction * variance(rng, 0.02);
                emit_leaf(&mut mb, params, position, seg.direction, angle, rng);
            }
        }
    }
    mb.build()
}

// Orient one leaf around the stem, tilt it off the stem axis and emit it
fn emit_leaf<R: Rng + ?Sized>(
    mb: &mut MeshBuilder,
    params: &TreeParameters,
    position: Vec3,
    stem_dir: Vec3,
    angle: f32,
    rng: &mut R,
) {
    // ±30% size variation
    let scale = params.leaf_scale * (0.7 + rng.random::<f32>() * 0.6);

    let up = Quat::from_axis_angle(stem_dir, angle) * perpendicular(stem_dir);
    let right = stem_dir.cross(up);
    let tilt = Quat::from_axis_angle(right.normalize(), (25.0 + rng.random::<f32>() * 20.0).to_radians());

    let frame = LeafFrame {
        center: position,
        right,
        up: tilt * up,
        normal: tilt * stem_dir,
    };
    if params.leaf.lobe_count == 1 {
        simple_leaf(mb, frame, scale, &params.leaf);
    } else {
        lobed_leaf(mb, frame, scale, &params.leaf);
    }
}

// Outline point of the simple leaf at parameter `i` (x across, y along)
fn simple_outline(i: usize, width: f32, height: f32) -> Vec2 {
    let angle = i as f32 / SIMPLE_LEAF_SEGMENTS as f32 * TAU;
    let (sin, cos) = angle.sin_cos();
    let mut x = cos * width * (1.0 - sin.abs() * 0.5);
    let mut y = sin * height;
    // sharpen the tip
    if sin > 0.7 {
        let tip = (sin - 0.7) / 0.3;
        x *= 1.0 - tip * 0.5;
        y *= 1.0 + tip * 0.2;
    }
    Vec2::new(x, y)
}

// Pointed oval, double-sided, fanned from the centre.
fn simple_leaf(mb: &mut MeshBuilder, frame: LeafFrame, scale: f32, leaf: &LeafParameters) {
    let width = leaf.lobe_width * scale;
    let height = leaf.lobe_height * scale;
    let outline: Vec<Vec2> = (0..=SIMPLE_LEAF_SEGMENTS)
        .map(|i| simple_outline(i, width, height))
        .collect();
    let rim: Vec<(Vec3, Vec2)> = outline
        .iter()
        .map(|p| {
            let uv = Vec2::new(0.5 + p.x / width * 0.5, 0.5 + p.y / height * 0.5);
            (frame.center + frame.right * p.x + frame.up * p.y, uv)
        })
        .collect();
    emit_fan(mb, &frame, frame.center, &rim, false);
}

// Fan of `lobe_count` lobes spread evenly around the centre, double-sided.
fn lobed_leaf(mb: &mut MeshBuilder, frame: LeafFrame, scale: f32, leaf: &LeafParameters) {
    let center = frame.center + frame.up * leaf.lobe_offset * scale;
    let mut rim = Vec::with_capacity(leaf.lobe_count * (POINTS_PER_LOBE + 1));

    for lobe in 0..leaf.lobe_count {
        let lobe_angle = lobe as f32 / leaf.lobe_count as f32 * TAU;
        let (sin, cos) = lobe_angle.sin_cos();
        let reach = leaf.lobe_height * scale * if lobe == 0 { 1.0 } else { leaf.lobe_scale };
        let dir = frame.right * cos + frame.up * sin;
        let side = frame.up * cos - frame.right * sin;
        let tip = center + dir * reach;

        for p in 0..=POINTS_PER_LOBE {
            let t = p as f32 / POINTS_PER_LOBE as f32;
            // Blade bulges sideways between stalk and tip
            let bulge = side * (t * PI).sin() * leaf.lobe_width * scale * 0.5;
            let uv = Vec2::new(0.5 + cos * t * 0.5, 0.5 + sin * t * 0.5);
            rim.push((center.lerp(tip, t) + bulge, uv));
        }
    }
    emit_fan(mb, &frame, center, &rim, true);
}

// Front and back triangle fans over the same rim. A closed rim wraps its last
// point back to the first.
fn emit_fan(mb: &mut MeshBuilder, frame: &LeafFrame, center: Vec3, rim: &[(Vec3, Vec2)], closed: bool) {
    let fans = if closed { rim.len() } else { rim.len().saturating_sub(1) };
    let n = rim.len() as u32;

    for (normal, front) in [(frame.normal, true), (-frame.normal, false)] {
        let hub = mb.push_vertex(Vertex::new(center, normal, Vec2::splat(0.5)));
        for &(position, uv) in rim {
            mb.push_vertex(Vertex::new(position, normal, uv));
        }
        for i in 0..fans as u32 {
            let a = hub + 1 + i;
            let b = hub + 1 + (i + 1) % n;
            if front {
                mb.push_triangle(hub, a, b);
            } else {
                mb.push_triangle(hub, b, a);
            }
        }
    }
}
