use image::{Rgb, RgbImage};
use palette::{Gradient, LinSrgb};

use crate::utils::{HeightMap2D, min_max2};

// Light direction of the hillshade: 45° azimuth, 45° altitude
const LIGHT_AZIMUTH: f32 = std::f32::consts::FRAC_PI_4;
const LIGHT_ALTITUDE: f32 = std::f32::consts::FRAC_PI_4;

// Lambertian hillshade of a height map; `z_scale` adjusts vertical exaggeration.
// Border cells have no full neighbourhood and stay at 0.
pub fn hillshade(map: &HeightMap2D, z_scale: f32) -> HeightMap2D {
    let h = map.len();
    let w = map.first().map_or(0, Vec::len);
    let mut shade = vec![vec![0.0; w]; h];
    if h < 3 || w < 3 {
        return shade;
    }

    let (sin_alt, cos_alt) = LIGHT_ALTITUDE.sin_cos();
    let lx = LIGHT_AZIMUTH.cos() * cos_alt;
    let ly = LIGHT_AZIMUTH.sin() * cos_alt;
    let lz = sin_alt;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let dzdx = ((map[y][x + 1] - map[y][x - 1]) / 2.0) * z_scale;
            let dzdy = ((map[y + 1][x] - map[y - 1][x]) / 2.0) * z_scale;
            let (nx, ny, nz) = (-dzdx, -dzdy, 1.0);
            let len = (nx * nx + ny * ny + nz * nz).sqrt();
            shade[y][x] = ((nx * lx + ny * ly + nz * lz) / len).max(0.0);
        }
    }
    shade
}

// Colour ramp over absolute heights: everything at or below `sea_level`
// is water, land runs from sand through grass and rock to snow at the peak.
fn terrain_gradient(sea_level: f32, min: f32, max: f32) -> Gradient<LinSrgb> {
    let span = (max - min).max(0.001);
    // Kept off 0 so the deep-water stop never coincides with the shallows
    let shore = ((sea_level - min) / span).clamp(0.01, 0.98);
    let land = |t: f32| shore + (1.0 - shore) * t;
    Gradient::with_domain(vec![
        (0.0, LinSrgb::new(0.0, 0.0, 0.5)),     // deep blue
        (shore, LinSrgb::new(0.1, 0.4, 0.8)),   // shallows
        (land(0.02), LinSrgb::new(0.8, 0.8, 0.5)), // sand
        (land(0.25), LinSrgb::new(0.1, 0.6, 0.2)), // green
        (land(0.7), LinSrgb::new(0.5, 0.4, 0.3)),  // rock
        (1.0, LinSrgb::new(1.0, 1.0, 1.0)),     // snow
    ])
}

// Hill-shaded colour preview of a height map
pub fn render_preview(map: &HeightMap2D, sea_level: f32) -> RgbImage {
    let h = map.len();
    let w = map.first().map_or(0, Vec::len);
    let mut img = RgbImage::new(w as u32, h as u32);
    let Some((min, max)) = min_max2(map) else {
        return img;
    };

    let gradient = terrain_gradient(sea_level, min.min(sea_level), max);
    let lo = min.min(sea_level);
    let span = (max - lo).max(0.001);
    let shade = hillshade(map, 1.0);

    for (y, row) in map.iter().enumerate() {
        for (x, &height) in row.iter().enumerate() {
            let col: LinSrgb = gradient.get((height - lo) / span);
            let rgb = col.into_format::<u8>();
            let light = (shade[y][x] * 0.5 + 0.5).clamp(0.0, 1.0);
            img.put_pixel(
                x as u32,
                y as u32,
                Rgb([
                    (rgb.red as f32 * light) as u8,
                    (rgb.green as f32 * light) as u8,
                    (rgb.blue as f32 * light) as u8,
                ]),
            );
        }
    }
    img
}
