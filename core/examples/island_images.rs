// Generates and saves three 129×129 images of the default island:
// Raw heightmap (grayscale)
// Hill-shaded colour preview
// Spectral ocean heights of a 128×128 patch after two seconds

use image::{GrayImage, Luma};
use isle_core::ocean::SpectralOcean;
use isle_core::utils::{HeightMap2D, normalize2, unflatten2};
use isle_core::{OceanConfig, OceanKind, OceanModel, TerrainGenerator, render_preview};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::path::Path;

fn save_grayscale(grid: &HeightMap2D, filename: &str) {
    let norm = normalize2(grid);
    let h = norm.len();
    let w = norm.first().map_or(0, Vec::len);
    let mut img = GrayImage::new(w as u32, h as u32);
    for (y, row) in norm.iter().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            img.put_pixel(x as u32, y as u32, Luma([(v * 255.0).round() as u8]));
        }
    }
    img.save(Path::new(filename)).unwrap();
    println!("Saved {}", filename);
}

fn main() {
    // 1) Raw heightmap
    let terrain = TerrainGenerator::new(129, 129, 20.0).unwrap();
    save_grayscale(terrain.height_map(), "island_heightmap.png");

    // 2) Colour preview with the shoreline at 0.2
    let preview = render_preview(terrain.height_map(), 0.2);
    preview.save("island_preview.png").unwrap();
    println!("Saved island_preview.png");

    // 3) Ocean heights
    let config = OceanConfig {
        model: OceanKind::Spectral,
        ..Default::default()
    };
    let mut ocean = SpectralOcean::new(&config, &mut Pcg64Mcg::seed_from_u64(350)).unwrap();
    for _ in 0..120 {
        ocean.update(1.0 / 60.0);
    }
    let heights = unflatten2(ocean.heights(), ocean.grid_size());
    save_grayscale(&heights, "ocean_heights.png");
}
