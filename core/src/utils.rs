// 2D height map: row-major Vec<Vec<f32>>, access as `map[z][x]`.
pub type HeightMap2D = Vec<Vec<f32>>;

// flatten a 2D height map (row-major) into a single Vec<f32>
// For snapshot documents and for the finite-difference passes over the grid
pub fn flatten2(map: &HeightMap2D) -> Vec<f32> {
    map.iter().flat_map(|row| row.iter().cloned()).collect()
}

// Rebuild a row-major map from a flat buffer of `width`-long rows
pub fn unflatten2(flat: &[f32], width: usize) -> HeightMap2D {
    if width == 0 {
        return Vec::new();
    }
    flat.chunks(width).map(|row| row.to_vec()).collect()
}

// Lowest and highest value of the map, None if it is empty
pub fn min_max2(map: &HeightMap2D) -> Option<(f32, f32)> {
    let mut values = map.iter().flatten().copied();
    let first = values.next()?;
    Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

// Normalize a copy of the map into [0, 1]
pub fn normalize2(map: &HeightMap2D) -> HeightMap2D {
    let Some((min, max)) = min_max2(map) else {
        return Vec::new();
    };
    let range = (max - min).max(0.001); // prevent zero-division
    map.iter()
        .map(|row| row.iter().map(|&v| (v - min) / range).collect())
        .collect()
}
