// Radix-2 Cooley–Tukey FFT over square grids.
//
// Every length handed to these functions must be a power of two. Other
// lengths are not detected in release builds and produce meaningless output;
// callers validate grid sizes up front (see `SpectralOcean::new`).

use std::f32::consts::TAU;

use num_complex::Complex32;

// In-place unnormalized transform of `data`.
// `inverse` flips the twiddle sign; scaling is left to the caller.
pub fn fft_1d(data: &mut [Complex32], inverse: bool) {
    let n = data.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two(), "fft length {n} is not a power of two");

    // Bit-reversal permutation
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            data.swap(i, j);
        }
    }

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let step = sign * TAU / len as f32;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                // exact twiddle per k, no accumulated rotation
                let w = Complex32::from_polar(1.0, step * k as f32);
                let u = data[start + k];
                let v = data[start + k + half] * w;
                data[start + k] = u + v;
                data[start + k + half] = u - v;
            }
        }
        len <<= 1;
    }
}

// Row pass then column pass over a row-major `n x n` grid
fn transform_2d(data: &mut [Complex32], n: usize, inverse: bool) {
    debug_assert_eq!(data.len(), n * n);

    for row in data.chunks_mut(n) {
        fft_1d(row, inverse);
    }

    let mut column = vec![Complex32::new(0.0, 0.0); n];
    for x in 0..n {
        for (z, slot) in column.iter_mut().enumerate() {
            *slot = data[z * n + x];
        }
        fft_1d(&mut column, inverse);
        for (z, value) in column.iter().enumerate() {
            data[z * n + x] = *value;
        }
    }
}

// Forward 2D transform of a row-major `n x n` grid.
pub fn fft_2d(data: &mut [Complex32], n: usize) {
    transform_2d(data, n, false);
}

// Inverse 2D transform, normalized so that `ifft_2d(fft_2d(x)) == x`.
pub fn ifft_2d(data: &mut [Complex32], n: usize) {
    transform_2d(data, n, true);
    let scale = 1.0 / (n * n) as f32;
    for value in data.iter_mut() {
        *value *= scale;
    }
}
