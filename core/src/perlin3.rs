use crate::NoiseField;

// Ken Perlin's reference permutation. The terrain golden values depend on it,
// so it must never be reordered.
const REFERENCE_PERMUTATION: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

// Classic 3D Perlin noise over a 256-entry lattice
#[derive(Debug, Clone)]
pub struct Perlin3D {
    perm: [u8; 512], // permutation table (256 duplicated)
}

impl Default for Perlin3D {
    fn default() -> Self {
        Self::reference()
    }
}

impl Perlin3D {
    // Noise over the reference table, bit-for-bit reproducible everywhere
    pub fn reference() -> Self {
        Self::from_table(&REFERENCE_PERMUTATION)
    }

    // Noise over a table shuffled from `seed`
    pub fn with_seed(seed: u64) -> Self {
        let mut p: Vec<u8> = (0..256).map(|i| i as u8).collect();
        let mut x = seed ^ 0xAABBCCDDEEFF1122_u64;
        let mut rng = || {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x & 0xFF) as u8
        };
        // Fisher–Yates shuffle p[0..256]
        for i in (1..256).rev() {
            let j = (rng() as usize) % (i + 1);
            p.swap(i, j);
        }
        let mut table = [0u8; 256];
        table.copy_from_slice(&p);
        Self::from_table(&table)
    }

    fn from_table(table: &[u8; 256]) -> Self {
        // Duplicated so lookups of `perm[i + 1]` never need a modulo
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { perm }
    }

    // 6t^5 - 15t^4 + 10t^3
    #[inline]
    fn fade(t: f32) -> f32 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    #[inline]
    fn lerp(t: f32, a: f32, b: f32) -> f32 {
        a + t * (b - a)
    }

    // Pick one of 12 gradient directions from the low 4 bits of the hash
    #[inline]
    fn grad(hash: u8, x: f32, y: f32, z: f32) -> f32 {
        let h = hash & 0xF;
        let u = if h < 8 { x } else { y };
        let v = if h < 4 {
            y
        } else if h == 12 || h == 14 {
            x
        } else {
            z
        };
        let sign_u = if (h & 1) == 0 { u } else { -u };
        let sign_v = if (h & 2) == 0 { v } else { -v };
        sign_u + sign_v
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    // Raw single-octave noise at (x, y, z), roughly in [-1, 1]
    pub fn noise(&self, x: f32, y: f32, z: f32) -> f32 {
        // Unit cube that contains the point
        let xi = (x.floor() as i32 & 255) as usize;
        let yi = (y.floor() as i32 & 255) as usize;
        let zi = (z.floor() as i32 & 255) as usize;
        // Relative coordinates within the cube
        let x = x - x.floor();
        let y = y - y.floor();
        let z = z - z.floor();

        let u = Self::fade(x);
        let v = Self::fade(y);
        let w = Self::fade(z);

        // Hash the 8 cube corners
        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        let near = Self::lerp(
            v,
            Self::lerp(
                u,
                Self::grad(self.perm[aa], x, y, z),
                Self::grad(self.perm[ba], x - 1.0, y, z),
            ),
            Self::lerp(
                u,
                Self::grad(self.perm[ab], x, y - 1.0, z),
                Self::grad(self.perm[bb], x - 1.0, y - 1.0, z),
            ),
        );
        let far = Self::lerp(
            v,
            Self::lerp(
                u,
                Self::grad(self.perm[aa + 1], x, y, z - 1.0),
                Self::grad(self.perm[ba + 1], x - 1.0, y, z - 1.0),
            ),
            Self::lerp(
                u,
                Self::grad(self.perm[ab + 1], x, y - 1.0, z - 1.0),
                Self::grad(self.perm[bb + 1], x - 1.0, y - 1.0, z - 1.0),
            ),
        );

        Self::lerp(w, near, far)
    }
}

impl NoiseField for Perlin3D {
    fn sample3(&self, x: f32, y: f32, z: f32) -> f32 {
        self.noise(x, y, z)
    }
}
