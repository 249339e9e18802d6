//! Fast bilateral filtering by way of a downsampled 3D grid.
//!
//! Pixels are splatted into a coarse (x, y, edge value) grid, the grid is
//! blurred with a small Gaussian, and the result is sliced back out with
//! trilinear interpolation.  Because pixels on opposite sides of a strong
//! edge land in distant range bins, they don't blur into each other.

/// Empty cells of padding on each side of every grid axis.
const PADDING: usize = 5;

/// Bin index offset: `PADDING` plus one.
const OFFSET: f64 = (PADDING + 1) as f64;

/// Blurred weights with a magnitude below this are treated as empty.
const EMPTY_WEIGHT: f64 = 1.0e-10;

/// Stand-in weight for empty cells, so that they normalize to zero.
const EMPTY_FILL: f64 = 0.1;

/// Taps of the (unnormalized) 5-tap Gaussian, `exp(-0.5 * t^2)` for
/// `t` in -2..=2.
fn kernel() -> [f64; 5] {
    let mut k = [0.0; 5];
    for (i, v) in k.iter_mut().enumerate() {
        let t = i as f64 - 2.0;
        *v = (-0.5 * t * t).exp();
    }
    k
}

struct Grid {
    dims: [usize; 3],
    cells: Vec<f64>,
}

impl Grid {
    fn new(dims: [usize; 3]) -> Grid {
        Grid {
            dims: dims,
            cells: vec![0.0; dims[0] * dims[1] * dims[2]],
        }
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    #[inline(always)]
    fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        self.cells[self.index(x, y, z)]
    }

    #[inline(always)]
    fn add(&mut self, x: usize, y: usize, z: usize, v: f64) {
        let i = self.index(x, y, z);
        self.cells[i] += v;
    }

    /// Zero-padded "same"-size convolution with the 5x5x5 Gaussian,
    /// done as one 5-tap pass per axis.
    fn blur(&mut self) {
        let k = kernel();
        for axis in 0..3 {
            let stride = match axis {
                0 => 1,
                1 => self.dims[0],
                _ => self.dims[0] * self.dims[1],
            };
            let len = self.dims[axis];
            let src = self.cells.clone();

            for (i, cell) in self.cells.iter_mut().enumerate() {
                let pos = (i / stride) % len;
                let line_start = i - pos * stride;
                let mut sum = 0.0;
                for (tap, &kv) in k.iter().enumerate() {
                    // Neighbor at pos + tap - 2, skipping those outside
                    // the grid.
                    let n = pos + tap;
                    if n < 2 || n - 2 >= len {
                        continue;
                    }
                    sum += kv * src[line_start + (n - 2) * stride];
                }
                *cell = sum;
            }
        }
    }

    /// Trilinear interpolation at a fractional grid position.
    fn sample(&self, p: [f64; 3]) -> f64 {
        let mut base = [0usize; 3];
        let mut frac = [0.0f64; 3];
        for a in 0..3 {
            let c = p[a].max(0.0).min((self.dims[a] - 1) as f64);
            base[a] = (c.floor() as usize).min(self.dims[a] - 2);
            frac[a] = c - base[a] as f64;
        }

        let mut result = 0.0;
        for corner in 0..8 {
            let mut w = 1.0;
            let mut idx = [0usize; 3];
            for a in 0..3 {
                if corner & (1 << a) == 0 {
                    w *= 1.0 - frac[a];
                    idx[a] = base[a];
                } else {
                    w *= frac[a];
                    idx[a] = base[a] + 1;
                }
            }
            if w != 0.0 {
                result += w * self.get(idx[0], idx[1], idx[2]);
            }
        }
        result
    }
}

/// Edge-aware smoothing of `data`, guided by `edge`.
///
/// Both are row-major `width * height` images.  `sigma_s` is the spatial
/// extent in pixels and `sigma_r` the range extent in `edge` units; both
/// must be positive.
pub fn filter(
    data: &[f32],
    edge: &[f32],
    width: usize,
    height: usize,
    sigma_s: f32,
    sigma_r: f32,
) -> Vec<f32> {
    assert_eq!(data.len(), width * height);
    assert_eq!(edge.len(), width * height);
    debug_assert!(sigma_s > 0.0 && sigma_r > 0.0);
    if data.is_empty() {
        return Vec::new();
    }

    let sigma_s = sigma_s as f64;
    let sigma_r = sigma_r as f64;
    let (edge_min, edge_max) = edge
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &e| {
            (lo.min(e), hi.max(e))
        });
    let edge_min = edge_min as f64;
    let edge_max = edge_max as f64;

    let dims = [
        ((width - 1) as f64 / sigma_s).floor() as usize + 2 * PADDING + 1,
        ((height - 1) as f64 / sigma_s).floor() as usize + 2 * PADDING + 1,
        ((edge_max - edge_min) / sigma_r).floor() as usize + 2 * PADDING + 1,
    ];

    // Splat.
    let mut values = Grid::new(dims);
    let mut weights = Grid::new(dims);
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let bin = |v: f64| v.round_ties_even() as usize + PADDING + 1;
            let gx = bin(x as f64 / sigma_s);
            let gy = bin(y as f64 / sigma_s);
            let gz = bin((edge[i] as f64 - edge_min) / sigma_r);
            values.add(gx, gy, gz, data[i] as f64);
            weights.add(gx, gy, gz, 1.0);
        }
    }

    // Blur.
    values.blur();
    weights.blur();

    // Normalize.
    for (v, &w) in values.cells.iter_mut().zip(weights.cells.iter()) {
        let w = if w.abs() < EMPTY_WEIGHT { EMPTY_FILL } else { w };
        *v /= w;
    }

    // Slice.
    let mut out = Vec::with_capacity(data.len());
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            out.push(values.sample([
                x as f64 / sigma_s + OFFSET,
                y as f64 / sigma_s + OFFSET,
                (edge[i] as f64 - edge_min) / sigma_r + OFFSET,
            ]) as f32);
        }
    }
    out
}
