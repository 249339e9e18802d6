use std::ops::Index;

/// Per-intensity confidence weights for 8-bit pixel values.
///
/// This is a hat function: zero at both ends of the range (where pixels
/// are likely clipped or crushed) and maximal at mid-gray.  The same table
/// must be used for curve estimation and radiance fusion, so it is built
/// once and handed around by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: [f64; 256],
}

impl WeightTable {
    /// The standard hat weighting: `w(z) = z` below the midpoint and
    /// `w(z) = 255 - z` above it.
    pub fn hat() -> WeightTable {
        let mut weights = [0.0f64; 256];
        for (z, w) in weights.iter_mut().enumerate() {
            *w = if z as f64 <= 127.5 {
                z as f64
            } else {
                (255 - z) as f64
            };
        }
        WeightTable { weights: weights }
    }
}

impl Default for WeightTable {
    fn default() -> WeightTable {
        WeightTable::hat()
    }
}

impl Index<u8> for WeightTable {
    type Output = f64;

    #[inline(always)]
    fn index(&self, z: u8) -> &f64 {
        &self.weights[z as usize]
    }
}
