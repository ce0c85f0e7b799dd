//! Bayer threshold matrices for ordered dithering.

/// Size of a square Bayer matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BayerSize {
    Two,
    Four,
    Eight,
}

#[rustfmt::skip]
const BAYER_2X2: [u8; 4] = [
    0, 2,
    3, 1,
];

#[rustfmt::skip]
const BAYER_4X4: [u8; 16] = [
     0,  8,  2, 10,
    12,  4, 14,  6,
     3, 11,  1,  9,
    15,  7, 13,  5,
];

#[rustfmt::skip]
const BAYER_8X8: [u8; 64] = [
     0, 32,  8, 40,  2, 34, 10, 42,
    48, 16, 56, 24, 50, 18, 58, 26,
    12, 44,  4, 36, 14, 46,  6, 38,
    60, 28, 52, 20, 62, 30, 54, 22,
     3, 35, 11, 43,  1, 33,  9, 41,
    51, 19, 59, 27, 49, 17, 57, 25,
    15, 47,  7, 39, 13, 45,  5, 37,
    63, 31, 55, 23, 61, 29, 53, 21,
];

/// A square Bayer matrix of `side * side` ranks, normalized by `side * side` on lookup.
#[derive(Debug, Clone, Copy)]
pub struct BayerMatrix {
    side: usize,
    ranks: &'static [u8],
}

pub static BAYER_MATRICES: [BayerMatrix; 3] = [
    BayerMatrix {
        side: 2,
        ranks: &BAYER_2X2,
    },
    BayerMatrix {
        side: 4,
        ranks: &BAYER_4X4,
    },
    BayerMatrix {
        side: 8,
        ranks: &BAYER_8X8,
    },
];

impl BayerSize {
    #[inline]
    pub fn matrix(self) -> &'static BayerMatrix {
        match self {
            BayerSize::Two => &BAYER_MATRICES[0],
            BayerSize::Four => &BAYER_MATRICES[1],
            BayerSize::Eight => &BAYER_MATRICES[2],
        }
    }
}

impl BayerMatrix {
    #[inline]
    pub const fn width(&self) -> usize {
        self.side
    }

    #[inline]
    pub const fn height(&self) -> usize {
        self.side
    }

    /// Integer rank at the tiled position `(x, y)`, `0..side * side`.
    #[inline]
    pub fn rank(&self, x: usize, y: usize) -> u8 {
        self.ranks[(y % self.side) * self.side + (x % self.side)]
    }

    /// Normalized threshold offset at the tiled position `(x, y)`, in `[0, 1)`.
    ///
    /// Powers of two divide exactly, so this is the same value as `rank / side²` in any
    /// precision.
    #[inline]
    pub fn value(&self, x: usize, y: usize) -> f32 {
        f32::from(self.rank(x, y)) / (self.side * self.side) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rank_appears_once() {
        for size in [BayerSize::Two, BayerSize::Four, BayerSize::Eight] {
            let matrix = size.matrix();
            let n = matrix.width() * matrix.height();
            let mut seen = vec![false; n];
            for y in 0..matrix.height() {
                for x in 0..matrix.width() {
                    let rank = usize::from(matrix.rank(x, y));
                    assert!(!seen[rank], "{size:?}: rank {rank} repeated");
                    seen[rank] = true;
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn larger_matrices_follow_the_recursive_pattern() {
        // M(2n)[y][x] = 4 * M(n)[y % n][x % n] + M(2)[y / n][x / n]
        for (small, large) in [
            (BayerSize::Two, BayerSize::Four),
            (BayerSize::Four, BayerSize::Eight),
        ] {
            let small = small.matrix();
            let large = large.matrix();
            let n = small.width();
            for y in 0..large.height() {
                for x in 0..large.width() {
                    let expected = 4 * small.rank(x, y) + BayerSize::Two.matrix().rank(x / n, y / n);
                    assert_eq!(large.rank(x, y), expected, "at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn values_are_normalized_and_tile() {
        let matrix = BayerSize::Four.matrix();
        assert_eq!(matrix.value(0, 0), 0.0);
        assert_eq!(matrix.value(1, 0), 0.5);
        assert_eq!(matrix.value(0, 3), 15.0 / 16.0);
        assert_eq!(matrix.value(5, 6), matrix.value(1, 2));
    }
}
