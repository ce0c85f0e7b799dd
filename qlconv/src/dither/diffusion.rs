//! Error diffusion over a working copy of the image.
//!
//! Pixels are visited strictly in raster order. Each channel value is read from the working
//! copy (which already contains the error pushed forward by earlier pixels), clamped to
//! `0..=255`, quantized, and the scaled difference is added to the neighbours that have not
//! been visited yet. The working copy itself is never clamped, so accumulated error can
//! overshoot in either direction until it is read.

use super::CHANNELS;
use crate::{quantize::Quantizer, DitherParameters, BYTES_PER_PIXEL};

/// How a neighbour's share of the error is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// `error * weight / divisor`
    Exact,
    /// `floor(error / divisor) * weight`
    Floor,
}

/// An error diffusion kernel.
///
/// Each entry is `(dx, dy, weight)`; `dy` is never negative, and entries with `dy == 0` only
/// point to the right.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    pub entries: &'static [(isize, usize, u8)],
    pub divisor: u8,
    pub rounding: Rounding,
}

/// Floyd-Steinberg, 16/16 of the error.
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[
        (1, 0, 7),  // right
        (-1, 1, 3), // bottom-left
        (0, 1, 5),  // bottom
        (1, 1, 1),  // bottom-right
    ],
    divisor: 16,
    rounding: Rounding::Exact,
};

/// Atkinson, 6/8 of the error. The share is floored before it is handed out.
///
/// ```text
///        X   1   1
///    1   1   1
///        1
/// ```
pub const ATKINSON: Kernel = Kernel {
    entries: &[
        (1, 0, 1),  // right
        (2, 0, 1),  // two right
        (0, 1, 1),  // bottom
        (-1, 1, 1), // bottom-left
        (1, 1, 1),  // bottom-right
        (0, 2, 1),  // two below
    ],
    divisor: 8,
    rounding: Rounding::Floor,
};

impl Kernel {
    #[inline]
    pub fn share(&self, error: f32, weight: u8) -> f32 {
        let divisor = f32::from(self.divisor);
        match self.rounding {
            Rounding::Exact => error * f32::from(weight) / divisor,
            Rounding::Floor => floor(error / divisor) * f32::from(weight),
        }
    }

    /// Sum of all weights over the divisor.
    pub fn propagated_fraction(&self) -> f32 {
        let total: u32 = self.entries.iter().map(|&(_, _, w)| u32::from(w)).sum();
        total as f32 / f32::from(self.divisor)
    }
}

/// `f32::floor` lives in `std`.
#[inline]
fn floor(value: f32) -> f32 {
    let truncated = value as i32 as f32;
    if truncated > value {
        truncated - 1.0
    } else {
        truncated
    }
}

/// Runs one error diffusion pass.
///
/// `working` must hold `width * height * 3` values; it is overwritten with the source
/// intensities first and left in its final, error-adjusted state.
pub(crate) fn diffuse(
    input: &[u8],
    output: &mut [u8],
    width: usize,
    height: usize,
    params: &DitherParameters,
    kernel: &Kernel,
    working: &mut [f32],
) {
    for (src, dst) in input
        .chunks_exact(BYTES_PER_PIXEL)
        .zip(working.chunks_exact_mut(CHANNELS))
    {
        for c in 0..CHANNELS {
            dst[c] = f32::from(src[c]);
        }
    }

    let quantizer = Quantizer::new(params.threshold, params.bit_depth);

    for y in 0..height {
        for x in 0..width {
            let pixel = y * width + x;

            for c in 0..CHANNELS {
                let value = working[pixel * CHANNELS + c].clamp(0.0, 255.0);
                let level = quantizer.apply(value);
                output[pixel * BYTES_PER_PIXEL + c] = level;

                let error = (value - f32::from(level)) * params.dither_amount;
                if error == 0.0 {
                    continue;
                }

                for &(dx, dy, weight) in kernel.entries {
                    let (Some(nx), ny) = (x.checked_add_signed(dx), y + dy) else {
                        continue;
                    };
                    if nx >= width || ny >= height {
                        continue;
                    }
                    working[(ny * width + nx) * CHANNELS + c] += kernel.share(error, weight);
                }
            }

            output[pixel * BYTES_PER_PIXEL + 3] = 255;
        }
    }
}
