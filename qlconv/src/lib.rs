//! Dithering and bitplane encoding for the Sinclair QL 8-colour screen mode.
//!
//! Images are reduced to 1 or 2 bits per channel with one of several dithering algorithms, and
//! then serialized into layouts understood by QL-side software.
//!
//! # Pipeline
//!
//! 1. A decoded RGBA8 buffer (row-major, 4 bytes per pixel) is fed to the [`dither`] engine
//!    together with [`DitherParameters`].
//! 2. The engine writes a quantized RGBA8 buffer of the same size. Each of R, G and B is one of
//!    the levels in [`consts::LEVELS_1BIT`] or [`consts::LEVELS_2BIT`], alpha is always 255.
//! 3. One of the encoders turns the quantized buffer into bytes or text:
//!    - [`encode`] for the interleaved mode-8 layout (the default binary output) and the legacy
//!      three-plane layout,
//!    - [`asm`] for `dc.b` assembler source.
//!
//! # Interleaved layout
//!
//! Every run of 4 pixels becomes two bytes, matching the QL mode-8 screen memory:
//!
//! ```plain
//! .- green/flash byte ------.- red/blue byte ----------.
//! |  7  6  5  4  3  2  1  0 |  7  6  5  4  3  2  1  0 |
//! |-------------------------+-------------------------|
//! | G0  0 G1  0 G2  0 G3  0 | R0 B0 R1 B1 R2 B2 R3 B3 |
//! `---------------------------------------------------`
//! ```
//!
//! The green/flash byte can be left out, halving the output size. There is no header: width,
//! height and the plane count have to be known by the consumer.
//!
//! # Legacy plane layout
//!
//! Three consecutive planes in red, green, blue order. With 1 bit per channel every byte holds 8
//! pixels (MSB first), with 2 bits per channel every byte holds 4 pixels as raw level indices.
//!
//! # Features
//!
//! - `std` (default): [`std::io::Write`] based encoders and error sources.
//! - `alloc`: [`alloc_api::PixelBuffer`], `Vec`-returning encoders and the [`asm`] encoder.
//!
//! Without either, the slice based APIs still work and never allocate.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
pub mod alloc_api;
#[cfg(feature = "alloc")]
pub mod asm;

pub mod bayer;
pub mod dither;
pub mod encode;
pub mod quantize;

#[cfg(feature = "alloc")]
pub use alloc_api::{convert, PixelBuffer};
pub use bayer::BayerSize;
pub use dither::{Algorithm, DitherError};

use snafu::Snafu;

/// Number of bytes per pixel in both source and quantized buffers.
pub const BYTES_PER_PIXEL: usize = 4;

/// Bits per colour channel in the quantized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    /// Two levels: 0 and 255.
    #[default]
    One,
    /// Four levels: 0, 85, 170 and 255.
    Two,
}

/// Parameters of one conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DitherParameters {
    pub algorithm: Algorithm,
    pub threshold: u8,
    /// Strength of the diffused error or the ordered pattern, `0.0..=1.0`.
    ///
    /// The engine does not clamp this. Use [`DitherParameters::new`] or
    /// [`DitherParameters::with_dither_amount`] to get a clamped value.
    pub dither_amount: f32,
    pub bit_depth: BitDepth,
}

impl DitherParameters {
    pub fn new(algorithm: Algorithm, threshold: u8, dither_amount: f32, bit_depth: BitDepth) -> Self {
        Self {
            algorithm,
            threshold,
            dither_amount: clamp_amount(dither_amount),
            bit_depth,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_dither_amount(mut self, dither_amount: f32) -> Self {
        self.dither_amount = clamp_amount(dither_amount);
        self
    }

    pub fn with_bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.bit_depth = bit_depth;
        self
    }
}

impl Default for DitherParameters {
    fn default() -> Self {
        Self::new(Algorithm::FloydSteinberg, 128, 1.0, BitDepth::One)
    }
}

fn clamp_amount(amount: f32) -> f32 {
    // NaN compares false both ways, map it to "no dithering".
    if amount >= 0.0 {
        amount.min(1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Snafu)]
pub enum ParseAlgorithmError {
    #[snafu(display("unknown algorithm, expected one of: threshold, floyd-steinberg, atkinson, ordered-2x2, ordered-4x4, ordered-8x8"))]
    UnknownAlgorithm,
}

impl core::str::FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(algorithm) = s.eq_ignore_ascii_case("threshold").then_some(Algorithm::Threshold)
               .or_else(|| s.eq_ignore_ascii_case("floyd-steinberg").then_some(Algorithm::FloydSteinberg))
               .or_else(|| s.eq_ignore_ascii_case("atkinson").then_some(Algorithm::Atkinson))
               .or_else(|| s.eq_ignore_ascii_case("ordered-2x2").then_some(Algorithm::Ordered(BayerSize::Two)))
               .or_else(|| s.eq_ignore_ascii_case("ordered-4x4").then_some(Algorithm::Ordered(BayerSize::Four)))
               .or_else(|| s.eq_ignore_ascii_case("ordered-8x8").then_some(Algorithm::Ordered(BayerSize::Eight)))
        else {
            return UnknownAlgorithmSnafu.fail();
        };

        Ok(algorithm)
    }
}

pub mod consts {
    /// Output levels with 1 bit per channel.
    pub const LEVELS_1BIT: [u8; 2] = [0, 255];

    /// Output levels with 2 bits per channel, in level index order.
    pub const LEVELS_2BIT: [u8; 4] = [0, 85, 170, 255];

    /// A channel above this value sets its bit in the interleaved layout.
    pub const INTERLEAVED_CUTOFF: u8 = 127;

    /// A channel at or above this value sets its bit in the 1-bit legacy plane layout.
    pub const PLANE_CUTOFF: u8 = 128;

    /// A channel above this value counts as "on" when picking a palette entry for assembler
    /// output.
    ///
    /// This is deliberately independent of the configurable threshold.
    pub const PALETTE_CUTOFF: u8 = 85;

    /// Pixels per interleaved byte pair / per assembler token.
    pub const PIXELS_PER_GROUP: usize = 4;

    /// Assembler directive emitted in front of every row.
    pub const ASM_DIRECTIVE: &str = "dc.b";

    /// Diagnostic emitted by the assembler encoder instead of pixel data if the width is not a
    /// multiple of [`PIXELS_PER_GROUP`].
    pub const ASM_WIDTH_DIAGNOSTIC: &str = "; Width is not %4; exiting...";

    /// Diagnostic emitted by the assembler encoder instead of pixel data if the buffer doesn't
    /// hold `width * height` pixels.
    pub const ASM_LENGTH_DIAGNOSTIC: &str = "; Pixel data does not match the dimensions; exiting...";
}
