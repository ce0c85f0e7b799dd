use crate::{
    bayer::BayerSize,
    quantize::{Cutoffs, Quantizer},
    BitDepth, DitherParameters, BYTES_PER_PIXEL,
};
use snafu::{ensure, OptionExt, Snafu};

pub mod diffusion;

pub use diffusion::{Kernel, Rounding, ATKINSON, FLOYD_STEINBERG};

/// Working values per pixel used by the error diffusion algorithms (R, G and B).
pub const CHANNELS: usize = 3;

/// Dithering algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Plain per-channel threshold, no dithering.
    Threshold,
    /// Error diffusion to 4 neighbours, 16/16 of the error.
    FloydSteinberg,
    /// Error diffusion to 6 neighbours, 6/8 of the error.
    Atkinson,
    /// Threshold modulated by a tiled Bayer matrix.
    Ordered(BayerSize),
}

impl Algorithm {
    /// The error diffusion kernel, if this algorithm diffuses error at all.
    pub const fn kernel(self) -> Option<&'static Kernel> {
        match self {
            Algorithm::FloydSteinberg => Some(&FLOYD_STEINBERG),
            Algorithm::Atkinson => Some(&ATKINSON),
            Algorithm::Threshold | Algorithm::Ordered(_) => None,
        }
    }

    /// Number of `f32` scratch values [`dither_to_slice`] needs for an image of this size.
    pub const fn scratch_len(self, width: usize, height: usize) -> usize {
        match self.kernel() {
            Some(_) => width * height * CHANNELS,
            None => 0,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub(crate)))]
pub enum DitherError {
    #[snafu(display(
        "Specified image dimensions don't match the buffer: {width} * {height} * 4 bytes expected, but {len} bytes were given"
    ))]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },
    #[snafu(display("Output buffer too small: {needed} bytes needed, {len} available"))]
    OutputTooSmall { needed: usize, len: usize },
    #[snafu(display("Scratch buffer too small: {needed} values needed, {len} available"))]
    ScratchTooSmall { needed: usize, len: usize },
}

/// Returns `width * height * 4`, or `None` on overflow.
pub(crate) fn rgba_len(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(BYTES_PER_PIXEL)
}

/// Dithers an RGBA8 image into `output`.
///
/// `output` must be at least as long as `input`; alpha is written as 255. `scratch` holds the
/// working copy for the error diffusion algorithms and needs
/// [`Algorithm::scratch_len`] values. Other algorithms accept an empty slice.
///
/// The threshold and dither amount are used as given. Clamping the dither amount to `0..=1`
/// is up to the caller (see [`DitherParameters::new`]).
pub fn dither_to_slice(
    input: &[u8],
    output: &mut [u8],
    width: usize,
    height: usize,
    params: &DitherParameters,
    scratch: &mut [f32],
) -> Result<(), DitherError> {
    let len = rgba_len(width, height).context(dither_error::InvalidDimensionsSnafu {
        width,
        height,
        len: input.len(),
    })?;
    ensure!(
        len == input.len(),
        dither_error::InvalidDimensionsSnafu {
            width,
            height,
            len: input.len()
        }
    );
    ensure!(
        output.len() >= len,
        dither_error::OutputTooSmallSnafu {
            needed: len,
            len: output.len()
        }
    );
    let scratch_len = params.algorithm.scratch_len(width, height);
    ensure!(
        scratch.len() >= scratch_len,
        dither_error::ScratchTooSmallSnafu {
            needed: scratch_len,
            len: scratch.len()
        }
    );

    dither_unchecked(
        input,
        &mut output[..len],
        width,
        height,
        params,
        &mut scratch[..scratch_len],
    );

    Ok(())
}

/// Dispatches to the algorithm. Buffer sizes have been checked by the caller.
pub(crate) fn dither_unchecked(
    input: &[u8],
    output: &mut [u8],
    width: usize,
    height: usize,
    params: &DitherParameters,
    scratch: &mut [f32],
) {
    match params.algorithm {
        Algorithm::Threshold => threshold(input, output, params),
        Algorithm::FloydSteinberg => {
            diffusion::diffuse(input, output, width, height, params, &FLOYD_STEINBERG, scratch)
        }
        Algorithm::Atkinson => {
            diffusion::diffuse(input, output, width, height, params, &ATKINSON, scratch)
        }
        Algorithm::Ordered(size) => ordered(input, output, width, params, size),
    }
}

fn threshold(input: &[u8], output: &mut [u8], params: &DitherParameters) {
    let quantizer = Quantizer::new(params.threshold, params.bit_depth);

    for (src, dst) in input
        .chunks_exact(BYTES_PER_PIXEL)
        .zip(output.chunks_exact_mut(BYTES_PER_PIXEL))
    {
        for c in 0..CHANNELS {
            dst[c] = quantizer.apply(f32::from(src[c]));
        }
        dst[3] = 255;
    }
}

fn ordered(input: &[u8], output: &mut [u8], width: usize, params: &DitherParameters, size: BayerSize) {
    let matrix = size.matrix();
    let threshold = f32::from(params.threshold);
    let cutoffs = Cutoffs::new(params.threshold);

    for (i, (src, dst)) in input
        .chunks_exact(BYTES_PER_PIXEL)
        .zip(output.chunks_exact_mut(BYTES_PER_PIXEL))
        .enumerate()
    {
        let (x, y) = (i % width, i / width);
        let offset = matrix.value(x, y);

        match params.bit_depth {
            BitDepth::One => {
                // offsets are non-negative, so truncation is floor
                let modifier = (offset * 255.0 * params.dither_amount) as i32 as f32;
                let adjusted = (threshold - modifier).clamp(0.0, 255.0);
                for c in 0..CHANNELS {
                    dst[c] = if f32::from(src[c]) >= adjusted { 255 } else { 0 };
                }
            }
            BitDepth::Two => {
                let modifier = (offset * 85.0 * params.dither_amount) as i32 as f32;
                let shifted = cutoffs.offset(modifier);
                for c in 0..CHANNELS {
                    dst[c] = shifted.band(f32::from(src[c]));
                }
            }
        }
        dst[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::quantize;

    fn params(algorithm: Algorithm, bit_depth: BitDepth) -> DitherParameters {
        DitherParameters::new(algorithm, 128, 1.0, bit_depth)
    }

    fn gradient(width: usize, height: usize) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                let (x, y) = (i % width, i / width);
                let v = (x * 255 / width.max(1)) as u8;
                [v, (y * 255 / height.max(1)) as u8, 255 - v, 17]
            })
            .collect()
    }

    fn run(input: &[u8], width: usize, height: usize, params: &DitherParameters) -> Vec<u8> {
        let mut output = vec![0; input.len()];
        let mut scratch = vec![0.0; params.algorithm.scratch_len(width, height)];
        dither_to_slice(input, &mut output, width, height, params, &mut scratch).unwrap();
        output
    }

    #[test]
    fn threshold_quantizes_each_channel() {
        let input = gradient(16, 4);
        for depth in [BitDepth::One, BitDepth::Two] {
            let params = params(Algorithm::Threshold, depth);
            let output = run(&input, 16, 4, &params);
            for (src, dst) in input.chunks(4).zip(output.chunks(4)) {
                for c in 0..3 {
                    assert_eq!(dst[c], quantize(src[c], 128, depth));
                }
                assert_eq!(dst[3], 255);
            }
        }
    }

    #[test]
    fn ordered_1bit_lowers_the_threshold() {
        // 2x2 offsets: 0, 0.5 / 0.75, 0.25
        let input = [100, 100, 100, 255].repeat(4);
        let params = DitherParameters::new(Algorithm::Ordered(BayerSize::Two), 128, 1.0, BitDepth::One);
        let output = run(&input, 2, 2, &params);
        // thresholds: 128, 128-127=1 / 128-191=0 (clamped), 128-63=65
        let reds: Vec<u8> = output.chunks(4).map(|p| p[0]).collect();
        assert_eq!(reds, [0, 255, 255, 255]);
    }

    #[test]
    fn ordered_2bit_shifts_every_cutoff() {
        let input = [60, 120, 180, 255].repeat(2);
        let params = DitherParameters::new(Algorithm::Ordered(BayerSize::Two), 128, 1.0, BitDepth::Two);
        let output = run(&input, 2, 1, &params);
        // x=0: offset 0, cutoffs 64/128/191.5
        assert_eq!(&output[..4], &[0, 85, 170, 255]);
        // x=1: offset 0.5, modifier floor(42.5)=42, cutoffs 22/86/149.5
        assert_eq!(&output[4..], &[85, 170, 255, 255]);
    }

    #[test]
    fn ordered_pattern_tiles_with_the_matrix() {
        let input = [90, 140, 200, 255].repeat(16 * 16);
        for depth in [BitDepth::One, BitDepth::Two] {
            let params = DitherParameters::new(
                Algorithm::Ordered(BayerSize::Eight),
                128,
                0.8,
                depth,
            );
            let output = run(&input, 16, 16, &params);
            let at = |x: usize, y: usize| &output[(y * 16 + x) * 4..][..4];
            for y in 0..16 {
                for x in 0..16 {
                    assert_eq!(at(x, y), at(x % 8, y % 8), "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn ordered_without_strength_is_threshold() {
        let input = gradient(13, 7);
        for depth in [BitDepth::One, BitDepth::Two] {
            for size in [BayerSize::Two, BayerSize::Four, BayerSize::Eight] {
                let ordered = run(
                    &input,
                    13,
                    7,
                    &params(Algorithm::Ordered(size), depth).with_dither_amount(0.0),
                );
                let plain = run(&input, 13, 7, &params(Algorithm::Threshold, depth));
                assert_eq!(ordered, plain);
            }
        }
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let input = vec![0; 4 * 4 * 4];
        let params = params(Algorithm::FloydSteinberg, BitDepth::One);
        let mut output = vec![0; input.len()];
        let mut scratch = vec![0.0; params.algorithm.scratch_len(4, 4)];

        assert!(matches!(
            dither_to_slice(&input, &mut output, 4, 3, &params, &mut scratch),
            Err(DitherError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            dither_to_slice(&input, &mut output[..10], 4, 4, &params, &mut scratch),
            Err(DitherError::OutputTooSmall { needed: 64, len: 10 })
        ));
        assert!(matches!(
            dither_to_slice(&input, &mut output, 4, 4, &params, &mut scratch[..3]),
            Err(DitherError::ScratchTooSmall { needed: 48, len: 3 })
        ));
        assert!(matches!(
            dither_to_slice(&input, &mut output, usize::MAX, 2, &params, &mut scratch),
            Err(DitherError::InvalidDimensions { .. })
        ));

        // threshold and ordered don't need scratch space
        let params = params.with_algorithm(Algorithm::Threshold);
        dither_to_slice(&input, &mut output, 4, 4, &params, &mut []).unwrap();
    }
}
