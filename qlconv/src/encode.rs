//! Binary encoders for quantized RGBA8 buffers.
//!
//! Both layouts ignore alpha and carry no header.

use crate::{
    consts::{INTERLEAVED_CUTOFF, PIXELS_PER_GROUP, PLANE_CUTOFF},
    dither::rgba_len,
    quantize::level_index,
    BitDepth, BYTES_PER_PIXEL,
};
use itertools::iproduct;
use snafu::{ensure, OptionExt, Snafu};

#[cfg(feature = "std")]
mod std_api;
#[cfg(feature = "std")]
pub use std_api::*;

/// Colour planes of the legacy layout, in output order.
pub const PLANES: [Plane; 3] = [Plane::Red, Plane::Green, Plane::Blue];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Red,
    Green,
    Blue,
}

impl Plane {
    #[inline]
    const fn channel(self) -> usize {
        match self {
            Plane::Red => 0,
            Plane::Green => 1,
            Plane::Blue => 2,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub(crate)))]
pub enum EncodeError {
    #[snafu(display(
        "Specified image dimensions don't match the buffer: {width} * {height} * 4 bytes expected, but {len} bytes were given"
    ))]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },
    #[snafu(display("Image width {width} is not a multiple of 4"))]
    WidthNotMultipleOfFour { width: usize },
    #[snafu(display("Output buffer too small: {needed} bytes needed, {len} available"))]
    OutputTooSmall { needed: usize, len: usize },
}

pub(crate) fn check_dimensions(
    pixels: &[u8],
    width: usize,
    height: usize,
) -> Result<(), EncodeError> {
    let len = rgba_len(width, height).context(encode_error::InvalidDimensionsSnafu {
        width,
        height,
        len: pixels.len(),
    })?;
    ensure!(
        len == pixels.len(),
        encode_error::InvalidDimensionsSnafu {
            width,
            height,
            len: pixels.len()
        }
    );
    Ok(())
}

/// Size of the interleaved encoding: one byte per plane per 4 pixels.
pub const fn interleaved_len(width: usize, height: usize, two_plane: bool) -> usize {
    let planes = if two_plane { 2 } else { 1 };
    height * (width / PIXELS_PER_GROUP) * planes
}

/// Encodes 4 RGBA8 pixels into the green/flash byte and the red/blue byte.
///
/// A channel counts as set if it is above [`INTERLEAVED_CUTOFF`]. The flash bits are always
/// clear.
#[inline]
pub fn interleave_group(group: &[u8]) -> [u8; 2] {
    let mut green = 0;
    let mut red_blue = 0;
    let mut bit = 0b1000_0000u8;

    for pixel in group.chunks_exact(BYTES_PER_PIXEL).take(PIXELS_PER_GROUP) {
        if pixel[1] > INTERLEAVED_CUTOFF {
            green |= bit;
        }
        if pixel[0] > INTERLEAVED_CUTOFF {
            red_blue |= bit;
        }
        if pixel[2] > INTERLEAVED_CUTOFF {
            red_blue |= bit >> 1;
        }
        bit >>= 2;
    }

    [green, red_blue]
}

/// Encodes into the interleaved mode-8 layout. Returns the number of bytes written.
///
/// `width` has to be a multiple of 4; no padding is attempted. With `two_plane` set, every
/// group emits the green/flash byte followed by the red/blue byte, otherwise only the red/blue
/// byte.
pub fn encode_interleaved_to_slice(
    pixels: &[u8],
    width: usize,
    height: usize,
    two_plane: bool,
    output: &mut [u8],
) -> Result<usize, EncodeError> {
    check_dimensions(pixels, width, height)?;
    ensure!(
        width % PIXELS_PER_GROUP == 0,
        encode_error::WidthNotMultipleOfFourSnafu { width }
    );
    let len = interleaved_len(width, height, two_plane);
    ensure!(
        output.len() >= len,
        encode_error::OutputTooSmallSnafu {
            needed: len,
            len: output.len()
        }
    );

    let step = if two_plane { 2 } else { 1 };
    for (group, out) in pixels
        .chunks_exact(PIXELS_PER_GROUP * BYTES_PER_PIXEL)
        .zip(output[..len].chunks_exact_mut(step))
    {
        let [green, red_blue] = interleave_group(group);
        if two_plane {
            out[0] = green;
            out[1] = red_blue;
        } else {
            out[0] = red_blue;
        }
    }

    Ok(len)
}

/// Bytes per row of one legacy plane.
pub const fn plane_row_len(width: usize, depth: BitDepth) -> usize {
    match depth {
        BitDepth::One => width.div_ceil(8),
        BitDepth::Two => width.div_ceil(4),
    }
}

/// Size of the legacy encoding: three planes of [`plane_row_len`] bytes per row.
pub const fn planes_len(width: usize, height: usize, depth: BitDepth) -> usize {
    PLANES.len() * height * plane_row_len(width, depth)
}

/// Builds byte `column` of row `y` of one legacy plane.
///
/// 1-bit: 8 pixels, MSB first, bit set if the channel is at least [`PLANE_CUTOFF`].
/// 2-bit: 4 pixels, 2 bits each, MSB first, holding the level index of the channel.
pub fn plane_byte(
    pixels: &[u8],
    width: usize,
    depth: BitDepth,
    plane: Plane,
    y: usize,
    column: usize,
) -> u8 {
    let pixels_per_byte = match depth {
        BitDepth::One => 8,
        BitDepth::Two => 4,
    };
    let first = column * pixels_per_byte;
    let last = (first + pixels_per_byte).min(width);
    let channel = plane.channel();

    let mut byte = 0;
    for x in first..last {
        let value = pixels[(y * width + x) * BYTES_PER_PIXEL + channel];
        match depth {
            BitDepth::One => {
                if value >= PLANE_CUTOFF {
                    byte |= 1 << (7 - x % 8);
                }
            }
            BitDepth::Two => byte |= level_index(value) << (6 - (x % 4) * 2),
        }
    }
    byte
}

/// Encodes into the legacy three-plane layout. Returns the number of bytes written.
pub fn encode_planes_to_slice(
    pixels: &[u8],
    width: usize,
    height: usize,
    depth: BitDepth,
    output: &mut [u8],
) -> Result<usize, EncodeError> {
    check_dimensions(pixels, width, height)?;
    let len = planes_len(width, height, depth);
    ensure!(
        output.len() >= len,
        encode_error::OutputTooSmallSnafu {
            needed: len,
            len: output.len()
        }
    );

    let row_len = plane_row_len(width, depth);
    for (out, (plane, y, column)) in output[..len]
        .iter_mut()
        .zip(iproduct!(PLANES, 0..height, 0..row_len))
    {
        *out = plane_byte(pixels, width, depth, plane, y, column);
    }

    Ok(len)
}
