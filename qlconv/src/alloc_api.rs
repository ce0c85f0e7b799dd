use crate::{
    asm,
    dither::{self, rgba_len, DitherError},
    encode::{self, EncodeError},
    BitDepth, DitherParameters,
};
use alloc::{string::String, vec, vec::Vec};
use snafu::{ensure, OptionExt};

/// An owned RGBA8 image, row-major, `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, DitherError> {
        let len = rgba_len(width, height).context(dither::dither_error::InvalidDimensionsSnafu {
            width,
            height,
            len: data.len(),
        })?;
        ensure!(
            len == data.len(),
            dither::dither_error::InvalidDimensionsSnafu {
                width,
                height,
                len: data.len()
            }
        );

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Dithers this image. See [`convert`].
    pub fn convert(&self, params: &DitherParameters) -> PixelBuffer {
        convert(self, params)
    }

    pub fn encode_interleaved(&self, two_plane: bool) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        encode_interleaved_to_vec(&self.data, self.width, self.height, two_plane, &mut out)?;
        Ok(out)
    }

    pub fn encode_planes(&self, depth: BitDepth) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        encode_planes_to_vec(&self.data, self.width, self.height, depth, &mut out)?;
        Ok(out)
    }

    pub fn encode_source(&self, two_plane: bool) -> String {
        asm::encode_source(&self.data, self.width, self.height, two_plane)
    }
}

/// Dithers `source` into a new buffer of the same size.
///
/// Deterministic for a given input. The working copy used by the error diffusion algorithms is
/// allocated here and dropped before returning.
pub fn convert(source: &PixelBuffer, params: &DitherParameters) -> PixelBuffer {
    let PixelBuffer {
        width,
        height,
        ref data,
    } = *source;

    tracing::debug!(
        width,
        height,
        algorithm = ?params.algorithm,
        threshold = params.threshold,
        dither_amount = params.dither_amount,
        bit_depth = ?params.bit_depth,
        "dithering image"
    );

    let mut output = vec![0; data.len()];
    let mut scratch = vec![0.0; params.algorithm.scratch_len(width, height)];
    dither::dither_unchecked(data, &mut output, width, height, params, &mut scratch);

    PixelBuffer {
        width,
        height,
        data: output,
    }
}

/// Appends the interleaved mode-8 layout to `w`.
pub fn encode_interleaved_to_vec(
    pixels: &[u8],
    width: usize,
    height: usize,
    two_plane: bool,
    w: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    encode::check_dimensions(pixels, width, height)?;
    let start = w.len();
    w.resize(start + encode::interleaved_len(width, height, two_plane), 0);
    match encode::encode_interleaved_to_slice(pixels, width, height, two_plane, &mut w[start..]) {
        Ok(_) => Ok(()),
        Err(e) => {
            w.truncate(start);
            Err(e)
        }
    }
}

/// Appends the legacy three-plane layout to `w`.
pub fn encode_planes_to_vec(
    pixels: &[u8],
    width: usize,
    height: usize,
    depth: BitDepth,
    w: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    encode::check_dimensions(pixels, width, height)?;
    let start = w.len();
    w.resize(start + encode::planes_len(width, height, depth), 0);
    match encode::encode_planes_to_slice(pixels, width, height, depth, &mut w[start..]) {
        Ok(_) => Ok(()),
        Err(e) => {
            w.truncate(start);
            Err(e)
        }
    }
}
