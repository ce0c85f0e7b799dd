use crate::{
    consts::PIXELS_PER_GROUP,
    encode::{
        check_dimensions, encode_error, interleave_group, plane_byte, plane_row_len, EncodeError,
        PLANES,
    },
    BitDepth, BYTES_PER_PIXEL,
};
use snafu::{ensure, ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
pub enum WriteError {
    #[snafu(context(false))]
    Encode { source: EncodeError },
    WriteIo { source: std::io::Error },
}

/// Streams the interleaved mode-8 layout to `w`.
///
/// See [`encode_interleaved_to_slice`](super::encode_interleaved_to_slice) for the layout.
/// Wrap unbuffered writers in a [`std::io::BufWriter`], every group is written separately.
pub fn encode_interleaved_to_writer<W: Write>(
    pixels: &[u8],
    width: usize,
    height: usize,
    two_plane: bool,
    mut w: W,
) -> Result<(), WriteError> {
    check_dimensions(pixels, width, height)?;
    ensure!(
        width % PIXELS_PER_GROUP == 0,
        encode_error::WidthNotMultipleOfFourSnafu { width }
    );

    for group in pixels.chunks_exact(PIXELS_PER_GROUP * BYTES_PER_PIXEL) {
        let bytes = interleave_group(group);
        let bytes = if two_plane { &bytes[..] } else { &bytes[1..] };
        w.write_all(bytes).context(WriteIoSnafu)?;
    }

    Ok(())
}

/// Streams the legacy three-plane layout to `w`, one row of one plane at a time.
pub fn encode_planes_to_writer<W: Write>(
    pixels: &[u8],
    width: usize,
    height: usize,
    depth: BitDepth,
    mut w: W,
) -> Result<(), WriteError> {
    check_dimensions(pixels, width, height)?;

    let row_len = plane_row_len(width, depth);
    let mut row = Vec::with_capacity(row_len);
    for plane in PLANES {
        for y in 0..height {
            row.clear();
            row.extend((0..row_len).map(|column| plane_byte(pixels, width, depth, plane, y, column)));
            w.write_all(&row).context(WriteIoSnafu)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode_interleaved_to_slice, encode_planes_to_slice, planes_len};

    fn noise(width: usize, height: usize) -> Vec<u8> {
        (0..width * height * 4)
            .map(|i| if (i * 7919) % 13 < 6 { 0 } else { 255 })
            .collect()
    }

    #[test]
    fn writer_matches_slice_output() {
        let pixels = noise(12, 5);

        for two_plane in [true, false] {
            let mut written = Vec::new();
            encode_interleaved_to_writer(&pixels, 12, 5, two_plane, &mut written).unwrap();
            let mut slice = vec![0; 120];
            let len = encode_interleaved_to_slice(&pixels, 12, 5, two_plane, &mut slice).unwrap();
            assert_eq!(written, &slice[..len]);
        }

        for depth in [BitDepth::One, BitDepth::Two] {
            let mut written = Vec::new();
            encode_planes_to_writer(&pixels, 12, 5, depth, &mut written).unwrap();
            let mut slice = vec![0; planes_len(12, 5, depth)];
            encode_planes_to_slice(&pixels, 12, 5, depth, &mut slice).unwrap();
            assert_eq!(written, slice);
        }
    }

    #[test]
    fn writer_reports_precondition_errors() {
        let pixels = noise(6, 1);
        assert!(matches!(
            encode_interleaved_to_writer(&pixels, 6, 1, true, Vec::new()),
            Err(WriteError::Encode {
                source: EncodeError::WidthNotMultipleOfFour { width: 6 }
            })
        ));
    }

    #[test]
    fn writer_reports_io_errors() {
        let pixels = noise(4, 4);
        let mut full = [0u8; 3];
        assert!(matches!(
            encode_interleaved_to_writer(&pixels, 4, 4, true, &mut full[..]),
            Err(WriteError::WriteIo { .. })
        ));
    }
}
