//! Assembler source output.
//!
//! Every pixel is mapped to one of the 8 QL mode-8 colours and every group of 4 pixels is
//! emitted as one or two `%bbbbbbbb` byte literals behind a `dc.b` directive, one line per
//! row:
//!
//! ```plain
//! ; Height: 1
//! ; Width: 4
//!     dc.b    %10001000,%11001100
//! ```
//!
//! Colours are picked by a fixed cutoff ([`PALETTE_CUTOFF`]) per channel, independent of the
//! threshold that was used for dithering.
//!
//! If the width is not a multiple of 4 the pixel lines are replaced by a comment saying so;
//! the output is still valid assembler source.

use crate::{
    consts::{
        ASM_DIRECTIVE, ASM_LENGTH_DIAGNOSTIC, ASM_WIDTH_DIAGNOSTIC, PALETTE_CUTOFF,
        PIXELS_PER_GROUP,
    },
    encode::check_dimensions,
    BYTES_PER_PIXEL,
};
use alloc::string::String;
use core::fmt;
use itertools::Itertools;

/// The 8 colours of QL mode 8, in colour number order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PaletteEntry {
    Black = 0,
    Blue = 1,
    Red = 2,
    Magenta = 3,
    Green = 4,
    Cyan = 5,
    Yellow = 6,
    White = 7,
}

impl PaletteEntry {
    pub const ALL: [PaletteEntry; 8] = [
        PaletteEntry::Black,
        PaletteEntry::Blue,
        PaletteEntry::Red,
        PaletteEntry::Magenta,
        PaletteEntry::Green,
        PaletteEntry::Cyan,
        PaletteEntry::Yellow,
        PaletteEntry::White,
    ];

    /// Picks the entry for an RGB colour. The colour number is `G R B`, each bit set if the
    /// channel is above [`PALETTE_CUTOFF`].
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let bit = |v: u8| usize::from(v > PALETTE_CUTOFF);
        Self::ALL[bit(g) << 2 | bit(r) << 1 | bit(b)]
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Full-intensity RGB value of this entry.
    pub const fn rgb(self) -> [u8; 3] {
        const fn on(index: u8, bit: u8) -> u8 {
            if index & bit != 0 {
                255
            } else {
                0
            }
        }

        let i = self as u8;
        [on(i, 0b010), on(i, 0b100), on(i, 0b001)]
    }

    /// The 2-bit fragment in the green/flash byte: green, then a clear flash bit.
    #[inline]
    pub const fn green_flash(self) -> u8 {
        (self as u8 >> 2) << 1
    }

    /// The 2-bit fragment in the red/blue byte: red, then blue.
    #[inline]
    pub const fn red_blue(self) -> u8 {
        self as u8 & 0b11
    }
}

/// Packs the fragments of up to 4 entries into one byte, first pixel in the top bits.
fn pack(fragments: impl Iterator<Item = u8>) -> u8 {
    fragments
        .take(PIXELS_PER_GROUP)
        .zip([6, 4, 2, 0])
        .fold(0, |byte, (fragment, shift)| byte | fragment << shift)
}

/// The byte literals of one group of 4 RGBA8 pixels.
fn group_tokens(group: &[u8], two_plane: bool) -> impl Iterator<Item = Token> {
    let mut entries = [PaletteEntry::Black; PIXELS_PER_GROUP];
    for (entry, pixel) in entries.iter_mut().zip(group.chunks_exact(BYTES_PER_PIXEL)) {
        *entry = PaletteEntry::from_rgb([pixel[0], pixel[1], pixel[2]]);
    }

    let green_flash = two_plane.then(|| Token(pack(entries.iter().map(|e| e.green_flash()))));
    let red_blue = Token(pack(entries.iter().map(|e| e.red_blue())));
    green_flash.into_iter().chain([red_blue])
}

/// An assembler binary literal, `%` followed by 8 digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token(pub u8);

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{:08b}", self.0)
    }
}

/// Writes the source text for an RGBA8 image.
///
/// If `pixels` doesn't hold exactly `width * height` pixels, the rows are replaced by
/// [`ASM_LENGTH_DIAGNOSTIC`].
pub fn write_source<W: fmt::Write>(
    pixels: &[u8],
    width: usize,
    height: usize,
    two_plane: bool,
    mut w: W,
) -> fmt::Result {
    writeln!(w, "; Height: {height}")?;
    writeln!(w, "; Width: {width}")?;

    if let Err(e) = check_dimensions(pixels, width, height) {
        tracing::warn!(error = %e, "pixel buffer does not match the dimensions, skipping pixel data");
        return writeln!(w, "{ASM_LENGTH_DIAGNOSTIC}");
    }

    if width % PIXELS_PER_GROUP != 0 {
        tracing::debug!(width, "width is not a multiple of 4, skipping pixel data");
        return writeln!(w, "{ASM_WIDTH_DIAGNOSTIC}");
    }

    let row_len = width * BYTES_PER_PIXEL;
    if row_len == 0 {
        return Ok(());
    }

    for row in pixels.chunks_exact(row_len).take(height) {
        let tokens = row
            .chunks_exact(PIXELS_PER_GROUP * BYTES_PER_PIXEL)
            .flat_map(|group| group_tokens(group, two_plane));
        writeln!(w, "\t{ASM_DIRECTIVE}\t{}", tokens.format(","))?;
    }

    Ok(())
}

/// Encodes an RGBA8 image as assembler source.
pub fn encode_source(pixels: &[u8], width: usize, height: usize, two_plane: bool) -> String {
    let mut source = String::new();
    // Writing to a String cannot fail.
    let _ = write_source(pixels, width, height, two_plane, &mut source);
    source
}

/// Adapts an [`std::io::Write`] so [`write_source`] can stream to files.
#[cfg(feature = "std")]
pub fn write_source_io<W: std::io::Write>(
    pixels: &[u8],
    width: usize,
    height: usize,
    two_plane: bool,
    w: W,
) -> std::io::Result<()> {
    struct Adapter<W> {
        inner: W,
        error: Option<std::io::Error>,
    }

    impl<W: std::io::Write> fmt::Write for Adapter<W> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.inner.write_all(s.as_bytes()).map_err(|e| {
                self.error = Some(e);
                fmt::Error
            })
        }
    }

    let mut adapter = Adapter {
        inner: w,
        error: None,
    };
    match write_source(pixels, width, height, two_plane, &mut adapter) {
        Ok(()) => Ok(()),
        Err(fmt::Error) => Err(adapter
            .error
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "formatter error"))),
    }
}
