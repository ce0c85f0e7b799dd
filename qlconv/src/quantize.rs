//! Per-channel level quantization.
//!
//! All three 2-bit band boundaries are derived from the threshold, so moving the threshold
//! shifts every band instead of only the middle one.

use crate::BitDepth;

/// Maps a channel value to 0 or 255.
#[inline]
pub const fn quantize_1bit(value: u8, threshold: u8) -> u8 {
    if value >= threshold {
        255
    } else {
        0
    }
}

/// Maps a channel value to 0, 85, 170 or 255.
#[inline]
pub fn quantize_2bit(value: u8, threshold: u8) -> u8 {
    Cutoffs::new(threshold).band(f32::from(value))
}

#[inline]
pub fn quantize(value: u8, threshold: u8, depth: BitDepth) -> u8 {
    match depth {
        BitDepth::One => quantize_1bit(value, threshold),
        BitDepth::Two => quantize_2bit(value, threshold),
    }
}

/// Quantizer for one threshold and bit depth, with the 2-bit cutoffs computed once.
///
/// Works on `f32` so error-adjusted values don't need to be rounded first.
#[derive(Debug, Clone, Copy)]
pub enum Quantizer {
    OneBit { threshold: f32 },
    TwoBit { cutoffs: Cutoffs },
}

impl Quantizer {
    pub fn new(threshold: u8, depth: BitDepth) -> Self {
        match depth {
            BitDepth::One => Quantizer::OneBit {
                threshold: f32::from(threshold),
            },
            BitDepth::Two => Quantizer::TwoBit {
                cutoffs: Cutoffs::new(threshold),
            },
        }
    }

    #[inline]
    pub fn apply(&self, value: f32) -> u8 {
        match self {
            Quantizer::OneBit { threshold } => {
                if value >= *threshold {
                    255
                } else {
                    0
                }
            }
            Quantizer::TwoBit { cutoffs } => cutoffs.band(value),
        }
    }
}

/// The three boundaries between the four 2-bit bands.
///
/// A value below `dark` becomes 0, below `mid` 85, below `bright` 170, and everything else
/// 255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoffs {
    pub dark: f32,
    pub mid: f32,
    pub bright: f32,
}

impl Cutoffs {
    pub fn new(threshold: u8) -> Self {
        let t = f32::from(threshold);
        Self {
            dark: (t / 2.0).clamp(0.0, 127.0),
            mid: t,
            bright: (t + (255.0 - t) / 2.0).clamp(0.0, 255.0),
        }
    }

    /// Lowers every boundary by `modifier`, keeping each one inside `0..=255`.
    pub fn offset(self, modifier: f32) -> Self {
        Self {
            dark: (self.dark - modifier).clamp(0.0, 255.0),
            mid: (self.mid - modifier).clamp(0.0, 255.0),
            bright: (self.bright - modifier).clamp(0.0, 255.0),
        }
    }

    #[inline]
    pub fn band(&self, value: f32) -> u8 {
        if value < self.dark {
            0
        } else if value < self.mid {
            85
        } else if value < self.bright {
            170
        } else {
            255
        }
    }
}

/// Raw 2-bit index of a quantized level: 0 → 0, 85 → 1, 170 → 2, anything else → 3.
#[inline]
pub const fn level_index(level: u8) -> u8 {
    match level {
        0 => 0,
        85 => 1,
        170 => 2,
        _ => 3,
    }
}
