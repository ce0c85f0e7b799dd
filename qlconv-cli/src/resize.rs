use image::{imageops::FilterType, RgbaImage};
use std::str::FromStr;

/// Longest side, in QL pixels, of an automatically sized image.
const AUTO_MAX_SIDE: f64 = 256.0;

/// Horizontal squeeze applied in auto mode. QL mode-8 pixels are wider than tall.
const AUTO_ASPECT: f64 = 3.0 / 4.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    Auto,
    Original,
    Manual,
}

impl FromStr for ResizeMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(mode) = s.eq_ignore_ascii_case("auto").then_some(ResizeMode::Auto)
               .or_else(|| s.eq_ignore_ascii_case("original").then_some(ResizeMode::Original))
               .or_else(|| s.eq_ignore_ascii_case("manual").then_some(ResizeMode::Manual))
        else { return Err("invalid resize mode, expected auto, original or manual"); };

        Ok(mode)
    }
}

/// Computes the size the image is scaled to before dithering.
///
/// `manual` is only used by [`ResizeMode::Manual`] and is required there.
pub fn target_dimensions(
    width: u32,
    height: u32,
    mode: ResizeMode,
    manual: Option<(u32, u32)>,
) -> Result<(u32, u32), &'static str> {
    match mode {
        ResizeMode::Original => Ok((width, height)),
        ResizeMode::Manual => {
            let (width, height) = manual.ok_or("manual resize needs --width and --height")?;
            if width == 0 || height == 0 {
                return Err("manual dimensions must be non-zero");
            }
            Ok((width, height))
        }
        ResizeMode::Auto => {
            let width = f64::from(width) * AUTO_ASPECT;
            let height = f64::from(height);
            let scale = if width > height && width > AUTO_MAX_SIDE {
                AUTO_MAX_SIDE / width
            } else if height > AUTO_MAX_SIDE {
                AUTO_MAX_SIDE / height
            } else {
                1.0
            };
            Ok((
                ((width * scale).floor() as u32).max(1),
                ((height * scale).floor() as u32).max(1),
            ))
        }
    }
}

pub fn resize(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    image::imageops::resize(&image, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_squeezes_and_caps_at_256() {
        // 440 * 3 / 4.4 = 300 wide, wider than tall and above 256
        assert_eq!(
            target_dimensions(440, 200, ResizeMode::Auto, None),
            Ok((256, 170))
        );
        // tall image: height limits
        assert_eq!(
            target_dimensions(200, 512, ResizeMode::Auto, None),
            Ok((68, 256))
        );
        // small image: only the squeeze applies, and 88 * 3 / 4.4 floors to 59
        assert_eq!(
            target_dimensions(88, 50, ResizeMode::Auto, None),
            Ok((59, 50))
        );
    }

    #[test]
    fn original_and_manual() {
        assert_eq!(
            target_dimensions(123, 45, ResizeMode::Original, Some((1, 1))),
            Ok((123, 45))
        );
        assert_eq!(
            target_dimensions(123, 45, ResizeMode::Manual, Some((64, 32))),
            Ok((64, 32))
        );
        assert!(target_dimensions(123, 45, ResizeMode::Manual, None).is_err());
        assert!(target_dimensions(123, 45, ResizeMode::Manual, Some((0, 32))).is_err());
    }

    #[test]
    fn parses_modes() {
        assert_eq!("AUTO".parse(), Ok(ResizeMode::Auto));
        assert_eq!("manual".parse(), Ok(ResizeMode::Manual));
        assert!("fit".parse::<ResizeMode>().is_err());
    }
}
