use argh::FromArgs;
use image::{
    imageops::{self, FilterType},
    ImageFormat, RgbaImage,
};
use qlconv::{asm, encode, Algorithm, BitDepth, DitherParameters, PixelBuffer};
use resize::ResizeMode;
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    str::FromStr,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod resize;

/// Converts images for the Sinclair QL 8-colour mode.
#[derive(FromArgs)]
struct Cli {
    /// dithering algorithm: threshold, floyd-steinberg, atkinson, ordered-2x2, ordered-4x4,
    /// ordered-8x8 (default: floyd-steinberg)
    #[argh(option, default = "Algorithm::FloydSteinberg")]
    algorithm: Algorithm,

    /// threshold, 0-255 (default: 128)
    #[argh(option, default = "128")]
    threshold: u8,

    /// dithering strength, 0.0-1.0 (default: 1.0)
    #[argh(option, default = "1.0")]
    dither_amount: f32,

    /// quantize to 2 bits per channel instead of 1
    #[argh(switch)]
    two_bit: bool,

    /// resize mode: auto, original, manual (default: auto)
    #[argh(option, default = "ResizeMode::Auto")]
    resize: ResizeMode,

    /// target width for manual resizing
    #[argh(option)]
    width: Option<u32>,

    /// target height for manual resizing
    #[argh(option)]
    height: Option<u32>,

    /// input format, optional (png, jpg, bmp)
    #[argh(option)]
    input_format: Option<Format>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Bin(Bin),
    Planes(Planes),
    Asm(Asm),
    Preview(Preview),
}

/// Writes the interleaved mode-8 screen layout.
#[derive(FromArgs)]
#[argh(subcommand, name = "bin")]
struct Bin {
    /// only write the red/blue bytes, leaving out green
    #[argh(switch)]
    single_plane: bool,

    /// the input image
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

/// Writes three separate red, green and blue planes.
#[derive(FromArgs)]
#[argh(subcommand, name = "planes")]
struct Planes {
    /// the input image
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

/// Writes assembler source with one dc.b line per row.
#[derive(FromArgs)]
#[argh(subcommand, name = "asm")]
struct Asm {
    /// only write the red/blue bytes, leaving out green
    #[argh(switch)]
    single_plane: bool,

    /// the input image
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

/// Writes the converted image as PNG.
#[derive(FromArgs)]
#[argh(subcommand, name = "preview")]
struct Preview {
    /// scale 4x horizontally and 3x vertically to approximate the QL aspect ratio
    #[argh(switch)]
    stretch: bool,

    /// the input image
    #[argh(positional)]
    input: String,
    /// the output file
    #[argh(positional)]
    output: String,
}

#[derive(Debug)]
enum Format {
    Png,
    Jpg,
    Bmp,
}

impl FromStr for Format {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(format) = s.eq_ignore_ascii_case("png").then_some(Format::Png)
               .or_else(|| s.eq_ignore_ascii_case("jpg").then_some(Format::Jpg))
               .or_else(|| s.eq_ignore_ascii_case("bmp").then_some(Format::Bmp))
        else { return Err("invalid string"); };

        Ok(format)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli: Cli = argh::from_env();

    let params = DitherParameters::new(
        cli.algorithm,
        cli.threshold,
        cli.dither_amount,
        if cli.two_bit {
            BitDepth::Two
        } else {
            BitDepth::One
        },
    );

    match &cli.command {
        Command::Bin(Bin {
            single_plane,
            input,
            output,
        }) => {
            let image = load(&cli, input)?.convert(&params);
            let mut w = BufWriter::new(File::create(output)?);
            encode::encode_interleaved_to_writer(
                image.as_bytes(),
                image.width(),
                image.height(),
                !single_plane,
                &mut w,
            )?;
            w.flush()?;
            info!(
                "Written {} bytes to `{output}`",
                encode::interleaved_len(image.width(), image.height(), !single_plane)
            );
        }
        Command::Planes(Planes { input, output }) => {
            let image = load(&cli, input)?.convert(&params);
            let mut w = BufWriter::new(File::create(output)?);
            encode::encode_planes_to_writer(
                image.as_bytes(),
                image.width(),
                image.height(),
                params.bit_depth,
                &mut w,
            )?;
            w.flush()?;
            info!(
                "Written {} bytes to `{output}`",
                encode::planes_len(image.width(), image.height(), params.bit_depth)
            );
        }
        Command::Asm(Asm {
            single_plane,
            input,
            output,
        }) => {
            let image = load(&cli, input)?.convert(&params);
            if image.width() % 4 != 0 {
                tracing::warn!(
                    "width {} is not a multiple of 4, the source will not contain pixel data",
                    image.width()
                );
            }
            let mut w = BufWriter::new(File::create(output)?);
            asm::write_source_io(
                image.as_bytes(),
                image.width(),
                image.height(),
                !single_plane,
                &mut w,
            )?;
            w.flush()?;
            info!("Written assembler source to `{output}`");
        }
        Command::Preview(Preview {
            stretch,
            input,
            output,
        }) => {
            let image = load(&cli, input)?.convert(&params);
            let (width, height) = (image.width() as u32, image.height() as u32);
            let preview = RgbaImage::from_raw(width, height, image.into_bytes())
                .ok_or("failed to create image")?;
            let preview = if *stretch {
                imageops::resize(&preview, width * 4, height * 3, FilterType::Nearest)
            } else {
                preview
            };
            preview.save_with_format(output, ImageFormat::Png)?;
            info!(
                "Written {}x{} preview to `{output}`",
                preview.width(),
                preview.height()
            );
        }
    }

    Ok(())
}

/// Decodes and resizes the input image.
fn load(cli: &Cli, input: &str) -> Result<PixelBuffer, Box<dyn std::error::Error>> {
    let reader = |format: ImageFormat| -> Result<_, Box<dyn std::error::Error>> {
        Ok(image::io::Reader::with_format(BufReader::new(File::open(input)?), format).decode()?)
    };

    let image = match cli.input_format {
        Some(Format::Png) => reader(ImageFormat::Png)?,
        Some(Format::Jpg) => reader(ImageFormat::Jpeg)?,
        Some(Format::Bmp) => reader(ImageFormat::Bmp)?,
        None => image::io::Reader::open(input)?
            .with_guessed_format()?
            .decode()?,
    };

    let (source_width, source_height) = (image.width(), image.height());
    let manual = cli.width.zip(cli.height);
    let (width, height) =
        resize::target_dimensions(source_width, source_height, cli.resize, manual)?;

    info!(
        "Converting {source_width}x{source_height} image to {width}x{height} ({:?}, threshold {}, amount {})",
        cli.algorithm, cli.threshold, cli.dither_amount
    );

    let image = resize::resize(image.into_rgba8(), width, height);
    Ok(PixelBuffer::new(
        width as usize,
        height as usize,
        image.into_raw(),
    )?)
}
