use crate::metadata::SourceMetadata;
use crate::params::BorderParams;
use crate::metadata;
use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageBuffer, ImageEncoder, ImageFormat, Pixel, Primitive};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const JPEG_QUALITY: u8 = 100;
const FILTER: FilterType = FilterType::Lanczos3;

#[derive(Error, Debug)]
pub enum BorderError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("PNG error: {0}")]
    PngError(#[from] png::EncodingError),

    #[error("Border of {border}px leaves no room for a {width}x{height} image")]
    NoRoom { border: u32, width: u32, height: u32 },
}

/// Asks whether an image may be cropped to fit the canvas.
pub trait CropConfirm {
    fn confirm_crop(&mut self, image: &Path) -> bool;
}

impl<F> CropConfirm for F
where
    F: FnMut(&Path) -> bool,
{
    fn confirm_crop(&mut self, image: &Path) -> bool {
        self(image)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aspect {
    Portrait,
    /// Landscape or square.
    Landscape,
}

/// Placement of a source image on the target canvas.
///
/// The configured border is applied along the source's longest side, the
/// border on the other axis is whatever keeps the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderLayout {
    pub aspect: Aspect,
    pub resize_width: f64,
    pub resize_height: f64,
    pub fixed_border: u32,
    pub derived_border: f64,
}

impl BorderLayout {
    pub fn compute(source_width: u32, source_height: u32, params: &BorderParams) -> Self {
        let (sw, sh) = (source_width as f64, source_height as f64);
        let (tw, th) = (params.width as f64, params.height as f64);
        let fixed = params.border as f64;

        if source_height > source_width {
            let resize_height = th - fixed * 2.0;
            let resize_width = resize_height * sw / sh;
            Self {
                aspect: Aspect::Portrait,
                resize_width,
                resize_height,
                fixed_border: params.border,
                derived_border: (tw - resize_width) / 2.0,
            }
        } else {
            let resize_width = tw - fixed * 2.0;
            let resize_height = resize_width * sh / sw;
            Self {
                aspect: Aspect::Landscape,
                resize_width,
                resize_height,
                fixed_border: params.border,
                derived_border: (th - resize_height) / 2.0,
            }
        }
    }

    /// A negative derived border means the resized image overflows the canvas.
    pub fn needs_crop(&self) -> bool {
        self.derived_border < 0.0
    }

    /// Integer size of the resized image, `None` when it collapses to nothing.
    pub fn inner_size(&self) -> Option<(u32, u32)> {
        let width = self.resize_width.trunc();
        let height = self.resize_height.trunc();
        if width < 1.0 || height < 1.0 || width > u32::MAX as f64 || height > u32::MAX as f64 {
            return None;
        }
        Some((width as u32, height as u32))
    }

    /// Horizontal and vertical padding on each side. The derived border is
    /// truncated toward zero and may be negative.
    pub fn padding(&self) -> (i64, i64) {
        let fixed = self.fixed_border as i64;
        let derived = self.derived_border.trunc() as i64;
        match self.aspect {
            Aspect::Portrait => (derived, fixed),
            Aspect::Landscape => (fixed, derived),
        }
    }
}

/// Outcome of processing a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Written(PathBuf),
    /// The user declined cropping; nothing was written.
    Declined,
}

/// `<dir>/<stem><postfix><.ext>`
pub fn output_path(input: &Path, output_dir: &Path, postfix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, postfix, ext.to_string_lossy()),
        None => format!("{}{}", stem, postfix),
    };
    output_dir.join(name)
}

/// Rotate, resize and pad one image onto the target canvas and write it into
/// `output_dir`.
pub fn add_white_border(
    input: &Path,
    output_dir: &Path,
    params: &BorderParams,
    confirm: &mut dyn CropConfirm,
) -> Result<Outcome, BorderError> {
    let bytes = fs::read(input)?;
    let format = image::guess_format(&bytes)?;
    let metadata = SourceMetadata::read(&bytes, format);

    let img = image::load_from_memory_with_format(&bytes, format)?;
    drop(bytes);
    let img = metadata.rotation.apply(img);

    let layout = BorderLayout::compute(img.width(), img.height(), params);
    log::debug!(
        "{}: {}x{} {:?}, rotation {:?}, layout {:?}",
        input.display(),
        img.width(),
        img.height(),
        format,
        metadata.rotation,
        layout
    );

    let (inner_width, inner_height) = layout.inner_size().ok_or(BorderError::NoRoom {
        border: params.border,
        width: params.width,
        height: params.height,
    })?;

    if layout.needs_crop() && !confirm.confirm_crop(input) {
        log::info!("Crop declined, skipping {}", input.display());
        return Ok(Outcome::Declined);
    }

    let resized = img.resize_exact(inner_width, inner_height, FILTER);
    let (pad_x, pad_y) = layout.padding();

    let bordered = pad_dynamic(resized, pad_x, pad_y);

    // The truncated borders can leave the canvas a pixel or two off
    let output = bordered.resize_exact(params.width, params.height, FILTER);

    let path = output_path(input, output_dir, &params.postfix);
    save(&output, &path, format, metadata.dpi)?;

    log::info!("Wrote {}", path.display());
    Ok(Outcome::Written(path))
}

/// Pad in the source's own pixel format, so grayscale stays grayscale and
/// 16-bit stays 16-bit.
fn pad_dynamic(img: DynamicImage, pad_x: i64, pad_y: i64) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(pad_white(&buf, pad_x, pad_y)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(pad_white(&buf, pad_x, pad_y)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(pad_white(&buf, pad_x, pad_y)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(pad_white(&buf, pad_x, pad_y)),
        DynamicImage::ImageLuma16(buf) => DynamicImage::ImageLuma16(pad_white(&buf, pad_x, pad_y)),
        DynamicImage::ImageLumaA16(buf) => {
            DynamicImage::ImageLumaA16(pad_white(&buf, pad_x, pad_y))
        }
        DynamicImage::ImageRgb16(buf) => DynamicImage::ImageRgb16(pad_white(&buf, pad_x, pad_y)),
        DynamicImage::ImageRgba16(buf) => DynamicImage::ImageRgba16(pad_white(&buf, pad_x, pad_y)),
        DynamicImage::ImageRgb32F(buf) => DynamicImage::ImageRgb32F(pad_white(&buf, pad_x, pad_y)),
        DynamicImage::ImageRgba32F(buf) => {
            DynamicImage::ImageRgba32F(pad_white(&buf, pad_x, pad_y))
        }
        other => DynamicImage::ImageRgba8(pad_white(&other.to_rgba8(), pad_x, pad_y)),
    }
}

/// Surround `img` with `pad_x`/`pad_y` pixels of opaque white on each side.
/// Negative padding crops symmetrically instead.
fn pad_white<P>(
    img: &ImageBuffer<P, Vec<P::Subpixel>>,
    pad_x: i64,
    pad_y: i64,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
{
    let width = (img.width() as i64 + pad_x * 2).max(1) as u32;
    let height = (img.height() as i64 + pad_y * 2).max(1) as u32;

    let mut canvas = ImageBuffer::from_pixel(width, height, white());
    imageops::replace(&mut canvas, img, pad_x, pad_y);
    canvas
}

/// Every channel, alpha included, at its maximum.
fn white<P: Pixel>() -> P {
    let channels = [<P::Subpixel as Primitive>::DEFAULT_MAX_VALUE; 4];
    *P::from_slice(&channels[..P::CHANNEL_COUNT as usize])
}

fn save(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    dpi: Option<(u16, u16)>,
) -> Result<(), BorderError> {
    match format {
        ImageFormat::Jpeg => {
            let mut writer = BufWriter::new(File::create(path)?);
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            if let Some((x, y)) = dpi {
                encoder.set_pixel_density(PixelDensity {
                    density: (x, y),
                    unit: PixelDensityUnit::Inches,
                });
            }
            if img.color().has_color() {
                let rgb = img.to_rgb8();
                encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
            } else {
                let gray = img.to_luma8();
                encoder.write_image(gray.as_raw(), gray.width(), gray.height(), ColorType::L8)?;
            }
            writer.flush()?;
        }
        ImageFormat::Png => {
            let (color, depth, data) = png_samples(img);

            let mut writer = BufWriter::new(File::create(path)?);
            let mut encoder = png::Encoder::new(&mut writer, img.width(), img.height());
            encoder.set_color(color);
            encoder.set_depth(depth);
            encoder.set_compression(png::Compression::Best);
            encoder.set_adaptive_filter(png::AdaptiveFilterType::Adaptive);
            encoder.set_pixel_dims(dpi.map(metadata::png_pixel_dims));

            let mut png_writer = encoder.write_header()?;
            png_writer.write_image_data(&data)?;
            png_writer.finish()?;
            writer.flush()?;
        }
        _ => {
            if dpi.is_some() {
                log::debug!("DPI is not carried over for {:?}", format);
            }
            img.save_with_format(path, format)?;
        }
    }
    Ok(())
}

/// PNG color type, bit depth and big-endian sample bytes for `img`.
fn png_samples(img: &DynamicImage) -> (png::ColorType, png::BitDepth, Vec<u8>) {
    use png::{BitDepth, ColorType};

    fn big_endian(samples: &[u16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_be_bytes()).collect()
    }

    match img {
        DynamicImage::ImageLuma8(buf) => (ColorType::Grayscale, BitDepth::Eight, buf.to_vec()),
        DynamicImage::ImageLumaA8(buf) => {
            (ColorType::GrayscaleAlpha, BitDepth::Eight, buf.to_vec())
        }
        DynamicImage::ImageRgb8(buf) => (ColorType::Rgb, BitDepth::Eight, buf.to_vec()),
        DynamicImage::ImageRgba8(buf) => (ColorType::Rgba, BitDepth::Eight, buf.to_vec()),
        DynamicImage::ImageLuma16(buf) => {
            (ColorType::Grayscale, BitDepth::Sixteen, big_endian(buf.as_raw()))
        }
        DynamicImage::ImageLumaA16(buf) => {
            (ColorType::GrayscaleAlpha, BitDepth::Sixteen, big_endian(buf.as_raw()))
        }
        DynamicImage::ImageRgb16(buf) => {
            (ColorType::Rgb, BitDepth::Sixteen, big_endian(buf.as_raw()))
        }
        DynamicImage::ImageRgba16(buf) => {
            (ColorType::Rgba, BitDepth::Sixteen, big_endian(buf.as_raw()))
        }
        other if other.color().has_alpha() => (
            ColorType::Rgba,
            BitDepth::Sixteen,
            big_endian(other.to_rgba16().as_raw()),
        ),
        other => (
            ColorType::Rgb,
            BitDepth::Sixteen,
            big_endian(other.to_rgb16().as_raw()),
        ),
    }
}
