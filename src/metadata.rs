use exif::{In, Tag, Value};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Orientation correction applied before resizing, in degrees
/// counter-clockwise.
///
/// Only EXIF codes 8, 3 and 6 select a rotation. Mirrored codes (2, 4, 5, 7)
/// are treated like a missing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Ccw90,
    Ccw180,
    Ccw270,
}

impl Rotation {
    pub fn from_exif_code(code: u32) -> Self {
        match code {
            8 => Rotation::Ccw90,
            3 => Rotation::Ccw180,
            6 => Rotation::Ccw270,
            _ => Rotation::None,
        }
    }

    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        // `image` rotates clockwise
        match self {
            Rotation::None => img,
            Rotation::Ccw90 => img.rotate270(),
            Rotation::Ccw180 => img.rotate180(),
            Rotation::Ccw270 => img.rotate90(),
        }
    }
}

/// What the transformer needs from a source file's embedded metadata.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SourceMetadata {
    pub rotation: Rotation,
    /// Horizontal and vertical dots per inch.
    pub dpi: Option<(u16, u16)>,
}

impl SourceMetadata {
    /// Read orientation and density from the raw file bytes. The container's
    /// own density (JFIF APP0 for JPEG, pHYs for PNG) wins over EXIF
    /// resolution tags. Anything unreadable yields the defaults.
    pub fn read(bytes: &[u8], format: ImageFormat) -> Self {
        let native_dpi = match format {
            ImageFormat::Jpeg => read_jfif_dpi(bytes),
            ImageFormat::Png => read_png_dpi(bytes),
            _ => None,
        };

        let mut cursor = Cursor::new(bytes);
        let exif = match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(e) => {
                log::debug!("No usable EXIF data: {}", e);
                return Self {
                    rotation: Rotation::None,
                    dpi: native_dpi,
                };
            }
        };

        let rotation = exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Rotation::from_exif_code)
            .unwrap_or_default();

        Self {
            rotation,
            dpi: native_dpi.or_else(|| read_dpi(&exif)),
        }
    }
}

/// Density from the JFIF APP0 segment. Unit 0 only carries an aspect ratio
/// and is ignored.
fn read_jfif_dpi(bytes: &[u8]) -> Option<(u16, u16)> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        // Start of scan or end of image: no more headers
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let segment = bytes.get(pos + 4..pos + 2 + len)?;

        if marker == 0xE0 && segment.len() >= 12 && segment.starts_with(b"JFIF\0") {
            let x = u16::from_be_bytes([segment[8], segment[9]]) as f64;
            let y = u16::from_be_bytes([segment[10], segment[11]]) as f64;
            return match segment[7] {
                1 => Some((to_dpi(x, 1.0)?, to_dpi(y, 1.0)?)),
                2 => Some((to_dpi(x, 2.54)?, to_dpi(y, 2.54)?)),
                _ => None,
            };
        }
        pos += 2 + len;
    }
    None
}

/// Density from the PNG pHYs chunk, when its unit is metres.
fn read_png_dpi(bytes: &[u8]) -> Option<(u16, u16)> {
    let reader = match png::Decoder::new(bytes).read_info() {
        Ok(reader) => reader,
        Err(e) => {
            log::debug!("Failed to read PNG header: {}", e);
            return None;
        }
    };

    let dims = reader.info().pixel_dims?;
    match dims.unit {
        png::Unit::Meter => Some((
            to_dpi(dims.xppu as f64, METRES_PER_INCH)?,
            to_dpi(dims.yppu as f64, METRES_PER_INCH)?,
        )),
        png::Unit::Unspecified => None,
    }
}

/// pHYs density for `dpi`, in pixels per metre.
pub fn png_pixel_dims(dpi: (u16, u16)) -> png::PixelDimensions {
    let per_metre = |value: u16| (value as f64 / METRES_PER_INCH).round() as u32;
    png::PixelDimensions {
        xppu: per_metre(dpi.0),
        yppu: per_metre(dpi.1),
        unit: png::Unit::Meter,
    }
}

const METRES_PER_INCH: f64 = 0.0254;

fn to_dpi(value: f64, scale: f64) -> Option<u16> {
    let dpi = (value * scale).round();
    (dpi.is_finite() && dpi >= 1.0 && dpi <= u16::MAX as f64).then_some(dpi as u16)
}

fn read_dpi(exif: &exif::Exif) -> Option<(u16, u16)> {
    let resolution = |tag: Tag| -> Option<f64> {
        match &exif.get_field(tag, In::PRIMARY)?.value {
            Value::Rational(values) => values.first().map(|r| r.to_f64()),
            _ => None,
        }
    };

    let x = resolution(Tag::XResolution)?;
    let y = resolution(Tag::YResolution).unwrap_or(x);

    // 2 = inches (the default), 3 = centimetres
    let unit = exif
        .get_field(Tag::ResolutionUnit, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(2);
    let scale = match unit {
        2 => 1.0,
        3 => 2.54,
        _ => return None,
    };

    Some((to_dpi(x, scale)?, to_dpi(y, scale)?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Field, Rational};
    use image::codecs::jpeg::{JpegEncoder, PixelDensity, PixelDensityUnit};
    use image::{ColorType, ImageEncoder, ImageOutputFormat, Rgb, RgbImage};

    /// Encode a JPEG and splice an APP1 EXIF segment holding `fields` right
    /// after the SOI marker.
    pub(crate) fn jpeg_with_exif(img: &RgbImage, fields: &[Field]) -> Vec<u8> {
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(img.clone())
            .write_to(&mut Cursor::new(&mut jpeg), ImageOutputFormat::Jpeg(95))
            .unwrap();

        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut tiff = Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let tiff = tiff.into_inner();

        let segment_len = (2 + 6 + tiff.len()) as u16;
        let mut app1 = vec![0xFF, 0xE1];
        app1.extend_from_slice(&segment_len.to_be_bytes());
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&tiff);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    /// A JPEG whose only density information is the JFIF header.
    pub(crate) fn jpeg_with_jfif_density(img: &RgbImage, density: PixelDensity) -> Vec<u8> {
        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, 95);
        encoder.set_pixel_density(density);
        encoder
            .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)
            .unwrap();
        jpeg
    }

    pub(crate) fn png_with_dpi(img: &RgbImage, dpi: (u16, u16)) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut encoder = png::Encoder::new(&mut bytes, img.width(), img.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_pixel_dims(Some(png_pixel_dims(dpi)));
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(img.as_raw()).unwrap();
        writer.finish().unwrap();
        bytes
    }

    pub(crate) fn orientation_field(code: u16) -> Field {
        Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![code]),
        }
    }

    #[test]
    fn test_rotation_lookup() {
        assert_eq!(Rotation::from_exif_code(1), Rotation::None);
        assert_eq!(Rotation::from_exif_code(8), Rotation::Ccw90);
        assert_eq!(Rotation::from_exif_code(3), Rotation::Ccw180);
        assert_eq!(Rotation::from_exif_code(6), Rotation::Ccw270);

        // Mirrored and unknown codes are ignored
        for code in [0, 2, 4, 5, 7, 9, 42] {
            assert_eq!(Rotation::from_exif_code(code), Rotation::None);
        }
    }

    #[test]
    fn test_rotation_direction() {
        let mut img = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        img.put_pixel(2, 0, Rgb([255, 0, 0]));

        // Counter-clockwise quarter turn moves the top-right corner to the top-left
        let rotated = Rotation::Ccw90.apply(DynamicImage::ImageRgb8(img.clone())).to_rgb8();
        assert_eq!(rotated.dimensions(), (2, 3));
        assert_eq!(rotated.get_pixel(0, 0), &Rgb([255, 0, 0]));

        // Clockwise quarter turn moves it to the bottom-right
        let rotated = Rotation::Ccw270.apply(DynamicImage::ImageRgb8(img)).to_rgb8();
        assert_eq!(rotated.dimensions(), (2, 3));
        assert_eq!(rotated.get_pixel(1, 2), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_read_without_exif() {
        assert_eq!(SourceMetadata::read(b"not an image", ImageFormat::Jpeg), SourceMetadata::default());
    }

    #[test]
    fn test_read_orientation_and_dpi() {
        let img = RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]));
        let fields = [
            orientation_field(6),
            Field {
                tag: Tag::XResolution,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![Rational { num: 300, denom: 1 }]),
            },
            Field {
                tag: Tag::YResolution,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![Rational { num: 300, denom: 1 }]),
            },
            Field {
                tag: Tag::ResolutionUnit,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![2]),
            },
        ];

        let meta = SourceMetadata::read(&jpeg_with_exif(&img, &fields), ImageFormat::Jpeg);

        assert_eq!(meta.rotation, Rotation::Ccw270);
        assert_eq!(meta.dpi, Some((300, 300)));
    }

    #[test]
    fn test_dpi_from_centimetres() {
        let img = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let fields = [
            Field {
                tag: Tag::XResolution,
                ifd_num: In::PRIMARY,
                value: Value::Rational(vec![Rational { num: 118, denom: 1 }]),
            },
            Field {
                tag: Tag::ResolutionUnit,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![3]),
            },
        ];

        let meta = SourceMetadata::read(&jpeg_with_exif(&img, &fields), ImageFormat::Jpeg);

        assert_eq!(meta.rotation, Rotation::None);
        assert_eq!(meta.dpi, Some((300, 300)));
    }

    #[test]
    fn test_dpi_from_jfif_header() {
        let img = RgbImage::from_pixel(30, 20, Rgb([0, 0, 0]));

        let bytes = jpeg_with_jfif_density(&img, PixelDensity::dpi(300));
        assert_eq!(SourceMetadata::read(&bytes, ImageFormat::Jpeg).dpi, Some((300, 300)));

        let per_cm = PixelDensity {
            density: (118, 47),
            unit: PixelDensityUnit::Centimeters,
        };
        let bytes = jpeg_with_jfif_density(&img, per_cm);
        assert_eq!(SourceMetadata::read(&bytes, ImageFormat::Jpeg).dpi, Some((300, 119)));
    }

    #[test]
    fn test_jfif_aspect_only_falls_back_to_exif() {
        let img = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let aspect_only = PixelDensity {
            density: (1, 1),
            unit: PixelDensityUnit::PixelAspectRatio,
        };
        assert_eq!(
            SourceMetadata::read(&jpeg_with_jfif_density(&img, aspect_only), ImageFormat::Jpeg).dpi,
            None
        );

        // The default encoder writes an aspect-only JFIF header after the EXIF
        // segment spliced in front of it
        let fields = [Field {
            tag: Tag::XResolution,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![Rational { num: 72, denom: 1 }]),
        }];
        let meta = SourceMetadata::read(&jpeg_with_exif(&img, &fields), ImageFormat::Jpeg);
        assert_eq!(meta.dpi, Some((72, 72)));
    }

    #[test]
    fn test_dpi_from_png_phys() {
        let img = RgbImage::from_pixel(6, 4, Rgb([1, 2, 3]));

        let meta = SourceMetadata::read(&png_with_dpi(&img, (300, 150)), ImageFormat::Png);
        assert_eq!(meta.dpi, Some((300, 150)));
        assert_eq!(meta.rotation, Rotation::None);
    }

    #[test]
    fn test_png_without_phys_has_no_dpi() {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 0, 0])))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();

        assert_eq!(SourceMetadata::read(&bytes, ImageFormat::Png).dpi, None);
    }
}
