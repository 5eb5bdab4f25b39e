use image::{DynamicImage, ImageFormat};

use crate::error::UnsupportedImage;

/// Largest page an image is drawn on: ISO A4 at 72 units per inch.
pub const CANVAS_WIDTH: f32 = 595.0;
pub const CANVAS_HEIGHT: f32 = 842.0;

/// Encoded image bytes and the name used to report on them.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageInput {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Gray,
    Rgb,
}

impl ColorModel {
    pub fn pdf_name(self) -> &'static [u8] {
        match self {
            ColorModel::Gray => b"DeviceGray",
            ColorModel::Rgb => b"DeviceRGB",
        }
    }
}

/// 8-bit pixel data ready to embed as an image XObject.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorModel,
    pub pixels: Vec<u8>,
    /// One byte per pixel; absent when the image is fully opaque.
    pub alpha: Option<Vec<u8>>,
}

/// Decode a JPEG or PNG image. Other formats are rejected even when the
/// `image` crate could read them.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, UnsupportedImage> {
    let format = image::guess_format(bytes).map_err(|_| UnsupportedImage::Unrecognised)?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(UnsupportedImage::Format(format));
    }

    let img = image::load_from_memory_with_format(bytes, format)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(UnsupportedImage::Empty);
    }
    Ok(flatten(&img))
}

fn flatten(img: &DynamicImage) -> DecodedImage {
    let color_type = img.color();
    let (color, pixels) = if color_type.has_color() {
        (ColorModel::Rgb, img.to_rgb8().into_raw())
    } else {
        (ColorModel::Gray, img.to_luma8().into_raw())
    };

    let alpha = color_type
        .has_alpha()
        .then(|| img.to_luma_alpha8().pixels().map(|p| p.0[1]).collect::<Vec<u8>>())
        .filter(|alpha| alpha.iter().any(|&a| a != u8::MAX));

    DecodedImage {
        width: img.width(),
        height: img.height(),
        color,
        pixels,
        alpha,
    }
}

/// Where an image of a given pixel size goes on its page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_width: f32,
    pub page_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Images that fit the canvas get a page of their own size, one pixel per
/// unit. Larger images are scaled down, keeping their aspect ratio, and
/// centred on a canvas-sized page.
pub fn place(width: u32, height: u32) -> Placement {
    let (w, h) = (width as f32, height as f32);
    if w <= CANVAS_WIDTH && h <= CANVAS_HEIGHT {
        return Placement {
            page_width: w,
            page_height: h,
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
        };
    }

    let scale = (CANVAS_WIDTH / w).min(CANVAS_HEIGHT / h);
    let (scaled_w, scaled_h) = (w * scale, h * scale);
    Placement {
        page_width: CANVAS_WIDTH,
        page_height: CANVAS_HEIGHT,
        x: (CANVAS_WIDTH - scaled_w) / 2.0,
        y: (CANVAS_HEIGHT - scaled_h) / 2.0,
        width: scaled_w,
        height: scaled_h,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_small_image_keeps_native_size() {
        let p = place(200, 100);
        assert_eq!(
            p,
            Placement {
                page_width: 200.0,
                page_height: 100.0,
                x: 0.0,
                y: 0.0,
                width: 200.0,
                height: 100.0,
            }
        );
    }

    #[test]
    fn test_exact_canvas_is_not_scaled() {
        let p = place(595, 842);
        assert_eq!((p.page_width, p.page_height), (595.0, 842.0));
        assert_eq!((p.width, p.height), (595.0, 842.0));
    }

    #[test]
    fn test_wide_image_scaled_and_centred() {
        let p = place(1190, 842);
        assert_eq!((p.page_width, p.page_height), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert!(approx(p.width, 595.0));
        assert!(approx(p.height, 421.0));
        assert!(approx(p.x, 0.0));
        assert!(approx(p.y, 210.5));
    }

    #[test]
    fn test_tall_image_scaled_and_centred() {
        let p = place(1000, 2000);
        assert!(approx(p.height, 842.0));
        assert!(approx(p.width, 421.0));
        assert!(approx(p.x, 87.0));
        assert!(approx(p.y, 0.0));
        // aspect ratio preserved
        assert!(approx(p.width / p.height, 0.5));
    }

    #[test]
    fn test_one_dimension_over_limit() {
        let p = place(300, 1684);
        assert_eq!((p.page_width, p.page_height), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert!(approx(p.width, 150.0));
        assert!(approx(p.height, 842.0));
        assert!(approx(p.x, 222.5));
    }

    #[test]
    fn test_decode_png_and_jpeg() {
        let png = decode(&samples::png(4, 3)).unwrap();
        assert_eq!((png.width, png.height), (4, 3));
        assert_eq!(png.color, ColorModel::Rgb);
        assert_eq!(png.pixels.len(), 4 * 3 * 3);
        assert!(png.alpha.is_none());

        let jpeg = decode(&samples::jpeg(16, 8)).unwrap();
        assert_eq!((jpeg.width, jpeg.height), (16, 8));
        assert_eq!(jpeg.color, ColorModel::Rgb);
    }

    #[test]
    fn test_decode_gray_and_alpha() {
        let gray = decode(&samples::gray_png(5, 5)).unwrap();
        assert_eq!(gray.color, ColorModel::Gray);
        assert_eq!(gray.pixels.len(), 25);

        let translucent = decode(&samples::translucent_png(2, 2)).unwrap();
        assert_eq!(translucent.alpha, Some(vec![128; 4]));
    }

    #[test]
    fn test_decode_rejects_other_formats() {
        assert!(matches!(
            decode(&samples::gif()),
            Err(UnsupportedImage::Format(ImageFormat::Gif))
        ));
        assert!(matches!(
            decode(b"hello"),
            Err(UnsupportedImage::Unrecognised)
        ));
    }

    #[test]
    fn test_decode_corrupt_png() {
        let mut bytes = samples::png(8, 8);
        bytes.truncate(30);
        assert!(matches!(decode(&bytes), Err(UnsupportedImage::Decode(_))));
    }
}
