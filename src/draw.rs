//! Primitive drawing operations on a PDF layer.
//!
//! All coordinates are in points with the origin at the bottom-left
//! corner of the page; conversion to millimeters happens only at the
//! printpdf boundary.

use std::path::Path;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;

use crate::error::ReportError;
use crate::font_metrics::FontSet;
use crate::layout::{MAX_IMAGE_DIMENSION, PT_TO_MM};
use crate::text::{line_height, wrap_text};

// ============================================================================
// COLORS
// ============================================================================

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

pub fn black() -> Color {
    rgb(0.0, 0.0, 0.0)
}

/// Background of the header mini table and the works title row (#F5F5F5).
pub fn light_gray() -> Color {
    rgb(0.961, 0.961, 0.961)
}

/// Fill of the section divider bands (#D3D3D3).
pub fn band_gray() -> Color {
    rgb(0.827, 0.827, 0.827)
}

/// The rule drawn across empty placeholder rows.
pub fn rule_gray() -> Color {
    rgb(0.5, 0.5, 0.5)
}

// ============================================================================
// BOXES AND LINES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Center,
    Right,
}

fn rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, fill: bool, stroke: bool) {
    let points = vec![
        (Point::new(Mm(x * PT_TO_MM), Mm(y * PT_TO_MM)), false),
        (Point::new(Mm((x + w) * PT_TO_MM), Mm(y * PT_TO_MM)), false),
        (Point::new(Mm((x + w) * PT_TO_MM), Mm((y + h) * PT_TO_MM)), false),
        (Point::new(Mm(x * PT_TO_MM), Mm((y + h) * PT_TO_MM)), false),
    ];

    if fill {
        let polygon = Polygon {
            rings: vec![points.clone()],
            mode: if stroke {
                PaintMode::FillStroke
            } else {
                PaintMode::Fill
            },
            winding_order: WindingOrder::NonZero,
        };
        layer.add_polygon(polygon);
    } else if stroke {
        let line = Line {
            points,
            is_closed: true,
        };
        layer.add_line(line);
    }
}

/// Bordered rectangle with an optional fill. The fill is painted
/// first and the border is always stroked on top; the two are
/// independent, not mutually exclusive.
pub fn draw_box(
    layer: &PdfLayerReference,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    border_color: &Color,
    border_width: f32,
    fill_color: Option<&Color>,
) {
    if let Some(fill) = fill_color {
        layer.set_fill_color(fill.clone());
        rect(layer, x, y, w, h, true, false);
    }
    layer.set_outline_color(border_color.clone());
    layer.set_outline_thickness(border_width);
    rect(layer, x, y, w, h, false, true);
}

pub fn draw_line(
    layer: &PdfLayerReference,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    color: &Color,
    width: f32,
) {
    layer.set_outline_color(color.clone());
    layer.set_outline_thickness(width);
    let points = vec![
        (Point::new(Mm(x1 * PT_TO_MM), Mm(y1 * PT_TO_MM)), false),
        (Point::new(Mm(x2 * PT_TO_MM), Mm(y2 * PT_TO_MM)), false),
    ];
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}

// ============================================================================
// TEXT
// ============================================================================

/// Single line of text with the baseline at `y`.
///
/// For center/right alignment `width` makes `x` the left edge of the
/// box to align within; without it `x` is the anchor point itself.
#[allow(clippy::too_many_arguments)]
pub fn draw_text(
    layer: &PdfLayerReference,
    fonts: &FontSet,
    x: f32,
    y: f32,
    text: &str,
    font_size: f32,
    color: &Color,
    align: Align,
    width: Option<f32>,
    bold: bool,
) {
    let metrics = fonts.metrics(bold);
    let tx = match align {
        Align::Left => x,
        Align::Center => {
            let tw = metrics.string_width(text, font_size);
            match width {
                Some(w) => x + (w - tw) / 2.0,
                None => x - tw / 2.0,
            }
        }
        Align::Right => {
            let tw = metrics.string_width(text, font_size);
            match width {
                Some(w) => x + w - tw,
                None => x - tw,
            }
        }
    };

    layer.set_fill_color(color.clone());
    layer.use_text(
        text,
        font_size,
        Mm(tx * PT_TO_MM),
        Mm(y * PT_TO_MM),
        fonts.font(bold),
    );
}

/// Multi-line text: explicit newlines are honored and each segment is
/// word-wrapped to `max_width` when given. Lines advance downward at
/// 1.2x leading. Returns the y position below the last drawn line.
///
/// Callers drawing into a fixed-height box must cap the text before
/// calling; this primitive paints every line it is given.
#[allow(clippy::too_many_arguments)]
pub fn draw_text_multiline(
    layer: &PdfLayerReference,
    fonts: &FontSet,
    x: f32,
    y: f32,
    text: &str,
    font_size: f32,
    color: &Color,
    align: Align,
    max_width: Option<f32>,
    bold: bool,
) -> f32 {
    let lh = line_height(font_size);
    if text.is_empty() {
        return y - lh;
    }

    let metrics = fonts.metrics(bold);
    let mut current_y = y;
    for segment in text.split('\n') {
        let lines = match max_width {
            Some(w) => wrap_text(segment, font_size, w, metrics),
            None => vec![segment.to_string()],
        };
        for line in lines {
            draw_text(
                layer, fonts, x, current_y, &line, font_size, color, align, max_width, bold,
            );
            current_y -= lh;
        }
    }
    current_y
}

// ============================================================================
// IMAGES
// ============================================================================

/// Contain-fit: scale by the smaller axis ratio so the image fits
/// entirely inside the box, then center it. Returns the drawn size
/// and the offset from the box origin.
pub(crate) fn contain_fit(img_w: f32, img_h: f32, box_w: f32, box_h: f32) -> (f32, f32, f32, f32) {
    let scale = (box_w / img_w).min(box_h / img_h);
    let w = img_w * scale;
    let h = img_h * scale;
    ((box_w - w) / 2.0, (box_h - h) / 2.0, w, h)
}

/// Load an image and draw it contain-fitted and centered inside the
/// box. Orientation metadata is applied before anything else, then
/// oversized images are downscaled and flattened to opaque RGB.
///
/// Returns false (after logging) on any load or decode failure; the
/// caller keeps whatever border and label it drew for the cell.
pub fn draw_image_fit(
    layer: &PdfLayerReference,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    image_path: &Path,
) -> bool {
    match embed_image(layer, x, y, w, h, image_path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("{e}");
            false
        }
    }
}

fn embed_image(
    layer: &PdfLayerReference,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    path: &Path,
) -> Result<(), ReportError> {
    let decode_err = |reason: String| ReportError::PhotoDecodeFailed {
        path: path.to_path_buf(),
        reason,
    };

    let reader = ::image::ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?;

    // Orientation must be read from the decoder and applied before the
    // working dimensions are used anywhere: a rotated photo swaps its
    // width and height.
    let mut decoder = reader.into_decoder().map_err(|e| decode_err(e.to_string()))?;
    let orientation = ::image::ImageDecoder::orientation(&mut decoder)
        .unwrap_or(::image::metadata::Orientation::NoTransforms);
    let mut img =
        ::image::DynamicImage::from_decoder(decoder).map_err(|e| decode_err(e.to_string()))?;
    img.apply_orientation(orientation);

    if img.width() > MAX_IMAGE_DIMENSION || img.height() > MAX_IMAGE_DIMENSION {
        img = img.resize(
            MAX_IMAGE_DIMENSION,
            MAX_IMAGE_DIMENSION,
            ::image::imageops::FilterType::Triangle,
        );
    }

    let rgb_image = flatten_to_rgb(&img);
    let (img_w, img_h) = rgb_image.dimensions();

    let image = printpdf::Image::from(ImageXObject {
        width: Px(img_w as usize),
        height: Px(img_h as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb_image.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    let (offset_x, offset_y, render_w, render_h) =
        contain_fit(img_w as f32, img_h as f32, w, h);

    // At 72 dpi one pixel equals one point, so the per-axis scale maps
    // pixel dimensions straight to the requested render size.
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm((x + offset_x) * PT_TO_MM)),
            translate_y: Some(Mm((y + offset_y) * PT_TO_MM)),
            scale_x: Some(render_w / img_w as f32),
            scale_y: Some(render_h / img_h as f32),
            dpi: Some(72.0),
            ..Default::default()
        },
    );

    Ok(())
}

/// Flatten to opaque RGB. Sources with an alpha channel are
/// composited onto a white background instead of having their alpha
/// dropped, so transparent logos do not turn black.
fn flatten_to_rgb(img: &::image::DynamicImage) -> ::image::RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = ::image::RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let a = px[3] as u32;
        let blend = |c: u8| (((c as u32) * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, ::image::Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contain_fit_never_exceeds_the_box() {
        for (iw, ih, bw, bh) in [
            (400.0, 300.0, 100.0, 100.0),
            (300.0, 400.0, 100.0, 100.0),
            (1200.0, 100.0, 250.0, 120.0),
            (50.0, 50.0, 100.0, 200.0),
        ] {
            let (_, _, w, h) = contain_fit(iw, ih, bw, bh);
            assert!(w <= bw + 0.001);
            assert!(h <= bh + 0.001);
        }
    }

    #[test]
    fn contain_fit_preserves_aspect_ratio() {
        let (_, _, w, h) = contain_fit(400.0, 300.0, 100.0, 100.0);
        assert!((w / h - 400.0 / 300.0).abs() < 1e-4);
    }

    #[test]
    fn contain_fit_centers_the_image() {
        let (dx, dy, w, h) = contain_fit(400.0, 300.0, 100.0, 100.0);
        assert!((dx - (100.0 - w) / 2.0).abs() < 1e-4);
        assert!((dy - (100.0 - h) / 2.0).abs() < 1e-4);
        // Wide image: full width, vertically centered.
        assert!((w - 100.0).abs() < 1e-4);
        assert!(dy > 0.0);
    }

    #[test]
    fn contain_fit_may_upscale_small_images() {
        let (_, _, w, h) = contain_fit(50.0, 50.0, 100.0, 200.0);
        assert!((w - 100.0).abs() < 1e-4);
        assert!((h - 100.0).abs() < 1e-4);
    }

    #[test]
    fn alpha_is_composited_onto_white() {
        let mut rgba = ::image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, ::image::Rgba([0, 0, 0, 0])); // fully transparent
        rgba.put_pixel(1, 0, ::image::Rgba([255, 0, 0, 255])); // opaque red
        let flat = flatten_to_rgb(&::image::DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0), &::image::Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(1, 0), &::image::Rgb([255, 0, 0]));
    }
}
