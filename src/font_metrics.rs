//! Font loading and text measurement.
//!
//! The template requires a Unicode font pair (DejaVuSans regular and
//! bold in production) so Turkish report text renders correctly. Both
//! files are hard preconditions: they are read, registered with the
//! PDF document and parsed for metrics before anything is drawn, and
//! a missing file aborts the build with `ReportError::ResourceMissing`.
//!
//! Measurement uses per-character advance widths extracted from the
//! same TTF bytes that get embedded, so wrapped text lines up with
//! what the viewer renders. Widths are in raw font units and scaled
//! by `units_per_em` at query time.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use printpdf::{IndirectFontRef, PdfDocumentReference};

use crate::error::ReportError;

/// Locations of the required font pair. Injected by the caller; the
/// core has no implicit font directory.
#[derive(Debug, Clone)]
pub struct FontPaths {
    pub regular: PathBuf,
    pub bold: PathBuf,
}

/// Character advance widths for one font variant.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Advance widths in raw font units.
    widths: HashMap<char, u16>,
    /// Width used for characters outside the extracted repertoire.
    default_width: u16,
    units_per_em: u16,
}

impl FontMetrics {
    /// Extract metrics from raw TTF data.
    pub fn from_ttf_bytes(data: &[u8]) -> Result<Self, String> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| format!("font parse error: {e}"))?;
        let units_per_em = face.units_per_em();

        // Practical repertoire: ASCII, Latin-1 supplement and Latin
        // Extended-A (covers the Turkish letters), plus typographic
        // punctuation that shows up in pasted report text.
        let mut widths = HashMap::new();
        let repertoire = (0x20u32..=0x7E)
            .chain(0xA0..=0xFF)
            .chain(0x100..=0x17F)
            .chain([0x2013, 0x2014, 0x2018, 0x2019, 0x201C, 0x201D, 0x2026]);
        for code in repertoire {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(advance) = face
                .glyph_index(ch)
                .and_then(|gid| face.glyph_hor_advance(gid))
            {
                widths.insert(ch, advance);
            }
        }

        let default_width = widths.get(&'?').copied().unwrap_or(units_per_em / 2);

        Ok(FontMetrics {
            widths,
            default_width,
            units_per_em,
        })
    }

    /// Advance of a single character in font units.
    pub fn char_width(&self, c: char) -> u16 {
        *self.widths.get(&c).unwrap_or(&self.default_width)
    }

    /// Width of a string in points at the given font size.
    pub fn string_width(&self, text: &str, font_size: f32) -> f32 {
        let total_units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        (total_units as f32 / self.units_per_em as f32) * font_size
    }

    /// Uniform-width metrics for layout tests that do not need a real
    /// font file.
    #[cfg(test)]
    pub(crate) fn fixed(width: u16) -> Self {
        FontMetrics {
            widths: HashMap::new(),
            default_width: width,
            units_per_em: 1000,
        }
    }
}

// ============================================================================
// FONT SET
// ============================================================================

/// The registered font pair plus the metrics extracted from it.
pub struct FontSet {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    regular_metrics: FontMetrics,
    bold_metrics: FontMetrics,
}

impl FontSet {
    /// Read both font files, register them with the document and
    /// extract their metrics. Fails with `ResourceMissing` if either
    /// file is absent or not a parsable TTF.
    pub fn load(doc: &PdfDocumentReference, paths: &FontPaths) -> Result<Self, ReportError> {
        let (regular, regular_metrics) = load_variant(doc, &paths.regular)?;
        let (bold, bold_metrics) = load_variant(doc, &paths.bold)?;
        Ok(FontSet {
            regular,
            bold,
            regular_metrics,
            bold_metrics,
        })
    }

    pub fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    pub fn metrics(&self, bold: bool) -> &FontMetrics {
        if bold {
            &self.bold_metrics
        } else {
            &self.regular_metrics
        }
    }
}

fn load_variant(
    doc: &PdfDocumentReference,
    path: &Path,
) -> Result<(IndirectFontRef, FontMetrics), ReportError> {
    let data = std::fs::read(path).map_err(|e| {
        log::error!("font file unreadable: {}: {}", path.display(), e);
        ReportError::ResourceMissing {
            path: path.to_path_buf(),
        }
    })?;

    let metrics = FontMetrics::from_ttf_bytes(&data).map_err(|e| {
        log::error!("font file invalid: {}: {}", path.display(), e);
        ReportError::ResourceMissing {
            path: path.to_path_buf(),
        }
    })?;

    let font = doc
        .add_external_font(Cursor::new(data))
        .map_err(|e| ReportError::Pdf(format!("font registration failed: {e:?}")))?;

    Ok((font, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_metrics_scale_with_size_and_length() {
        let metrics = FontMetrics::fixed(500);
        // 5 chars at 500/1000 em, 10pt: 5 * 0.5 * 10 = 25pt
        let width = metrics.string_width("Hello", 10.0);
        assert!((width - 25.0).abs() < 0.001);
        assert_eq!(metrics.string_width("", 10.0), 0.0);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(FontMetrics::from_ttf_bytes(&[0u8; 16]).is_err());
        assert!(FontMetrics::from_ttf_bytes(b"not a font at all").is_err());
    }
}
