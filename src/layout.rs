//! Fixed template geometry.
//!
//! Every quantity that parameterizes drawing lives here: page size,
//! margins, header and band heights, work-item row sizing, the photo
//! grid shape and the font sizes. All values are in PDF points.

// ============================================================================
// UNITS
// ============================================================================

pub const CM: f32 = 28.346_457; // 1 cm in points
pub const PT_TO_MM: f32 = 0.352_777_78;

// A4
pub const PAGE_WIDTH: f32 = 595.275_6;
pub const PAGE_HEIGHT: f32 = 841.889_8;

// ============================================================================
// TEMPLATE CONSTANTS
// ============================================================================

pub const MARGIN_LEFT: f32 = 0.5 * CM;
pub const MARGIN_RIGHT: f32 = 0.5 * CM;
pub const MARGIN_TOP: f32 = 0.5 * CM;
pub const MARGIN_BOTTOM: f32 = 0.5 * CM;

pub const HEADER_HEIGHT: f32 = 1.2 * CM;
/// The right header column holds a 2x2 mini table.
pub const HEADER_TABLE_CELL_HEIGHT: f32 = HEADER_HEIGHT / 2.0;

/// Full-width gray divider bar carrying a centered section label.
pub const BAND_HEIGHT: f32 = 0.6 * CM;

pub const WORKS_TITLE_HEIGHT: f32 = 0.6 * CM;
/// Minimum height of one work-item row.
pub const WORKS_ROW_HEIGHT: f32 = 0.45 * CM;
pub const WORKS_MAX_ROWS: usize = 15;
/// Vertical padding added to the wrapped text height of a row.
pub const WORKS_ROW_PADDING: f32 = 2.0;

pub const PHOTO_GRID_COLS: usize = 2;
pub const PHOTO_GRID_ROWS: usize = 4;
pub const PHOTOS_PER_PAGE: usize = PHOTO_GRID_COLS * PHOTO_GRID_ROWS;
pub const PHOTO_LABEL_HEIGHT: f32 = 0.4 * CM;
pub const PHOTO_PADDING: f32 = 0.05 * CM;

/// Images larger than this on either axis are downscaled before
/// embedding. Grid cells are far smaller than 1200px, so nothing is
/// lost visually and memory stays bounded.
pub const MAX_IMAGE_DIMENSION: u32 = 1200;

pub const FONT_SIZE_TITLE: f32 = 7.0;
pub const FONT_SIZE_HEADER: f32 = 8.0;
pub const FONT_SIZE_NORMAL: f32 = 7.0;
pub const FONT_SIZE_SMALL: f32 = 6.0;
/// Label/value cells of the header mini table.
pub const FONT_SIZE_HEADER_TABLE: f32 = 6.0;

// ============================================================================
// DERIVED GEOMETRY
// ============================================================================

/// Read-only quantities derived from the constants above, computed
/// once per build and never mutated during composition.
#[derive(Debug, Clone)]
pub struct PageGeometry {
    /// Page width minus both margins; every block spans this width.
    pub content_width: f32,
    /// Header columns: logo | project title | report mini table.
    pub header_col1_width: f32,
    pub header_col2_width: f32,
    pub header_col3_width: f32,
    /// Divider bands and the works table share the content width.
    pub band_width: f32,
    /// Max width for wrapped work-item text.
    pub works_text_width: f32,
}

impl PageGeometry {
    pub fn new() -> Self {
        let content_width = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        PageGeometry {
            content_width,
            header_col1_width: content_width * 0.25,
            header_col2_width: content_width * 0.50,
            header_col3_width: content_width * 0.25,
            band_width: content_width,
            works_text_width: content_width - 0.2 * CM,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new()
    }
}
