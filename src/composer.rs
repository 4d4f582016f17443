//! The page composer.
//!
//! One forward pass per document, driven by a vertical cursor that the
//! composer owns exclusively: header block, section bands, work-items
//! table with dynamic row sizing, then the paginated photo grid. The
//! cursor is reset to the top margin whenever a page break is emitted.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::*;

use crate::draw::{
    band_gray, black, draw_box, draw_image_fit, draw_line, draw_text, draw_text_multiline,
    light_gray, rule_gray, Align,
};
use crate::error::ReportError;
use crate::font_metrics::{FontMetrics, FontPaths, FontSet};
use crate::layout::*;
use crate::report::ReportRecord;
use crate::text::{line_height, wrap_text};

const BORDER_WIDTH: f32 = 0.5;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Build one report document at `output_path`.
///
/// Photos are placed eight to a page and paginated for any count; a
/// photo that fails to load degrades to an empty bordered cell and
/// never aborts the build. Missing font files abort before anything
/// is drawn; a missing or empty output file after the drawing pass is
/// reported as `BuildIncomplete`.
pub fn build_report(
    record: &ReportRecord,
    photo_paths: &[PathBuf],
    output_path: &Path,
    logo_path: Option<&Path>,
    font_paths: &FontPaths,
) -> Result<(), ReportError> {
    log::info!(
        "building report {} ({} work items, {} photos)",
        record.report_number,
        record.work_items.len(),
        photo_paths.len()
    );

    let geom = PageGeometry::new();
    let (doc, page1, layer1) = PdfDocument::new(
        "Günlük Faaliyet Raporu",
        Mm(PAGE_WIDTH * PT_TO_MM),
        Mm(PAGE_HEIGHT * PT_TO_MM),
        "Layer 1",
    );

    // Hard precondition: both font files must load before any drawing
    // happens or the output path is touched.
    let fonts = FontSet::load(&doc, font_paths)?;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    let mut cursor = PAGE_HEIGHT - MARGIN_TOP;

    cursor = draw_header(&layer, &fonts, &geom, record, logo_path, cursor);
    cursor = draw_band(&layer, &fonts, &geom, cursor, "GÜNLÜK FAALİYET RAPORU");
    cursor = draw_works_section(&layer, &fonts, &geom, &record.work_items, cursor);
    cursor = draw_band(&layer, &fonts, &geom, cursor, "İMALAT FOTOĞRAFLARI");

    // Photo grid pagination: one iteration per grid page, each filling
    // its grid from the current cursor down to the bottom margin. The
    // page count is exact, so no trailing blank page is ever emitted.
    let mut photo_index = 0;
    for grid_page in 0..grid_page_count(photo_paths.len()) {
        if grid_page > 0 {
            let (page, new_layer) = doc.add_page(
                Mm(PAGE_WIDTH * PT_TO_MM),
                Mm(PAGE_HEIGHT * PT_TO_MM),
                "Layer 1",
            );
            layer = doc.get_page(page).get_layer(new_layer);
            cursor = PAGE_HEIGHT - MARGIN_TOP;
        }

        let cells = photo_grid_cells(&geom, cursor, photo_paths.len() - photo_index);
        for cell in &cells {
            draw_photo_cell(&layer, &fonts, cell, &photo_paths[photo_index], photo_index + 1);
            photo_index += 1;
        }
    }

    let file = fs::File::create(output_path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ReportError::Pdf(format!("{e:?}")))?;

    match fs::metadata(output_path) {
        Ok(meta) if meta.len() > 0 => {
            log::info!("report written: {}", output_path.display());
            Ok(())
        }
        _ => Err(ReportError::BuildIncomplete {
            path: output_path.to_path_buf(),
        }),
    }
}

// ============================================================================
// HEADER PHASE
// ============================================================================

/// Three-column header: logo | wrapped project title | 2x2 report
/// info mini table. Returns the cursor below the header.
fn draw_header(
    layer: &PdfLayerReference,
    fonts: &FontSet,
    geom: &PageGeometry,
    record: &ReportRecord,
    logo_path: Option<&Path>,
    top_y: f32,
) -> f32 {
    let header_bottom = top_y - HEADER_HEIGHT;

    // Left column: logo, contain-fitted with a sliver of padding.
    let col1_x = MARGIN_LEFT;
    draw_box(
        layer,
        col1_x,
        header_bottom,
        geom.header_col1_width,
        HEADER_HEIGHT,
        &black(),
        BORDER_WIDTH,
        None,
    );
    if let Some(logo) = logo_path {
        let pad = 0.1 * CM;
        draw_image_fit(
            layer,
            col1_x + pad,
            header_bottom + pad,
            geom.header_col1_width - 2.0 * pad,
            HEADER_HEIGHT - 2.0 * pad,
            logo,
        );
    }

    // Middle column: project title, wrapped, centered both ways.
    let col2_x = col1_x + geom.header_col1_width;
    draw_box(
        layer,
        col2_x,
        header_bottom,
        geom.header_col2_width,
        HEADER_HEIGHT,
        &black(),
        BORDER_WIDTH,
        None,
    );
    let title_max_width = geom.header_col2_width - 0.3 * CM;
    let lines = wrap_text(
        &record.project_title,
        FONT_SIZE_TITLE,
        title_max_width,
        fonts.metrics(true),
    );
    let leading = FONT_SIZE_TITLE * 1.3;
    let total_text_height = lines.len() as f32 * leading;
    let start_y = header_bottom + HEADER_HEIGHT / 2.0 + total_text_height / 2.0 - leading;
    for (i, line) in lines.iter().enumerate() {
        draw_text(
            layer,
            fonts,
            col2_x + geom.header_col2_width / 2.0,
            start_y - i as f32 * leading,
            line,
            FONT_SIZE_TITLE,
            &black(),
            Align::Center,
            None,
            true,
        );
    }

    // Right column: light-gray 2x2 mini table with report number and
    // date.
    let col3_x = col2_x + geom.header_col2_width;
    draw_box(
        layer,
        col3_x,
        header_bottom,
        geom.header_col3_width,
        HEADER_HEIGHT,
        &black(),
        BORDER_WIDTH,
        Some(&light_gray()),
    );
    let cell_w = geom.header_col3_width / 2.0;
    draw_line(
        layer,
        col3_x + cell_w,
        header_bottom,
        col3_x + cell_w,
        header_bottom + HEADER_HEIGHT,
        &black(),
        BORDER_WIDTH,
    );
    draw_line(
        layer,
        col3_x,
        header_bottom + HEADER_TABLE_CELL_HEIGHT,
        col3_x + geom.header_col3_width,
        header_bottom + HEADER_TABLE_CELL_HEIGHT,
        &black(),
        BORDER_WIDTH,
    );

    let cell_pad = 0.08 * CM;
    let fs = FONT_SIZE_HEADER_TABLE;
    let top_row_y = header_bottom + HEADER_TABLE_CELL_HEIGHT + HEADER_TABLE_CELL_HEIGHT / 2.0 - fs / 3.0;
    let bottom_row_y = header_bottom + HEADER_TABLE_CELL_HEIGHT / 2.0 - fs / 3.0;

    draw_text(
        layer, fonts, col3_x + cell_pad, top_row_y,
        "Günlük Rapor No", fs, &black(), Align::Left, None, false,
    );
    draw_text(
        layer, fonts, col3_x + cell_w + cell_w / 2.0, top_row_y,
        &record.report_number, fs, &black(), Align::Center, None, false,
    );
    draw_text(
        layer, fonts, col3_x + cell_pad, bottom_row_y,
        "Tarih", fs, &black(), Align::Left, None, false,
    );
    draw_text(
        layer, fonts, col3_x + cell_w + cell_w / 2.0, bottom_row_y,
        &record.date, fs, &black(), Align::Center, None, false,
    );

    header_bottom
}

/// Gray divider band with a centered bold label, flush under the
/// previous block.
fn draw_band(
    layer: &PdfLayerReference,
    fonts: &FontSet,
    geom: &PageGeometry,
    top_y: f32,
    label: &str,
) -> f32 {
    let band_y = top_y - BAND_HEIGHT;
    draw_box(
        layer,
        MARGIN_LEFT,
        band_y,
        geom.band_width,
        BAND_HEIGHT,
        &black(),
        BORDER_WIDTH,
        Some(&band_gray()),
    );
    draw_text(
        layer,
        fonts,
        MARGIN_LEFT + geom.band_width / 2.0,
        band_y + BAND_HEIGHT / 2.0 - FONT_SIZE_HEADER / 3.0,
        label,
        FONT_SIZE_HEADER,
        &black(),
        Align::Center,
        None,
        true,
    );
    band_y
}

// ============================================================================
// WORK ITEMS PHASE
// ============================================================================

#[derive(Debug)]
pub(crate) struct WorkRow {
    /// Wrapped display lines, already cut down to what fits `height`.
    pub lines: Vec<String>,
    pub height: f32,
}

#[derive(Debug)]
pub(crate) struct WorkRowsPlan {
    pub rows: Vec<WorkRow>,
    /// Empty lined rows appended after the items.
    pub placeholder_rows: usize,
    /// Items dropped because the row budget was exhausted.
    pub truncated: usize,
}

/// Assign a row height to each work item within the fixed budget of
/// `WORKS_ROW_HEIGHT * WORKS_MAX_ROWS`.
///
/// Rows grow with their wrapped text but never shrink below the
/// minimum row height. The item whose row would overflow the budget
/// gets the exact remaining height with its lines cut to what that
/// height can hold, and everything after it is dropped; leftover
/// budget turns into minimum-height placeholder rows.
pub(crate) fn plan_work_rows(
    items: &[String],
    font_size: f32,
    text_width: f32,
    metrics: &FontMetrics,
) -> WorkRowsPlan {
    let budget = WORKS_ROW_HEIGHT * WORKS_MAX_ROWS as f32;
    let mut rows = Vec::new();
    let mut used = 0.0f32;
    let mut truncated = 0usize;

    for (i, item) in items.iter().enumerate() {
        let text = format!("• {}", item);
        let mut lines = wrap_text(&text, font_size, text_width, metrics);
        let height = (lines.len() as f32 * line_height(font_size) + WORKS_ROW_PADDING)
            .max(WORKS_ROW_HEIGHT);

        if used + height > budget + 0.01 {
            let remaining = budget - used;
            if remaining > 0.5 {
                let drawable = ((remaining - WORKS_ROW_PADDING) / line_height(font_size))
                    .floor()
                    .max(0.0) as usize;
                lines.truncate(drawable);
                rows.push(WorkRow {
                    lines,
                    height: remaining,
                });
                used = budget;
                truncated = items.len() - i - 1;
            } else {
                truncated = items.len() - i;
            }
            break;
        }

        used += height;
        rows.push(WorkRow { lines, height });
    }

    let placeholder_rows = (((budget - used) / WORKS_ROW_HEIGHT) + 1e-4).floor().max(0.0) as usize;

    WorkRowsPlan {
        rows,
        placeholder_rows,
        truncated,
    }
}

/// Works title band, the item rows and the placeholder rows. Returns
/// the cursor below the section.
fn draw_works_section(
    layer: &PdfLayerReference,
    fonts: &FontSet,
    geom: &PageGeometry,
    items: &[String],
    top_y: f32,
) -> f32 {
    let title_y = top_y - WORKS_TITLE_HEIGHT;
    draw_box(
        layer,
        MARGIN_LEFT,
        title_y,
        geom.band_width,
        WORKS_TITLE_HEIGHT,
        &black(),
        BORDER_WIDTH,
        Some(&light_gray()),
    );
    draw_text(
        layer,
        fonts,
        MARGIN_LEFT + 0.1 * CM,
        title_y + WORKS_TITLE_HEIGHT / 2.0 - FONT_SIZE_NORMAL / 3.0,
        "YAPILAN İŞLER:",
        FONT_SIZE_NORMAL,
        &black(),
        Align::Left,
        None,
        true,
    );

    let plan = plan_work_rows(items, FONT_SIZE_NORMAL, geom.works_text_width, fonts.metrics(false));
    if plan.truncated > 0 {
        log::warn!("row budget exhausted, {} work items dropped", plan.truncated);
    }

    let mut row_top = title_y;
    for row in &plan.rows {
        let row_y = row_top - row.height;
        draw_box(
            layer,
            MARGIN_LEFT,
            row_y,
            geom.band_width,
            row.height,
            &black(),
            BORDER_WIDTH,
            None,
        );
        // The plan already wrapped and height-capped the lines, so
        // they pass through without a max width.
        draw_text_multiline(
            layer,
            fonts,
            MARGIN_LEFT + 0.1 * CM,
            row_top - WORKS_ROW_PADDING / 2.0 - FONT_SIZE_NORMAL,
            &row.lines.join("\n"),
            FONT_SIZE_NORMAL,
            &black(),
            Align::Left,
            None,
            false,
        );
        row_top = row_y;
    }

    // Unused budget renders as lined blank rows.
    for _ in 0..plan.placeholder_rows {
        let row_y = row_top - WORKS_ROW_HEIGHT;
        draw_box(
            layer,
            MARGIN_LEFT,
            row_y,
            geom.band_width,
            WORKS_ROW_HEIGHT,
            &black(),
            BORDER_WIDTH,
            None,
        );
        let line_y = row_y + WORKS_ROW_HEIGHT / 2.0;
        draw_line(
            layer,
            MARGIN_LEFT + 0.1 * CM,
            line_y,
            MARGIN_LEFT + geom.band_width - 0.1 * CM,
            line_y,
            &rule_gray(),
            0.3,
        );
        row_top = row_y;
    }

    row_top
}

// ============================================================================
// PHOTO PHASE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PhotoCell {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Cells for one page of the photo grid, row-major from the top left,
/// stopping early when fewer than a full grid of photos remain. Cell
/// height is derived from the space between the cursor and the bottom
/// margin, so first-page grids are shorter than follow-up pages.
pub(crate) fn photo_grid_cells(geom: &PageGeometry, top_y: f32, remaining: usize) -> Vec<PhotoCell> {
    let available_height = top_y - MARGIN_BOTTOM;
    let cell_width = geom.band_width / PHOTO_GRID_COLS as f32;
    let cell_height = (available_height - PHOTO_LABEL_HEIGHT * PHOTO_GRID_ROWS as f32)
        / PHOTO_GRID_ROWS as f32;

    let count = remaining.min(PHOTOS_PER_PAGE);
    let mut cells = Vec::with_capacity(count);
    'grid: for row in 0..PHOTO_GRID_ROWS {
        for col in 0..PHOTO_GRID_COLS {
            if cells.len() == count {
                break 'grid;
            }
            cells.push(PhotoCell {
                x: MARGIN_LEFT + col as f32 * cell_width,
                y: top_y - (row as f32 + 1.0) * cell_height,
                width: cell_width,
                height: cell_height,
            });
        }
    }
    cells
}

/// Pages needed for the photo grid; zero photos means no grid pages.
pub(crate) fn grid_page_count(photo_count: usize) -> usize {
    photo_count.div_ceil(PHOTOS_PER_PAGE)
}

/// One bordered cell: image area above, label strip below. The label
/// index is global across the document, never reset per page.
fn draw_photo_cell(
    layer: &PdfLayerReference,
    fonts: &FontSet,
    cell: &PhotoCell,
    photo_path: &Path,
    label_index: usize,
) {
    draw_box(
        layer,
        cell.x,
        cell.y,
        cell.width,
        cell.height,
        &black(),
        BORDER_WIDTH,
        None,
    );

    let image_height = cell.height - PHOTO_LABEL_HEIGHT - 2.0 * PHOTO_PADDING;
    draw_image_fit(
        layer,
        cell.x + PHOTO_PADDING,
        cell.y + PHOTO_LABEL_HEIGHT + PHOTO_PADDING,
        cell.width - 2.0 * PHOTO_PADDING,
        image_height,
        photo_path,
    );

    draw_box(
        layer,
        cell.x,
        cell.y,
        cell.width,
        PHOTO_LABEL_HEIGHT,
        &black(),
        BORDER_WIDTH,
        None,
    );
    draw_text(
        layer,
        fonts,
        cell.x + cell.width / 2.0,
        cell.y + PHOTO_LABEL_HEIGHT / 2.0 - FONT_SIZE_SMALL / 3.0,
        &format!("FOTO-{}", label_index),
        FONT_SIZE_SMALL,
        &black(),
        Align::Center,
        None,
        false,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::wrapped_height;

    fn metrics() -> FontMetrics {
        FontMetrics::fixed(500)
    }

    fn items(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("is kalemi {i}")).collect()
    }

    const BUDGET: f32 = WORKS_ROW_HEIGHT * WORKS_MAX_ROWS as f32;

    #[test]
    fn no_items_means_all_placeholder_rows() {
        let plan = plan_work_rows(&[], FONT_SIZE_NORMAL, 560.0, &metrics());
        assert!(plan.rows.is_empty());
        assert_eq!(plan.placeholder_rows, WORKS_MAX_ROWS);
        assert_eq!(plan.truncated, 0);
    }

    #[test]
    fn short_items_take_minimum_rows_in_order() {
        let plan = plan_work_rows(&items(4), FONT_SIZE_NORMAL, 560.0, &metrics());
        assert_eq!(plan.rows.len(), 4);
        assert_eq!(plan.truncated, 0);
        assert_eq!(plan.placeholder_rows, WORKS_MAX_ROWS - 4);
        for (i, row) in plan.rows.iter().enumerate() {
            assert_eq!(row.lines, vec![format!("• is kalemi {i}")]);
            assert!((row.height - WORKS_ROW_HEIGHT).abs() < 0.001);
        }
    }

    #[test]
    fn excess_short_items_are_truncated_at_the_budget() {
        let plan = plan_work_rows(&items(20), FONT_SIZE_NORMAL, 560.0, &metrics());
        assert_eq!(plan.rows.len(), WORKS_MAX_ROWS);
        assert_eq!(plan.truncated, 5);
        assert_eq!(plan.placeholder_rows, 0);
        let total: f32 = plan.rows.iter().map(|r| r.height).sum();
        assert!(total <= BUDGET + 0.01);
    }

    #[test]
    fn wrapped_items_grow_their_rows() {
        let long = "uzun aciklama ".repeat(30).trim().to_string();
        let expected = wrapped_height(&format!("• {long}"), FONT_SIZE_NORMAL, 560.0, &metrics())
            + WORKS_ROW_PADDING;
        assert!(expected > WORKS_ROW_HEIGHT, "test item must wrap");

        let plan = plan_work_rows(
            &[long, "kisa".to_string()],
            FONT_SIZE_NORMAL,
            560.0,
            &metrics(),
        );
        assert!((plan.rows[0].height - expected).abs() < 0.001);
        assert!((plan.rows[1].height - WORKS_ROW_HEIGHT).abs() < 0.001);
    }

    #[test]
    fn overflowing_item_is_clipped_to_the_remaining_budget() {
        // Each of these wraps to far more than a third of the budget,
        // so the third row must be clipped and nothing may follow it.
        let long = "cok uzun is aciklamasi ".repeat(60).trim().to_string();
        let one = wrapped_height(&format!("• {long}"), FONT_SIZE_NORMAL, 560.0, &metrics())
            + WORKS_ROW_PADDING;
        assert!(one > BUDGET / 3.0);
        assert!(one < BUDGET / 2.0);

        let four = vec![long.clone(), long.clone(), long.clone(), long];
        let plan = plan_work_rows(&four, FONT_SIZE_NORMAL, 560.0, &metrics());
        assert_eq!(plan.rows.len(), 3);
        assert_eq!(plan.truncated, 1);
        assert_eq!(plan.placeholder_rows, 0);
        let total: f32 = plan.rows.iter().map(|r| r.height).sum();
        assert!((total - BUDGET).abs() < 0.01);
        assert!((plan.rows[2].height - (BUDGET - 2.0 * one)).abs() < 0.01);
    }

    #[test]
    fn clipped_row_text_is_cut_to_fit_its_height() {
        let long = "cok uzun is aciklamasi ".repeat(60).trim().to_string();
        let full_lines =
            wrap_text(&format!("• {long}"), FONT_SIZE_NORMAL, 560.0, &metrics()).len();

        let four = vec![long.clone(), long.clone(), long.clone(), long];
        let plan = plan_work_rows(&four, FONT_SIZE_NORMAL, 560.0, &metrics());

        // The budget-clipped last row must draw fewer lines than the
        // full wrap would produce.
        let clipped = plan.rows.last().unwrap();
        assert!(clipped.lines.len() < full_lines);

        // No row's text may paint past its own box.
        for row in &plan.rows {
            let text_height = row.lines.len() as f32 * line_height(FONT_SIZE_NORMAL);
            assert!(text_height + WORKS_ROW_PADDING <= row.height + 0.01);
        }
    }

    #[test]
    fn grid_page_count_is_ceil_of_eighths() {
        assert_eq!(grid_page_count(0), 0);
        assert_eq!(grid_page_count(1), 1);
        assert_eq!(grid_page_count(8), 1);
        assert_eq!(grid_page_count(9), 2);
        assert_eq!(grid_page_count(10), 2);
        assert_eq!(grid_page_count(16), 2);
        assert_eq!(grid_page_count(17), 3);
    }

    #[test]
    fn full_grid_is_two_by_four() {
        let geom = PageGeometry::new();
        let cells = photo_grid_cells(&geom, PAGE_HEIGHT - MARGIN_TOP, 10);
        assert_eq!(cells.len(), PHOTOS_PER_PAGE);

        // Row-major: first two cells share a y, columns alternate.
        assert!((cells[0].y - cells[1].y).abs() < 0.001);
        assert!((cells[1].x - cells[0].x - cells[0].width).abs() < 0.001);
        assert!((cells[2].x - cells[0].x).abs() < 0.001);
        assert!(cells[2].y < cells[0].y);

        // Everything stays inside the margins.
        for cell in &cells {
            assert!(cell.x >= MARGIN_LEFT - 0.001);
            assert!(cell.x + cell.width <= PAGE_WIDTH - MARGIN_RIGHT + 0.001);
            assert!(cell.y >= MARGIN_BOTTOM - 0.001);
        }
    }

    #[test]
    fn partial_grid_stops_at_the_remaining_count() {
        let geom = PageGeometry::new();
        let cells = photo_grid_cells(&geom, PAGE_HEIGHT - MARGIN_TOP, 3);
        assert_eq!(cells.len(), 3);
        // Third cell starts the second row, left column.
        assert!((cells[2].x - cells[0].x).abs() < 0.001);
    }

    #[test]
    fn first_page_grid_is_shorter_than_a_full_page_grid() {
        let geom = PageGeometry::new();
        let low_cursor = 500.0;
        let short = photo_grid_cells(&geom, low_cursor, 8);
        let tall = photo_grid_cells(&geom, PAGE_HEIGHT - MARGIN_TOP, 8);
        assert!(short[0].height < tall[0].height);
    }
}
