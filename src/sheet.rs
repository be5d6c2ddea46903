use serde::Serialize;

use crate::artifact::{random_identifier, ArtifactDirectory, GeneratedArtifact};
use crate::error::{Field, SheetError};
use crate::pdf::{approximate_text_width, PdfDocument, POINTS_PER_INCH};
use crate::validation::{
    sanitize_text, validate_row_count, MAX_ROW_COUNT, MAX_TEXT_LENGTH, MIN_ROW_COUNT,
};

/// ISO A4 page size in points.
pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

/// The constant title drawn on the header band of every page.
pub const SHEET_TITLE: &str = "PLANILHA DE CAMPO - INVENTÁRIO FLORESTAL";

/// The fixed column-header labels of the table. These strings are part of the paper
/// workflow of the organization and must match exactly.
pub const COLUMN_LABELS: [&str; 6] = ["P", "n", "Espécie", "CAP", "h", "Obs"];

/// The fixed column widths in points: 0.5", 0.5", 2", 1.5", 0.5", 1.5".
pub const COLUMN_WIDTHS: [f32; 6] = [
    0.5 * POINTS_PER_INCH,
    0.5 * POINTS_PER_INCH,
    2.0 * POINTS_PER_INCH,
    1.5 * POINTS_PER_INCH,
    0.5 * POINTS_PER_INCH,
    1.5 * POINTS_PER_INCH,
];

/// The columns whose contents are center-aligned (`Espécie`, `CAP`, `h`).
const CENTERED_COLUMNS: std::ops::Range<usize> = 2..5;

/// Display limits, in characters, of the technician name and the area label on the
/// header band. These are narrower than the general input cap so that the band lines
/// never overrun their neighbours.
pub const TECHNICIAN_DISPLAY_LIMIT: usize = 40;
pub const AREA_DISPLAY_LIMIT: usize = 50;

// Vertical extent of the table region and the height of one table row, in points.
const TABLE_TOP: f32 = 730.0;
const TABLE_BOTTOM: f32 = 72.0;
const ROW_HEIGHT: f32 = 18.0;

const BAND_FONT_SIZE: f32 = 12.0;
const TABLE_FONT_SIZE: f32 = 10.0;
const GRID_GRAY_LEVEL: f32 = 0.5;
const GRID_LINE_WIDTH: f32 = 0.25;
const CELL_PADDING: f32 = 4.0;

/// A validated form request: the sanitized technician name, the sanitized area label
/// and the bounded row count. Constructed fresh per user submission and never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSheet {
    technician: String,
    area: String,
    row_count: usize,
}

impl FieldSheet {
    /// Validates the three raw inputs into a `FieldSheet`. The text fields are
    /// sanitized and must be non-empty afterwards; the row count must coerce to an
    /// integer within bounds. The returned errors name the offending field.
    pub fn new(
        technician_name: &str,
        area_label: &str,
        row_count: &str,
    ) -> Result<FieldSheet, SheetError> {
        let technician = sanitize_text(technician_name, MAX_TEXT_LENGTH);
        if technician.is_empty() {
            return Err(SheetError::validation(
                Field::Technician,
                "Informe o nome do responsável técnico pelo levantamento.",
            ));
        }
        let area = sanitize_text(area_label, MAX_TEXT_LENGTH);
        if area.is_empty() {
            return Err(SheetError::validation(
                Field::Area,
                "Informe o nome ou código da área do inventário.",
            ));
        }
        let row_count = validate_row_count(row_count, MIN_ROW_COUNT, MAX_ROW_COUNT)?;

        Ok(FieldSheet {
            technician,
            area,
            row_count,
        })
    }

    /// The sanitized technician name.
    pub fn technician(&self) -> &str {
        &self.technician
    }

    /// The sanitized area label.
    pub fn area(&self) -> &str {
        &self.area
    }

    /// The number of blank record rows the sheet will contain.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Lays the sheet out into a `PdfDocument`, one physical page per chunk of rows:
    /// the header band and the page-number footer on every page, then the table with
    /// the column-header row repeated at the top of every page.
    pub fn render(&self, document_identifier: String) -> Result<PdfDocument, SheetError> {
        let mut document = PdfDocument::new(document_identifier);
        for (page_number, data_rows) in paginate(self.row_count).into_iter().enumerate() {
            let page_index = document.add_page(A4_WIDTH, A4_HEIGHT);
            self.draw_header_band(&mut document, page_index, page_number + 1)?;
            draw_table(&mut document, page_index, data_rows)?;
        }

        Ok(document)
    }

    /// Draws the fixed header band and the right-aligned page-number footer.
    fn draw_header_band(
        &self,
        document: &mut PdfDocument,
        page_index: usize,
        page_number: usize,
    ) -> Result<(), SheetError> {
        let area: String = self.area.chars().take(AREA_DISPLAY_LIMIT).collect();
        let technician: String = self
            .technician
            .chars()
            .take(TECHNICIAN_DISPLAY_LIMIT)
            .collect();

        document.draw_text(page_index, [165.0, 800.0], BAND_FONT_SIZE, SHEET_TITLE)?;
        document.draw_text(
            page_index,
            [63.0, 765.0],
            BAND_FONT_SIZE,
            &format!("ÁREA: {}", area),
        )?;
        document.draw_text(
            page_index,
            [410.0, 765.0],
            BAND_FONT_SIZE,
            "DATA:_____________",
        )?;
        document.draw_text(
            page_index,
            [63.0, 745.0],
            BAND_FONT_SIZE,
            &format!("RESPONSÁVEL: {}", technician),
        )?;
        document.draw_text(
            page_index,
            [290.0, 745.0],
            BAND_FONT_SIZE,
            "EQUIPE:_____________________________",
        )?;

        let footer = format!("Página {}", page_number);
        document.draw_text(
            page_index,
            [
                530.0 - approximate_text_width(&footer, BAND_FONT_SIZE),
                30.0,
            ],
            BAND_FONT_SIZE,
            &footer,
        )?;

        Ok(())
    }
}

/// The total width of the table in points.
pub fn table_width() -> f32 {
    COLUMN_WIDTHS.iter().sum()
}

/// How many blank record rows fit on one physical page, leaving room for the repeated
/// column-header row.
pub fn data_rows_per_page() -> usize {
    ((TABLE_TOP - TABLE_BOTTOM) / ROW_HEIGHT) as usize - 1
}

/// Splits a total row count into the per-page chunks of the rendered table.
pub fn paginate(row_count: usize) -> Vec<usize> {
    let capacity = data_rows_per_page();
    let mut pages = Vec::new();
    let mut remaining_rows = row_count;
    while remaining_rows > capacity {
        pages.push(capacity);
        remaining_rows -= capacity;
    }
    pages.push(remaining_rows);

    pages
}

/// Draws one page worth of the table: the thin gray grid for the column-header row
/// plus `data_rows` blank rows, and the column labels. The blank cells carry no
/// content operations at all, they exist only as grid.
fn draw_table(
    document: &mut PdfDocument,
    page_index: usize,
    data_rows: usize,
) -> Result<(), SheetError> {
    let grid_rows = data_rows + 1;
    let table_left = (A4_WIDTH - table_width()) / 2.0;
    let table_right = table_left + table_width();
    let table_bottom = TABLE_TOP - grid_rows as f32 * ROW_HEIGHT;

    document.set_line_style(page_index, GRID_GRAY_LEVEL, GRID_LINE_WIDTH)?;

    // Horizontal rules, one per row boundary
    for row in 0..=grid_rows {
        let y = TABLE_TOP - row as f32 * ROW_HEIGHT;
        document.draw_line(page_index, [table_left, y], [table_right, y])?;
    }

    // Vertical rules, one per column boundary
    let mut x = table_left;
    document.draw_line(page_index, [x, TABLE_TOP], [x, table_bottom])?;
    for column_width in COLUMN_WIDTHS {
        x += column_width;
        document.draw_line(page_index, [x, TABLE_TOP], [x, table_bottom])?;
    }

    // Column labels on the header row
    let label_baseline = TABLE_TOP - ROW_HEIGHT + 5.0;
    let mut cell_left = table_left;
    for (column, (label, column_width)) in COLUMN_LABELS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let label_x = if CENTERED_COLUMNS.contains(&column) {
            cell_left + (column_width - approximate_text_width(label, TABLE_FONT_SIZE)) / 2.0
        } else {
            cell_left + CELL_PADDING
        };
        document.draw_text(page_index, [label_x, label_baseline], TABLE_FONT_SIZE, label)?;
        cell_left += column_width;
    }

    Ok(())
}

/// Generates the field sheet document for the given raw inputs into a freshly created
/// temporary directory and returns the resulting artifact.
///
/// The inputs cross the validator first; nothing touches the filesystem when they are
/// rejected. The output path is built from a random identifier inside the request's
/// own directory and verified to be contained in it. When anything fails after the
/// directory exists, the partial file and the directory are removed before the error
/// propagates; the failure is logged with the row count and the error, never with the
/// user text.
pub fn generate_document(
    technician_name: &str,
    area_label: &str,
    row_count: &str,
) -> Result<GeneratedArtifact, SheetError> {
    let sheet = FieldSheet::new(technician_name, area_label, row_count)?;

    let directory = ArtifactDirectory::create()?;
    let file_name = format!("planilha_campo_{}.pdf", random_identifier(12));
    let generation_result: Result<GeneratedArtifact, SheetError> = (|| {
        let file_path = directory.contained_file_path(&file_name)?;
        let mut document = sheet.render(random_identifier(32))?;
        document.write_all(random_identifier(32))?;
        let document_bytes = document.save_to_bytes()?;
        std::fs::write(&file_path, &document_bytes).map_err(|error| {
            SheetError::generation_with_error(
                format!("Unable to write the generated document {:?}", file_path),
                &error,
            )
        })?;

        Ok(GeneratedArtifact {
            file_path,
            byte_length: document_bytes.len() as u64,
        })
    })();

    match generation_result {
        Ok(artifact) => {
            log::info!(
                "Generated a field sheet with {} data rows ({} bytes)",
                sheet.row_count(),
                artifact.byte_length
            );
            Ok(artifact)
        }
        Err(error) => {
            log::error!(
                "Failed to generate a field sheet with {} data rows: {}",
                sheet.row_count(),
                error
            );
            let partial_file = directory.path().join(&file_name);
            if partial_file.exists() {
                if let Err(removal_error) = std::fs::remove_file(&partial_file) {
                    log::warn!(
                        "Unable to remove the partial document {:?}: {}",
                        partial_file,
                        removal_error
                    );
                }
            }
            directory.remove_if_empty();
            Err(error)
        }
    }
}
