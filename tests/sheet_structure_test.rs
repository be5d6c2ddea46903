use lopdf::content::Content;
use lopdf::Object;

use fieldsheet::pdf::encode_win_ansi;
use fieldsheet::sheet::{data_rows_per_page, FieldSheet, COLUMN_LABELS};

/// The number of text operations drawn on every physical page besides the table
/// contents: the five header band strings and the page-number footer.
const BAND_TEXTS_PER_PAGE: usize = 6;
/// The number of vertical grid rules of the six-column table.
const VERTICAL_RULES: usize = 7;

fn render_to_bytes(
    technician: &str,
    area: &str,
    row_count: &str,
    document_identifier: &str,
    instance_identifier: &str,
) -> Vec<u8> {
    let sheet = FieldSheet::new(technician, area, row_count).unwrap();
    let mut document = sheet.render(document_identifier.to_string()).unwrap();
    document.write_all(instance_identifier.to_string()).unwrap();
    document.save_to_bytes().unwrap()
}

fn page_operations(document_bytes: &[u8]) -> Vec<Vec<lopdf::content::Operation>> {
    let document = lopdf::Document::load_mem(document_bytes).unwrap();
    document
        .get_pages()
        .values()
        .map(|page_id| {
            let content = document.get_page_content(*page_id).unwrap();
            Content::decode(&content).unwrap().operations
        })
        .collect()
}

fn text_strings(operations: &[lopdf::content::Operation]) -> Vec<Vec<u8>> {
    operations
        .iter()
        .filter(|operation| operation.operator == "Tj")
        .filter_map(|operation| match operation.operands.first() {
            Some(Object::String(bytes, _)) => Some(bytes.clone()),
            _ => None,
        })
        .collect()
}

fn data_rows_on_page(operations: &[lopdf::content::Operation]) -> usize {
    // Each page strokes one horizontal rule per row boundary (data rows + header row
    // + 1) and one vertical rule per column boundary, each as a single m/l/S triple.
    let stroked_lines = operations
        .iter()
        .filter(|operation| operation.operator == "l")
        .count();
    stroked_lines - VERTICAL_RULES - 2
}

#[test]
fn a_three_row_sheet_renders_one_page_with_the_expected_structure() {
    let _ = env_logger::builder().is_test(true).try_init();

    let document_bytes = render_to_bytes("João Silva", "Lote 7", "3", "doc", "instance");
    let pages = page_operations(&document_bytes);
    assert_eq!(pages.len(), 1);

    // One header row plus exactly three blank record rows
    assert_eq!(data_rows_on_page(&pages[0]), 3);

    // The band texts, the footer and the six column labels are the only texts drawn
    let texts = text_strings(&pages[0]);
    assert_eq!(texts.len(), BAND_TEXTS_PER_PAGE + COLUMN_LABELS.len());
    assert!(texts.contains(&encode_win_ansi("ÁREA: Lote 7")));
    assert!(texts.contains(&encode_win_ansi("RESPONSÁVEL: João Silva")));
    assert!(texts.contains(&encode_win_ansi("PLANILHA DE CAMPO - INVENTÁRIO FLORESTAL")));
    assert!(texts.contains(&encode_win_ansi("Página 1")));
    for label in COLUMN_LABELS {
        assert!(texts.contains(&encode_win_ansi(label)), "missing label {:?}", label);
    }
}

#[test]
fn the_table_spills_over_with_the_header_row_repeated_on_every_page() {
    let row_count = data_rows_per_page() + 1;
    let document_bytes = render_to_bytes(
        "João Silva",
        "Lote 7",
        &row_count.to_string(),
        "doc",
        "instance",
    );
    let pages = page_operations(&document_bytes);
    assert_eq!(pages.len(), 2);

    assert_eq!(data_rows_on_page(&pages[0]), data_rows_per_page());
    assert_eq!(data_rows_on_page(&pages[1]), 1);

    // Every physical page carries the full band, its own footer and all six labels
    for (page_number, operations) in pages.iter().enumerate() {
        let texts = text_strings(operations);
        assert_eq!(texts.len(), BAND_TEXTS_PER_PAGE + COLUMN_LABELS.len());
        assert!(texts.contains(&encode_win_ansi(&format!("Página {}", page_number + 1))));
        for label in COLUMN_LABELS {
            assert!(texts.contains(&encode_win_ansi(label)));
        }
    }
}

#[test]
fn the_total_number_of_blank_rows_matches_the_requested_row_count() {
    for row_count in [1usize, 35, 36, 90, 200] {
        let document_bytes = render_to_bytes(
            "João Silva",
            "Lote 7",
            &row_count.to_string(),
            "doc",
            "instance",
        );
        let pages = page_operations(&document_bytes);
        let total_rows: usize = pages.iter().map(|page| data_rows_on_page(page)).sum();
        assert_eq!(total_rows, row_count, "wrong total for {} rows", row_count);
    }
}

#[test]
fn identical_inputs_and_identifiers_render_byte_identical_documents() {
    let first = render_to_bytes("João Silva", "Lote 7", "40", "doc", "instance");
    let second = render_to_bytes("João Silva", "Lote 7", "40", "doc", "instance");
    similar_asserts::assert_eq!(first, second);
}

#[test]
fn the_header_band_shows_the_display_truncated_inputs() {
    let long_area = "A".repeat(80);
    let document_bytes = render_to_bytes("João Silva", &long_area, "1", "doc", "instance");
    let pages = page_operations(&document_bytes);

    let expected_area = format!("ÁREA: {}", "A".repeat(50));
    let texts = text_strings(&pages[0]);
    assert!(texts.contains(&encode_win_ansi(&expected_area)));
}
