use unicode_normalization::UnicodeNormalization as _;

use crate::error::{Field, SheetError};

/// Maximum accepted length, in characters, of the two text inputs.
pub const MAX_TEXT_LENGTH: usize = 100;
/// Lowest accepted row count. A sheet with no blank record rows is useless on the
/// field, so the minimum is 1 and not 0.
pub const MIN_ROW_COUNT: i64 = 1;
/// Highest accepted row count, which bounds the size of the generated document.
pub const MAX_ROW_COUNT: i64 = 2000;

/// Sanitizes an arbitrary piece of user text so that it is safe to embed both in the
/// rendered markup of the download link and in the PDF header, where it is drawn as a
/// literal string. The text is NFC-normalized, truncated to `max_length` characters,
/// stripped of every character outside the allow-list (letters including accented
/// Latin ones, digits, whitespace, `-`, `_` and `.`), escaped for the
/// markup-significant characters and trimmed. This function never fails; empty input
/// yields an empty string.
pub fn sanitize_text(raw: &str, max_length: usize) -> String {
    let truncated: String = raw.nfc().take(max_length).collect();
    let stripped: String = truncated
        .chars()
        .filter(|character| is_allowed_character(*character))
        .collect();

    escape_markup(&stripped).trim().to_string()
}

/// Whether a character belongs to the allow-list for user-supplied text.
fn is_allowed_character(character: char) -> bool {
    character.is_alphanumeric()
        || character.is_whitespace()
        || matches!(character, '-' | '_' | '.')
}

/// Escapes the markup-significant characters of a string to their literal-safe
/// equivalents. After the allow-list stripping this is a no-op, but the escaping is
/// kept as its own guarantee so that the sanitized output stays embeddable in markup
/// even if the allow-list is ever loosened.
pub fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Coerces a raw row-count value into an integer within `[minimum, maximum]`.
/// Returns a validation error naming the row-count field when the coercion fails or
/// the result falls out of bounds.
pub fn validate_row_count(raw: &str, minimum: i64, maximum: i64) -> Result<usize, SheetError> {
    let row_count: i64 = raw.trim().parse().map_err(|_| {
        SheetError::validation(
            Field::RowCount,
            "O número de árvores deve ser um número inteiro.",
        )
    })?;
    if !(minimum..=maximum).contains(&row_count) {
        return Err(SheetError::validation(
            Field::RowCount,
            format!(
                "O número de árvores deve estar entre {} e {}.",
                minimum, maximum
            ),
        ));
    }

    Ok(row_count as usize)
}
