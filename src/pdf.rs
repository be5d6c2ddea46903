use std::{io::BufWriter, mem};

use time::OffsetDateTime;
use unicode_normalization::UnicodeNormalization as _;

use crate::error::SheetError;

/// The number of points in one inch, the unit the PDF specification works in.
pub const POINTS_PER_INCH: f32 = 72.0;

/// The representation of a PDF page: its size in points and the content operations
/// accumulated for it so far.
#[derive(Debug, Clone)]
pub struct PdfPage {
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// The content stream operations of the page, in drawing order.
    pub(crate) operations: Vec<lopdf::content::Operation>,
}

/// This struct represents the actual PDF document on a high-level. It is an interface
/// to the underlying `lopdf::Document` with the addition of the pages and the document
/// identifier.
///
/// The only font of the document is the built-in Type1 Helvetica with
/// `WinAnsiEncoding`, registered as `F1`: the field sheets never need anything outside
/// Latin-1, and not embedding a font program keeps the artifact small. The document
/// identifier, together with the instance identifier passed to `write_all`, ends up in
/// the trailer `ID` tag; callers that pass fixed identifiers obtain byte-identical
/// output for identical content, which is what makes the documents comparable.
pub struct PdfDocument {
    /// The underlying PDF document: this is a low-level interface and shouldn't be
    /// directly interacted with unless strictly necessary, anyway this is why it is
    /// exposed to the user.
    pub inner_document: lopdf::Document,
    /// The identifier of the document, it is used in order to set the PDF `ID` tag.
    pub identifier: String,
    /// The pages of the PDF document.
    pub(crate) pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Create a new `PdfDocument` by defaulting the underlying PDF document to version
    /// 1.5 of the PDF specification and customly specifying the PDF identifier.
    pub fn new(pdf_document_identifier: String) -> Self {
        PdfDocument {
            inner_document: lopdf::Document::with_version("1.5"),
            identifier: pdf_document_identifier,
            pages: Vec::new(),
        }
    }

    /// Adds an empty page of the given width and height in points and returns its
    /// index, to be passed to the drawing functions.
    pub fn add_page(&mut self, page_width: f32, page_height: f32) -> usize {
        self.pages.push(PdfPage {
            width: page_width,
            height: page_height,
            operations: Vec::new(),
        });

        self.pages.len() - 1
    }

    /// Writes the text at the given baseline position, in points from the bottom-left
    /// corner of the page, using the document font at the given size.
    pub fn draw_text(
        &mut self,
        page_index: usize,
        position: [f32; 2],
        font_size: f32,
        text: &str,
    ) -> Result<(), SheetError> {
        use lopdf::content::Operation;

        let encoded_text = encode_win_ansi(text);
        let page = self.page_mut(page_index)?;
        let [x, y] = position;
        page.operations.extend(vec![
            Operation::new("BT", vec![]), // Begin text section
            Operation::new("Tf", vec!["F1".into(), font_size.into()]), // Set the font and the font size
            Operation::new("Td", vec![x.into(), y.into()]), // Set the position where the text begins to be written
            Operation::new(
                "Tj",
                vec![lopdf::Object::String(
                    encoded_text,
                    lopdf::StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]), // End text section
        ]);

        Ok(())
    }

    /// Sets the stroking color to the given gray level and the line width for all the
    /// lines subsequently drawn on the page.
    pub fn set_line_style(
        &mut self,
        page_index: usize,
        gray_level: f32,
        line_width: f32,
    ) -> Result<(), SheetError> {
        use lopdf::content::Operation;

        let page = self.page_mut(page_index)?;
        page.operations.extend(vec![
            Operation::new("G", vec![gray_level.into()]),
            Operation::new("w", vec![line_width.into()]),
        ]);

        Ok(())
    }

    /// Strokes a straight line between the two given positions, in points from the
    /// bottom-left corner of the page.
    pub fn draw_line(
        &mut self,
        page_index: usize,
        from: [f32; 2],
        to: [f32; 2],
    ) -> Result<(), SheetError> {
        use lopdf::content::Operation;

        let page = self.page_mut(page_index)?;
        page.operations.extend(vec![
            Operation::new("m", vec![from[0].into(), from[1].into()]),
            Operation::new("l", vec![to[0].into(), to[1].into()]),
            Operation::new("S", vec![]),
        ]);

        Ok(())
    }

    /// Write the pages and the operations so far specified to the underlying PDF
    /// document and finalize it. This function is to be called exactly once, before
    /// `save_to_bytes`.
    ///
    /// One mandatory argument needed by the PDF specification is the instance ID.
    /// Together with the document identifier it makes up the trailer `ID` tag, so
    /// passing a fixed value here makes the output reproducible.
    pub fn write_all(&mut self, instance_id: String) -> Result<(), SheetError> {
        use lopdf::Object::*;
        use lopdf::StringFormat::*;

        // Construct all the general info that the PDF document needs in order to be
        // parsed correctly and insert it into the PDF document itself. The timestamps
        // are fixed to the epoch so that the identifiers remain the only varying part.
        let document_info = lopdf::Dictionary::from_iter(vec![
            ("Trapped", "False".into()),
            (
                "CreationDate",
                String(
                    to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH).into_bytes(),
                    Literal,
                ),
            ),
            (
                "ModDate",
                String(
                    to_pdf_timestamp_format(&OffsetDateTime::UNIX_EPOCH).into_bytes(),
                    Literal,
                ),
            ),
            (
                "Title",
                String("Planilha de Campo".to_string().into_bytes(), Literal),
            ),
            (
                "Producer",
                String("fieldsheet".to_string().into_bytes(), Literal),
            ),
            (
                "Identifier",
                String(self.identifier.clone().into_bytes(), Literal),
            ),
        ]);
        let document_info_id = self.inner_document.add_object(Dictionary(document_info));

        // The single document font: the built-in Helvetica, no font program embedded
        let font_id = self.inner_document.add_object(lopdf::Dictionary::from_iter(vec![
            ("Type", Name("Font".into())),
            ("Subtype", Name("Type1".into())),
            ("BaseFont", Name("Helvetica".into())),
            ("Encoding", Name("WinAnsiEncoding".into())),
        ]));
        let mut font_dictionary = lopdf::Dictionary::new();
        font_dictionary.set("F1", Reference(font_id));
        let resources_id = self
            .inner_document
            .add_object(lopdf::Dictionary::from_iter(vec![(
                "Font",
                Dictionary(font_dictionary),
            )]));

        // Begin constructing the pages dictionary
        let pages_id = self.inner_document.new_object_id();
        let mut page_ids = Vec::<lopdf::Object>::new();

        // For each page present in the document...
        for page in self.pages.iter_mut() {
            // Encode the accumulated operations into the content stream of the page
            let content = lopdf::content::Content {
                operations: mem::take(&mut page.operations),
            };
            let encoded_content = content.encode().map_err(|error| {
                SheetError::generation_with_error("Failed to encode the page contents", &error)
            })?;
            let content_id = self.inner_document.add_object(
                lopdf::Stream::new(lopdf::Dictionary::new(), encoded_content)
                    .with_compression(false), // Page contents should not be compressed
            );

            // Construct the dictionary which specifies all the page information
            let page_dictionary = lopdf::Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Rotate", Integer(0)),
                (
                    "MediaBox",
                    vec![0.into(), 0.into(), page.width.into(), page.height.into()].into(),
                ),
                ("Parent", Reference(pages_id)),
                ("Contents", Reference(content_id)),
            ]);

            // Inserts the page dictionary into the document and save the associated reference
            let page_id = self.inner_document.add_object(page_dictionary);
            page_ids.push(Reference(page_id));
        }

        // Use all the collected page references in order to set the "Kids" field of the
        // pages dictionary and then insert it into the document itself
        let pages = lopdf::Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Count", Integer(self.pages.len() as i64)),
            ("Kids", page_ids.into()),
            ("Resources", Reference(resources_id)),
        ]);
        self.inner_document
            .objects
            .insert(pages_id, Dictionary(pages));

        // Construct the catalog, required by the PDF specification
        let catalog = lopdf::Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("PageLayout", "OneColumn".into()),
            ("PageMode", "UseNone".into()),
            ("Pages", Reference(pages_id)),
        ]);
        let catalog_id = self.inner_document.add_object(catalog);

        self.inner_document
            .trailer
            .set("Root", Reference(catalog_id));
        self.inner_document
            .trailer
            .set("Info", Reference(document_info_id));
        self.inner_document.trailer.set(
            "ID",
            Array(vec![
                String(self.identifier.clone().into_bytes(), Literal),
                String(instance_id.into_bytes(), Literal),
            ]),
        );

        Ok(())
    }

    /// Save the `PdfDocument` to bytes in order for it to be written to a file or
    /// further processed.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, SheetError> {
        let mut pdf_document_bytes = Vec::new();
        let mut writer = BufWriter::new(&mut pdf_document_bytes);
        self.inner_document.save_to(&mut writer).map_err(|error| {
            SheetError::generation_with_error("Error while saving the PDF document to bytes", &error)
        })?;
        mem::drop(writer);

        Ok(pdf_document_bytes)
    }

    // Retrieve the page at the given page index.
    fn page_mut(&mut self, page_index: usize) -> Result<&mut PdfPage, SheetError> {
        self.pages.get_mut(page_index).ok_or(SheetError::generation(
            format!("Failed to find the page with index {}", page_index),
        ))
    }
}

/// Encodes the text into the `WinAnsiEncoding` byte representation used by the
/// document font. The text is normalized in the NFC form before processing; for the
/// Latin-1 range the WinAnsi code of a character equals its Unicode codepoint.
/// Characters outside the encoding are replaced and logged, non-space whitespace is
/// drawn as a plain space.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.nfc()
        .map(|character| match character as u32 {
            0x20..=0x7E | 0xA0..=0xFF => character as u8,
            _ if character.is_whitespace() => b' ',
            _ => {
                log::warn!(
                    "Unable to represent the character {:?} in the document font",
                    character
                );
                b'?'
            }
        })
        .collect()
}

/// Approximates the rendered width of a string in points, from a coarse table of
/// Helvetica advance widths. This is enough to center the short column labels and to
/// right-align the page-number footer; nothing in the sheet depends on exact metrics.
pub fn approximate_text_width(text: &str, font_size: f32) -> f32 {
    text.nfc().map(character_advance).sum::<f32>() * font_size
}

/// The approximate Helvetica advance of a character, as a fraction of the font size.
fn character_advance(character: char) -> f32 {
    match character {
        ' ' | '.' | ',' | ':' | ';' | '(' | ')' => 0.278,
        'i' | 'j' | 'l' | 'í' | 'ì' => 0.222,
        'f' | 't' | 'r' => 0.333,
        'm' | 'M' | 'W' => 0.889,
        '_' => 0.556,
        character if character.is_uppercase() => 0.722,
        _ => 0.556,
    }
}

/// Formats the given time so that it matches what the PDF specification expects.
/// An example of it is the following: D:20170505150224+02'00'.
fn to_pdf_timestamp_format(date: &OffsetDateTime) -> String {
    let offset = date.offset();
    let offset_sign = if offset.is_negative() { '-' } else { '+' };
    format!(
        "D:{:04}{:02}{:02}{:02}{:02}{:02}{offset_sign}{:02}'{:02}'",
        date.year(),
        u8::from(date.month()),
        date.day(),
        date.hour(),
        date.minute(),
        date.second(),
        offset.whole_hours().abs(),
        offset.minutes_past_hour().abs(),
    )
}
