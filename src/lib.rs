//! Fieldsheet is a small library for generating the standardized field sheets
//! ("planilhas de campo") that are mandatory in the check-list of a forest inventory.
//! From three user-supplied values, the name of the responsible technician, the name
//! or code of the surveyed area and the number of trees to be measured, it produces
//! a printable PDF document: a fixed header band on every page and a single table of
//! blank record rows, paginated automatically with the column-header row repeated on
//! every page.
//!
//! The crate is meant to be embedded below a UI host (a web form, typically). The host
//! hands the raw user input to a [`session::Session`] and receives back exactly one
//! outcome: a download payload, a field-named validation message, or a generic failure
//! message. Everything the host must not get wrong, the sanitization of the inputs and
//! the lifecycle of the temporary artifact on disk, is owned by this crate.

/// The module where the user input is sanitized and bounds-checked.
///
/// All three inputs cross this module before they are allowed anywhere near the
/// document or the filesystem: the two text fields go through `sanitize_text`, which
/// strips everything outside a small allow-list and caps the length, and the row count
/// goes through `validate_row_count`, which rejects anything that does not coerce to
/// an integer within bounds. Sanitization happens here once, upstream, because the PDF
/// layer draws the text literally and the download link interpolates the file name
/// into markup; neither of the two escapes anything on its own.
pub mod validation;

/// The module where the field sheet itself is modelled and rendered.
///
/// The entry point is the `FieldSheet` struct, which can only be constructed from
/// input that survived validation, and its `render` method, which lays the sheet out
/// page by page into a `PdfDocument`. The `generate_document` function wraps the whole
/// generation step: it renders the sheet into a freshly created temporary directory
/// and returns the resulting artifact, guaranteeing that no partial file is left
/// behind when anything fails along the way.
pub mod sheet;

/// The module that owns the lifecycle of generated artifacts on disk.
///
/// Every request gets its own uniquely named directory under the system temporary
/// storage, and the output path inside it is derived from a random identifier, never
/// from user input. `package_for_download` converts a finished document into a
/// self-contained download payload and removes the file, and the directory once it is
/// empty, on every exit path.
pub mod artifact;

/// This module contains the `SheetError` type which is the error type used throughout
/// this library.
///
/// The error is a tagged enum rather than a single context string because the callers
/// genuinely branch on the kind: validation failures are surfaced to the end user with
/// the offending field named, while path-security, generation and packaging failures
/// are logged in detail and reach the user only as a generic message. Every variant
/// still carries a human-readable context, and propagated source errors are appended
/// to it when the error is displayed.
pub mod error;

/// The module where the low-level PDF document interface is presented.
///
/// # Disclaimer
///
/// The `PdfDocument` struct is a thin, high-level wrapper around `lopdf`: explicit
/// pages holding lists of content operations, a document information dictionary, and
/// a `save_to_bytes` finalizer. The document identifier and the instance identifier
/// written into the trailer `ID` are supplied by the caller instead of being randomly
/// generated internally, so that rendering the same sheet twice with the same
/// identifiers yields byte-identical output; this is what makes the documents
/// comparable in tests. The sheets only ever need Latin-1 text, so the single font is
/// the built-in Type1 Helvetica with `WinAnsiEncoding` and no font program is
/// embedded.
pub mod pdf;

/// The UI-facing submission flow: a per-session counter and a `submit` call
/// returning exactly one user-visible outcome.
pub mod session;
