use serde::{Deserialize, Serialize};

use crate::artifact::package_for_download;
use crate::error::{Field, SheetError};
use crate::sheet::generate_document;

/// The row count the UI pre-fills its number input with.
pub const DEFAULT_ROW_COUNT: usize = 50;

/// The raw, unsanitized values of one form submission, exactly as the UI host
/// collected them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub technician_name: String,
    pub area_label: String,
    pub row_count: String,
}

/// Exactly one of these is surfaced to the end user per submission. Raw errors never
/// appear here: validation failures carry a specific, field-named message, everything
/// else collapses into a generic failure message and is logged server-side only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    /// The sheet was generated; `download_link` is the self-contained download
    /// payload, or the packaging placeholder when the finished file could not be read.
    Ready {
        message: String,
        download_link: String,
    },
    /// The input was rejected before generation.
    Rejected { field: Field, message: String },
    /// Generation failed for an internal reason.
    Failed { message: String },
}

/// Per-session state, owned by the UI host for the lifetime of one user session:
/// a best-effort submission counter with no durability or cross-session aggregation.
/// Initialize at session start, discard at session end.
#[derive(Debug, Default)]
pub struct Session {
    submissions: u32,
}

impl Session {
    /// Creates the state for a fresh session.
    pub fn new() -> Session {
        Session::default()
    }

    /// How many submissions this session has processed so far.
    pub fn submissions(&self) -> u32 {
        self.submissions
    }

    /// Processes one form submission synchronously: validation, generation into an
    /// isolated temporary location, packaging for download and cleanup of the
    /// temporary artifact, returning exactly one user-visible outcome.
    pub fn submit(&mut self, submission: &FormSubmission) -> SubmissionOutcome {
        self.submissions += 1;

        let artifact = match generate_document(
            &submission.technician_name,
            &submission.area_label,
            &submission.row_count,
        ) {
            Ok(artifact) => artifact,
            Err(SheetError::Validation { field, context }) => {
                return SubmissionOutcome::Rejected {
                    field,
                    message: context,
                }
            }
            Err(error) => {
                // The details were already logged at the point of failure
                log::debug!("Submission {} failed: {}", self.submissions, error);
                return SubmissionOutcome::Failed {
                    message: "Não foi possível gerar a planilha de campo. Tente novamente."
                        .to_string(),
                };
            }
        };

        let download_link = package_for_download(&artifact.file_path, "planilha_campo.pdf");

        SubmissionOutcome::Ready {
            message: "Planilha de campo gerada com sucesso.".to_string(),
            download_link,
        }
    }
}
