use serde::{Deserialize, Serialize};

/// The user input a validation failure refers to. Its display form is the
/// user-facing (Portuguese) name of the form field.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Technician,
    Area,
    RowCount,
}

impl std::fmt::Display for Field {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Technician => write!(formatter, "responsável técnico"),
            Field::Area => write!(formatter, "área"),
            Field::RowCount => write!(formatter, "número de árvores"),
        }
    }
}

/// The error type used throughout this library. Each variant carries a context and,
/// where an underlying operation failed, the propagated source error as a string.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum SheetError {
    /// The user input was rejected before generation. The context is a specific,
    /// user-facing message for the named field.
    Validation { field: Field, context: String },
    /// A resolved output path escaped the temporary directory created for it.
    PathSecurity { context: String },
    /// A failure while building or writing the document.
    Generation {
        context: String,
        source_error: Option<String>,
    },
    /// A failure while reading or encoding the finished document for download.
    Packaging {
        context: String,
        source_error: Option<String>,
    },
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::Validation { context, .. } => write!(formatter, "{}", context),
            SheetError::PathSecurity { context } => write!(formatter, "{}", context),
            SheetError::Generation {
                context,
                source_error,
            }
            | SheetError::Packaging {
                context,
                source_error,
            } => match source_error {
                Some(source_error) => write!(
                    formatter,
                    "{}: {}",
                    context,
                    minimize_first_letter(source_error.to_string()),
                ),
                None => write!(formatter, "{}", context),
            },
        }
    }
}

impl std::error::Error for SheetError {}

impl SheetError {
    /// Create a new validation error for the given field with the given user-facing context.
    pub fn validation<S: Into<String>>(field: Field, context: S) -> SheetError {
        SheetError::Validation {
            field,
            context: context.into(),
        }
    }

    /// Create a new path-security error with the given context.
    pub fn path_security<S: Into<String>>(context: S) -> SheetError {
        SheetError::PathSecurity {
            context: context.into(),
        }
    }

    /// Create a new generation error with the given context.
    pub fn generation<S: Into<String>>(context: S) -> SheetError {
        SheetError::Generation {
            context: context.into(),
            source_error: None,
        }
    }

    /// Create a new generation error with the given context and source error.
    pub fn generation_with_error<S: Into<String>>(
        context: S,
        error: &dyn std::error::Error,
    ) -> SheetError {
        SheetError::Generation {
            context: context.into(),
            source_error: Some(error.to_string()),
        }
    }

    /// Create a new packaging error with the given context and source error.
    pub fn packaging_with_error<S: Into<String>>(
        context: S,
        error: &dyn std::error::Error,
    ) -> SheetError {
        SheetError::Packaging {
            context: context.into(),
            source_error: Some(error.to_string()),
        }
    }

    /// The field a validation error refers to, if this is one.
    pub fn field(&self) -> Option<Field> {
        match self {
            SheetError::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Minimizes the first letter of a string, it is used for standardizing the error message.
fn minimize_first_letter(string: String) -> String {
    let mut characters = string.chars();
    match characters.next() {
        None => String::new(),
        Some(character) => character.to_lowercase().chain(characters).collect(),
    }
}
