use std::path::{Component, Path, PathBuf};

use base64::Engine as _;
use rand::{distributions::Alphanumeric, Rng as _};

use crate::error::SheetError;
use crate::validation::{sanitize_text, MAX_TEXT_LENGTH};

/// The placeholder returned in place of the download link when the finished document
/// cannot be read or encoded.
pub const DOWNLOAD_FAILURE_PLACEHOLDER: &str =
    "Falha ao preparar o arquivo para download. Tente gerar a planilha novamente.";

/// A document generated on disk: the absolute path of the file inside its own
/// artifact directory and its length in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub file_path: PathBuf,
    pub byte_length: u64,
}

/// A freshly created, uniquely named directory under the system temporary storage.
/// Every generation request gets its own, so no path is ever shared or reused between
/// requests.
#[derive(Debug)]
pub struct ArtifactDirectory {
    path: PathBuf,
}

impl ArtifactDirectory {
    /// Creates the directory with a randomly generated name.
    pub fn create() -> Result<ArtifactDirectory, SheetError> {
        let path = std::env::temp_dir().join(format!("fieldsheet-{}", random_identifier(16)));
        std::fs::create_dir(&path).map_err(|error| {
            SheetError::generation_with_error(
                format!("Unable to create the artifact directory {:?}", path),
                &error,
            )
        })?;

        Ok(ArtifactDirectory { path })
    }

    /// The path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves the path of a file with the given name inside the directory, verifying
    /// that the name is a plain file name and that the resolved path is still
    /// contained within the resolved directory. The names passed here are randomly
    /// generated and never derived from user input; the check is a second line of
    /// defense against traversal.
    pub fn contained_file_path(&self, file_name: &str) -> Result<PathBuf, SheetError> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(SheetError::path_security(format!(
                    "The file name {:?} is not a plain file name",
                    file_name
                )))
            }
        }

        let resolved_directory = self.path.canonicalize().map_err(|error| {
            SheetError::generation_with_error(
                format!("Unable to resolve the artifact directory {:?}", self.path),
                &error,
            )
        })?;
        let file_path = resolved_directory.join(file_name);
        if !file_path.starts_with(&resolved_directory) {
            return Err(SheetError::path_security(format!(
                "The resolved path {:?} escapes the artifact directory",
                file_path
            )));
        }

        Ok(file_path)
    }

    /// Removes the directory if it is empty, logging instead of failing otherwise.
    pub fn remove_if_empty(&self) {
        remove_directory_if_empty(&self.path);
    }
}

/// Randomly generates an alphanumeric identifier of the given length, used for the
/// artifact directories, the file names and the PDF identifiers.
pub fn random_identifier(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(length)
        .collect()
}

/// Reads a previously generated document and encodes it as a self-contained download
/// payload: a data-URI anchor whose suggested save name is the sanitized
/// `display_name` forced to the `.pdf` extension. Whatever happens, the source file is
/// deleted before this function returns, and its parent directory with it when left
/// empty; the cleanup is held by a guard so that it also runs when reading fails. On
/// failure a user-facing placeholder is returned in place of the link and the reason
/// is logged.
pub fn package_for_download(file_path: &Path, display_name: &str) -> String {
    let _cleanup = CleanupGuard {
        file_path: file_path.to_path_buf(),
    };

    match read_and_encode(file_path, display_name) {
        Ok(payload) => payload,
        Err(error) => {
            log::error!("Failed to package the generated document: {}", error);
            DOWNLOAD_FAILURE_PLACEHOLDER.to_string()
        }
    }
}

/// The fallible part of the packaging: read the file and interpolate it into the
/// download anchor.
fn read_and_encode(file_path: &Path, display_name: &str) -> Result<String, SheetError> {
    let file_content = std::fs::read(file_path).map_err(|error| {
        SheetError::packaging_with_error(
            format!("Unable to read the generated document {:?}", file_path),
            &error,
        )
    })?;
    let encoded_content = base64::engine::general_purpose::STANDARD.encode(&file_content);

    Ok(format!(
        "<a href=\"data:application/pdf;base64,{}\" download=\"{}\">Download</a>",
        encoded_content,
        download_file_name(display_name)
    ))
}

/// Sanitizes a desired display name into a safe suggested save name ending in `.pdf`.
fn download_file_name(display_name: &str) -> String {
    let mut file_name = sanitize_text(display_name, MAX_TEXT_LENGTH);
    if file_name.is_empty() {
        file_name = "planilha_campo".to_string();
    }
    if !file_name.ends_with(".pdf") {
        file_name.push_str(".pdf");
    }

    file_name
}

/// Removes the source file when dropped, and the containing directory when it is left
/// empty. Implemented as a drop guard so that the cleanup runs on every exit path of
/// the packaging.
struct CleanupGuard {
    file_path: PathBuf,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.file_path) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => log::warn!(
                "Unable to remove the temporary file {:?}: {}",
                self.file_path,
                error
            ),
        }
        if let Some(parent_directory) = self.file_path.parent() {
            remove_directory_if_empty(parent_directory);
        }
    }
}

/// Removes a directory only when it exists and contains no entries.
pub(crate) fn remove_directory_if_empty(directory: &Path) {
    let Ok(mut entries) = std::fs::read_dir(directory) else {
        return;
    };
    if entries.next().is_none() {
        if let Err(error) = std::fs::remove_dir(directory) {
            log::warn!(
                "Unable to remove the temporary directory {:?}: {}",
                directory,
                error
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_with_separators_or_parent_components_are_rejected() {
        let directory = ArtifactDirectory::create().unwrap();
        for file_name in ["../escape.pdf", "nested/escape.pdf", "..", "/absolute.pdf"] {
            let error = directory.contained_file_path(file_name).unwrap_err();
            assert!(
                matches!(error, SheetError::PathSecurity { .. }),
                "accepted {:?}",
                file_name
            );
        }
        directory.remove_if_empty();
        assert!(!directory.path().exists());
    }

    #[test]
    fn plain_file_names_resolve_inside_the_directory() {
        let directory = ArtifactDirectory::create().unwrap();
        let file_path = directory.contained_file_path("sheet.pdf").unwrap();
        assert!(file_path.starts_with(directory.path().canonicalize().unwrap()));
        directory.remove_if_empty();
    }

    #[test]
    fn download_file_names_are_sanitized_and_carry_the_extension() {
        assert_eq!(download_file_name("planilha_campo_1.pdf"), "planilha_campo_1.pdf");
        assert_eq!(download_file_name("Lote 7"), "Lote 7.pdf");
        assert_eq!(download_file_name("<->"), "-.pdf");
        assert_eq!(download_file_name(""), "planilha_campo.pdf");
    }

    #[test]
    fn random_identifiers_are_alphanumeric() {
        let identifier = random_identifier(32);
        assert_eq!(identifier.len(), 32);
        assert!(identifier.chars().all(|character| character.is_ascii_alphanumeric()));
    }
}
