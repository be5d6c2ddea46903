use fieldsheet::artifact::{package_for_download, ArtifactDirectory, DOWNLOAD_FAILURE_PLACEHOLDER};
use fieldsheet::error::{Field, SheetError};
use fieldsheet::sheet::generate_document;

#[test]
fn generated_artifacts_live_inside_their_own_temporary_directory() {
    let _ = env_logger::builder().is_test(true).try_init();

    let artifact = generate_document("João Silva", "Lote 7", "3").unwrap();
    assert!(artifact.file_path.exists());
    assert_eq!(
        artifact.byte_length,
        std::fs::metadata(&artifact.file_path).unwrap().len()
    );

    // The resolved file path is a descendant of the resolved system temporary storage,
    // one freshly created directory deep
    let temporary_storage = std::env::temp_dir().canonicalize().unwrap();
    let parent_directory = artifact.file_path.parent().unwrap();
    assert!(parent_directory.starts_with(&temporary_storage));
    assert_ne!(parent_directory, temporary_storage);

    // The file on disk is a structurally valid PDF
    lopdf::Document::load(&artifact.file_path).unwrap();

    package_for_download(&artifact.file_path, "planilha_campo.pdf");
    assert!(!artifact.file_path.exists());
}

#[test]
fn packaging_removes_the_file_and_its_emptied_directory() {
    let artifact = generate_document("João Silva", "Lote 7", "2").unwrap();
    let parent_directory = artifact.file_path.parent().unwrap().to_path_buf();

    let payload = package_for_download(&artifact.file_path, "planilha de lote 7");
    assert!(payload.starts_with("<a href=\"data:application/pdf;base64,"));
    assert!(payload.contains("download=\"planilha de lote 7.pdf\""));

    assert!(!artifact.file_path.exists());
    assert!(!parent_directory.exists());
}

#[test]
fn packaging_failures_still_clean_up_and_return_the_placeholder() {
    let directory = ArtifactDirectory::create().unwrap();
    let missing_file = directory.path().join("missing.pdf");

    let payload = package_for_download(&missing_file, "planilha_campo.pdf");
    assert_eq!(payload, DOWNLOAD_FAILURE_PLACEHOLDER);
    assert!(!directory.path().exists());
}

#[test]
fn rejected_input_creates_nothing_on_disk() {
    let error = generate_document("João Silva", "", "3").unwrap_err();
    assert_eq!(error.field(), Some(Field::Area));
    assert!(matches!(error, SheetError::Validation { .. }));
}

#[test]
fn repeated_generation_yields_distinct_artifacts_of_identical_size() {
    let first = generate_document("João Silva", "Lote 7", "10").unwrap();
    let second = generate_document("João Silva", "Lote 7", "10").unwrap();

    assert_ne!(first.file_path, second.file_path);
    assert_eq!(first.byte_length, second.byte_length);

    package_for_download(&first.file_path, "planilha_campo.pdf");
    package_for_download(&second.file_path, "planilha_campo.pdf");
    assert!(!first.file_path.exists());
    assert!(!second.file_path.exists());
}
