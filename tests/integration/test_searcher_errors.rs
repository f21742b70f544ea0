//! Construction and search failures, with their exact messages.

use embedsearch::{ErrorKind, ExternalFile, SearchError, Searcher, SearcherOptions};

use crate::common::{
    FakeImageEmbedder, TestProject, encode_index, fake_model, strict_fake_model,
};

fn create(options: SearcherOptions) -> Result<Searcher<FakeImageEmbedder>, SearchError> {
    Searcher::create(options, fake_model)
}

fn create_err(options: SearcherOptions) -> SearchError {
    match create(options) {
        Ok(_) => panic!("searcher creation should fail"),
        Err(e) => e,
    }
}

fn valid_options(project: &TestProject) -> SearcherOptions {
    SearcherOptions::from_files("mobilenet.tflite", project.add_fixture_index())
}

#[test]
fn test_missing_model_file() {
    let project = TestProject::new();
    let mut options = valid_options(&project);
    options.base_options.model_file = ExternalFile::default();

    let err = create_err(options);
    assert_eq!(
        err.to_string(),
        "INVALID_ARGUMENT: Missing mandatory `model_file` field in `base_options`"
    );
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_missing_index_file() {
    let mut options = SearcherOptions::default();
    options.base_options.model_file = ExternalFile::from_path("mobilenet.tflite");

    let err = create_err(options);
    assert_eq!(
        err.to_string(),
        "INVALID_ARGUMENT: Missing mandatory `index_file` field in `search_options`"
    );
}

#[test]
fn test_quantize_not_allowed() {
    let project = TestProject::new();
    let mut options = valid_options(&project);
    options.embedding_options.quantize = true;

    let err = create_err(options);
    assert_eq!(
        err.to_string(),
        "INVALID_ARGUMENT: Setting EmbeddingOptions.quantize = true is not allowed in searchers."
    );
}

#[test]
fn test_allowlist_and_denylist_are_exclusive() {
    let project = TestProject::new();
    let mut options = valid_options(&project);
    options.search_options.metadata_allowlist = vec!["burger".to_string()];
    options.search_options.metadata_denylist = vec!["cat".to_string()];

    let err = create_err(options);
    assert!(err.to_string().contains("mutually exclusive options"));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_zero_max_results() {
    let project = TestProject::new();
    let mut options = valid_options(&project);
    options.search_options.max_results = 0;

    let err = create_err(options);
    assert!(err.to_string().contains("value must be != 0"));
}

#[test]
fn test_missing_index_on_disk() {
    let project = TestProject::new();
    let options =
        SearcherOptions::from_files("mobilenet.tflite", project.path().join("absent.ldb"));

    let err = create_err(options);
    assert_eq!(err.kind(), ErrorKind::InvalidIndex);
    assert_eq!(err.status_code(), "NOT_FOUND");
    assert!(err.to_string().contains("absent.ldb"));
}

#[test]
fn test_model_load_failure_propagates() {
    let project = TestProject::new();
    let options = valid_options(&project);

    let err = match Searcher::create(options, strict_fake_model) {
        Ok(_) => panic!("model file does not exist"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::Embedding);

    let model = project.add_file("mobilenet.tflite", b"weights");
    let mut options = valid_options(&project);
    options.base_options.model_file = ExternalFile::from_path(model);
    assert!(Searcher::create(options, strict_fake_model).is_ok());
}

#[test]
fn test_provider_dimension_differs_from_index() {
    let project = TestProject::new();
    let index = project.add_file(
        "three_dims.ldb",
        &encode_index(3, 0, "", &[("cat", vec![1.0, 2.0, 3.0])]),
    );

    let err = create_err(SearcherOptions::from_files("mobilenet.tflite", index));
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    assert!(err.to_string().contains("expected 3, got 4"));
}

#[test]
fn test_search_failures_return_no_result() {
    let project = TestProject::new();
    let searcher = create(valid_options(&project)).unwrap();

    let err = searcher.search("unknown.jpg").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Embedding);
    assert!(err.to_string().contains("unknown.jpg"));

    let err = searcher.search("thumbnail.jpg").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
}
