//! Full searcher runs against the five-record fixture index.

use std::sync::Arc;
use std::thread;

use embedsearch::{
    BoundingBox, ExternalFile, SearchResult, Searcher, SearcherOptions,
};
use tokio_util::sync::CancellationToken;

use crate::common::{EXPECTED, FakeImageEmbedder, TestProject, fake_model, fixture_index_bytes};

fn assert_expected(result: &SearchResult) {
    assert_eq!(result.len(), EXPECTED.len());
    for (neighbor, (label, distance)) in result.iter().zip(EXPECTED) {
        assert_eq!(neighbor.metadata, label);
        assert!(
            (neighbor.distance - distance).abs() < 1e-6,
            "{label}: got {}, expected {distance}",
            neighbor.distance
        );
    }
}

fn searcher_from_file(project: &TestProject) -> Searcher<FakeImageEmbedder> {
    let index_path = project.add_fixture_index();
    Searcher::create_from_files(project.path().join("mobilenet.tflite"), index_path, fake_model)
        .expect("searcher should build")
}

#[test]
fn test_search_from_index_file() {
    let project = TestProject::new();
    let searcher = searcher_from_file(&project);

    assert_eq!(searcher.index_size(), 5);
    assert_eq!(searcher.dimension().get(), 4);
    assert_eq!(searcher.user_info(), "food and friends, v1");

    let result = searcher.search("burger.jpg").unwrap();
    assert_expected(&result);
}

#[test]
fn test_search_from_index_content() {
    let mut options = SearcherOptions::default();
    options.base_options.model_file = ExternalFile::from_path("mobilenet.tflite");
    options.search_options.index_file = ExternalFile::from_content(fixture_index_bytes());

    let searcher = Searcher::create(options, fake_model).unwrap();
    assert_expected(&searcher.search("burger.jpg").unwrap());
}

#[test]
fn test_empty_index_content_falls_back_to_file_name() {
    let project = TestProject::new();
    let mut options = SearcherOptions::default();
    options.base_options.model_file = ExternalFile::from_path("mobilenet.tflite");
    options.search_options.index_file = ExternalFile {
        file_name: Some(project.add_fixture_index()),
        file_content: Some(Vec::new()),
    };

    let searcher = Searcher::create(options, fake_model).unwrap();
    assert_eq!(searcher.index_size(), 5);
    assert_expected(&searcher.search("burger.jpg").unwrap());
}

#[test]
fn test_repeated_searches_are_identical() {
    let project = TestProject::new();
    let searcher = searcher_from_file(&project);

    let first = searcher.search("burger.jpg").unwrap();
    for _ in 0..5 {
        assert_eq!(searcher.search("burger.jpg").unwrap(), first);
    }
}

#[test]
fn test_max_results_truncates() {
    let project = TestProject::new();
    let mut options = SearcherOptions::from_files("mobilenet.tflite", project.add_fixture_index());
    options.search_options.max_results = 2;

    let searcher = Searcher::create(options, fake_model).unwrap();
    let result = searcher.search("burger.jpg").unwrap();
    let labels: Vec<_> = result.iter().map(|n| n.metadata.as_str()).collect();
    assert_eq!(labels, vec!["burger", "car"]);
}

#[test]
fn test_denylist_skips_records_before_ranking() {
    let project = TestProject::new();
    let mut options = SearcherOptions::from_files("mobilenet.tflite", project.add_fixture_index());
    options.search_options.max_results = 2;
    options.search_options.metadata_denylist = vec!["burger".to_string()];

    let searcher = Searcher::create(options, fake_model).unwrap();
    let result = searcher.search("burger.jpg").unwrap();
    let labels: Vec<_> = result.iter().map(|n| n.metadata.as_str()).collect();
    assert_eq!(labels, vec!["car", "bird"]);
}

#[test]
fn test_l2_normalize_is_scale_invariant() {
    let project = TestProject::new();
    let mut options = SearcherOptions::from_files("mobilenet.tflite", project.add_fixture_index());
    options.embedding_options.l2_normalize = true;

    let searcher = Searcher::create(options, fake_model).unwrap();
    let plain = searcher.search("burger.jpg").unwrap();
    let bright = searcher.search("burger_bright.jpg").unwrap();

    assert_eq!(plain.len(), 5);
    for (a, b) in plain.iter().zip(bright.iter()) {
        assert_eq!(a.metadata, b.metadata);
        assert!((a.distance - b.distance).abs() < 1e-3);
    }
}

#[test]
fn test_region_of_interest_reaches_provider() {
    let project = TestProject::new();
    let searcher = searcher_from_file(&project);

    let roi = BoundingBox::new(10, 20, 64, 48).unwrap();
    let result = searcher.search_with_roi("burger.jpg", roi).unwrap();
    assert_expected(&result);
    assert_eq!(*searcher.provider().last_roi.lock().unwrap(), Some(roi));

    searcher.search("burger.jpg").unwrap();
    assert_eq!(*searcher.provider().last_roi.lock().unwrap(), None);
}

#[test]
fn test_shared_across_threads() {
    let project = TestProject::new();
    let searcher = Arc::new(searcher_from_file(&project));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let searcher = Arc::clone(&searcher);
            thread::spawn(move || searcher.search("burger.jpg").unwrap())
        })
        .collect();

    for handle in handles {
        assert_expected(&handle.join().unwrap());
    }
}

#[test]
fn test_cancelled_search_returns_no_partial_result() {
    let project = TestProject::new();
    let searcher = searcher_from_file(&project);

    let token = CancellationToken::new();
    token.cancel();
    let err = searcher
        .search_with_cancellation("burger.jpg", &token)
        .unwrap_err();
    assert_eq!(err.status_code(), "CANCELLED");

    let live = CancellationToken::new();
    assert_expected(&searcher.search_with_cancellation("burger.jpg", &live).unwrap());
}
