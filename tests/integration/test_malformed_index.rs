//! Every flavor of broken index is rejected with an invalid-index error.

use embedsearch::{ErrorKind, ExternalFile, IndexStore, SearchError, Searcher, SearcherOptions};

use crate::common::{TestProject, encode_index, fake_model, fixture_index_bytes};

fn load_err(bytes: &[u8]) -> SearchError {
    IndexStore::load(bytes).expect_err("index should be rejected")
}

#[test]
fn test_malformed_variants() {
    let good = fixture_index_bytes();

    let mut bad_magic = good.clone();
    bad_magic[..4].copy_from_slice(b"JUNK");

    let mut bad_version = good.clone();
    bad_version[4..8].copy_from_slice(&2u32.to_le_bytes());

    let mut bad_metric = good.clone();
    bad_metric[16..20].copy_from_slice(&9u32.to_le_bytes());

    let mut trailing = good.clone();
    trailing.extend_from_slice(&[0, 0, 0, 0]);

    let mut bad_utf8 = encode_index(1, 0, "", &[("ab", vec![1.0])]);
    let label_at = bad_utf8.len() - 4 - 4 - 2;
    bad_utf8[label_at] = 0xff;

    let variants: Vec<(&str, Vec<u8>)> = vec![
        ("empty", Vec::new()),
        ("short header", good[..10].to_vec()),
        ("bad magic", bad_magic),
        ("unsupported version", bad_version),
        ("unknown metric", bad_metric),
        ("zero dimension", encode_index(0, 0, "", &[("cat", Vec::new())])),
        ("no records", encode_index(4, 0, "", &[])),
        ("truncated record", good[..good.len() - 3].to_vec()),
        ("trailing bytes", trailing),
        (
            "inconsistent dimensions",
            encode_index(2, 0, "", &[("a", vec![1.0, 2.0]), ("b", vec![1.0, 2.0, 3.0])]),
        ),
        ("non-finite value", encode_index(1, 0, "", &[("a", vec![f32::INFINITY])])),
        ("invalid utf-8 metadata", bad_utf8),
    ];

    for (name, bytes) in variants {
        let err = load_err(&bytes);
        assert_eq!(err.kind(), ErrorKind::InvalidIndex, "{name}: {err}");
        assert!(err.to_string().starts_with("INVALID_ARGUMENT: "), "{name}: {err}");
    }
}

#[test]
fn test_truncated_index_file_fails_searcher_creation() {
    let project = TestProject::new();
    let good = fixture_index_bytes();
    let index = project.add_file("truncated.ldb", &good[..good.len() / 2]);

    let err = match Searcher::create(
        SearcherOptions::from_files("mobilenet.tflite", index),
        fake_model,
    ) {
        Ok(_) => panic!("truncated index should be rejected"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::InvalidIndex);
}

#[test]
fn test_empty_index_content_is_reported_as_missing() {
    let mut options = SearcherOptions::default();
    options.base_options.model_file = ExternalFile::from_path("mobilenet.tflite");
    options.search_options.index_file = ExternalFile::from_content(Vec::new());

    let err = match Searcher::create(options, fake_model) {
        Ok(_) => panic!("empty index content should be rejected"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("`index_file`"));
}
