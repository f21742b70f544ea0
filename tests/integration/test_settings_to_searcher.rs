//! Settings files drive searcher construction.
//!
//! `Settings::load_from` also reads `ES_` environment overrides, so each test
//! clears them first.

use embedsearch::{Searcher, Settings};

use crate::common::{EXPECTED, TestProject, clear_env_overrides, fake_model};

#[test]
fn test_settings_file_builds_working_searcher() {
    clear_env_overrides();
    let project = TestProject::new();
    let index = project.add_fixture_index();

    let config = format!(
        r#"
model_path = "mobilenet.tflite"
index_path = "{}"

[search]
max_results = 3
metadata_allowlist = ["cat", "dog", "bird", "car"]
"#,
        index.display().to_string().replace('\\', "\\\\")
    );
    let config_path = project.add_file(".embedsearch/settings.toml", config.as_bytes());

    let settings = Settings::load_from(&config_path).unwrap();
    let searcher = Searcher::create(settings.to_searcher_options(), fake_model).unwrap();

    let result = searcher.search("burger.jpg").unwrap();
    let labels: Vec<_> = result.iter().map(|n| n.metadata.as_str()).collect();
    let expected: Vec<_> = EXPECTED[1..4].iter().map(|(label, _)| *label).collect();
    assert_eq!(labels, expected);
}

#[test]
fn test_settings_without_index_fail_validation() {
    clear_env_overrides();
    let project = TestProject::new();
    let config_path = project.add_file(
        ".embedsearch/settings.toml",
        b"model_path = \"mobilenet.tflite\"\n",
    );

    let settings = Settings::load_from(&config_path).unwrap();
    let err = match Searcher::create(settings.to_searcher_options(), fake_model) {
        Ok(_) => panic!("index path is not configured"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("`index_file`"));
}
