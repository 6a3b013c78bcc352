//! Test: settings file and environment layering
//!
//! Environment variables are process-wide, so every override lives in this
//! single test to keep parallel tests from seeing each other's values.

use corpus_search::Settings;
use corpus_search::service::ServiceOptions;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_env_overrides_file_values() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("settings.toml");
    std::fs::write(
        &config_path,
        r#"
[corpus]
path = "from_file.csv"
text_column = "Description"

[search]
default_k = 3
"#,
    )
    .unwrap();

    // SAFETY: no other test in this binary reads or writes CS_ variables
    unsafe {
        std::env::set_var("CS_SEARCH__DEFAULT_K", "5");
        std::env::set_var("CS_EMBEDDING__TIMEOUT_MS", "1500");
    }
    let loaded = Settings::load_from(&config_path);
    unsafe {
        std::env::remove_var("CS_SEARCH__DEFAULT_K");
        std::env::remove_var("CS_EMBEDDING__TIMEOUT_MS");
    }

    let settings = loaded.expect("settings should load");
    // File beats defaults
    assert_eq!(settings.corpus.path, PathBuf::from("from_file.csv"));
    assert_eq!(settings.corpus.text_column, "Description");
    // Environment beats file
    assert_eq!(settings.search.default_k, 5);
    assert_eq!(settings.embedding.timeout(), Duration::from_millis(1500));

    let options = ServiceOptions::from_settings(&settings);
    assert_eq!(options.default_k, 5);
    assert_eq!(options.embed_timeout, Duration::from_millis(1500));
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.server.bind, "127.0.0.1:5001");
    assert_eq!(settings.embedding.batch_size, 256);
}
