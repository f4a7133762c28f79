use std::fs;

use assert_matches::assert_matches;

use listening_profiler::config::{Config, ConfigLoader, resolve_token};
use listening_profiler::error::ProfilerError;

#[test]
fn load_config_file_with_custom_table() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("listening-profiler.json");
    fs::write(
        &path,
        r#"{
            "max_batch_size": 10,
            "top_n": 3,
            "deadline_secs": 45,
            "archetypes": {
                "fallback": "WANDERER",
                "entries": [
                    { "name": "NIGHT_OWL", "genres": ["darkwave", "synthwave"] },
                    { "name": "SUNRISE", "genres": ["pop"] }
                ]
            }
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.to_str().unwrap())).unwrap();
    assert_eq!(resolved.analysis.max_batch_size, 10);
    assert_eq!(resolved.analysis.top_n, 3);
    assert_eq!(resolved.analysis.saved_tracks_page_size, 5);
    assert_eq!(resolved.deadline.map(|d| d.as_secs()), Some(45));
    assert_eq!(resolved.archetypes.fallback(), "WANDERER");
    assert_eq!(resolved.archetypes.classify(&["synthwave"]), "NIGHT_OWL");
    assert_eq!(resolved.archetypes.classify(&["jazz"]), "WANDERER");
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    assert_matches!(
        ConfigLoader::resolve(Some(path.to_str().unwrap())),
        Err(ProfilerError::ConfigRead(_))
    );
}

#[test]
fn invalid_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert_matches!(
        ConfigLoader::resolve(Some(path.to_str().unwrap())),
        Err(ProfilerError::ConfigParse(_))
    );
}

#[test]
fn table_with_matchable_fallback_rejected() {
    let config: Config = serde_json::from_str(
        r#"{ "archetypes": { "entries": [ { "name": "OUTLIER", "genres": ["noise"] } ] } }"#,
    )
    .unwrap();
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(ProfilerError::InvalidArchetypeTable(_))
    );
}

#[test]
fn non_http_base_url_rejected() {
    let config = Config {
        api_base_url: Some("ftp://catalog".to_string()),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(ProfilerError::InvalidConfig(_))
    );
}

#[test]
fn token_flag_is_trimmed() {
    assert_eq!(resolve_token(Some("  abc123 ".to_string())).unwrap(), "abc123");
}
