use opsdeck::{ConfigError, ToolkitConfig};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

// ── Defaults ─────────────────────────────────────────────────────

#[test]
fn defaults_match_engine_defaults() {
    let config = ToolkitConfig::default();
    assert_eq!(config.batch.concurrency, 1);
    assert_eq!(config.chunks.chunk_size, 20);
    assert_eq!(config.chunks.preload_count, 2);
    assert_eq!(config.chunks.cache_size, 5);
    assert!(config.preload.enabled);
    assert_eq!(config.preload.prefetch_delay_ms, 100);
    assert_eq!(config.preload.cache_ttl_ms, 60_000);
    assert_eq!(config.predictive.max_history_size, 100);
    assert_eq!(config.predictive.prediction_threshold, 3);
    assert_eq!(config.render_cache.max_size, 100);
    assert!(config.reorder.enabled);
    assert!(!config.reorder.cross_list);
    assert!(config.shortcuts.enabled);
}

// ── JSON ─────────────────────────────────────────────────────────

#[test]
fn empty_document_is_default() {
    assert_eq!(ToolkitConfig::from_json_str("{}").unwrap(), ToolkitConfig::default());
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = ToolkitConfig::from_json_str(
        r#"{ "batch": { "concurrency": 4, "timeout_ms": 2500 }, "reorder": { "cross_list": true } }"#,
    )
    .unwrap();

    assert_eq!(config.batch.concurrency, 4);
    assert_eq!(config.batch.timeout_ms, Some(2500));
    assert_eq!(config.batch.retry_count, 0);
    assert!(config.reorder.cross_list);
    assert!(config.reorder.enabled);
    assert_eq!(config.chunks, ToolkitConfig::default().chunks);
}

#[test]
fn serialized_config_loads_back() {
    let mut config = ToolkitConfig::default();
    config.chunks.chunk_size = 64;
    config.preload.prefetch_limit = Some(8);
    config.shortcuts.enabled = false;

    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(ToolkitConfig::from_json_str(&json).unwrap(), config);
}

#[test]
fn malformed_json_is_rejected() {
    let err = ToolkitConfig::from_json_str(r#"{ "batch": { "concurrency": "many" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
    assert!(err.to_string().starts_with("invalid config:"));
}

// ── Files ────────────────────────────────────────────────────────

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "chunks": {{ "chunk_size": 50, "cache_size": 10 }} }}"#).unwrap();

    let config = ToolkitConfig::from_path(file.path()).unwrap();
    assert_eq!(config.chunks.chunk_size, 50);
    assert_eq!(config.chunks.cache_size, 10);
    assert_eq!(config.chunks.preload_count, 2);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = ToolkitConfig::from_path(&path).unwrap_err();
    match &err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, &path),
        other => panic!("expected Io error, got {other:?}"),
    }
    assert!(err.to_string().contains("absent.json"));
}

// ── Environment overrides ────────────────────────────────────────

#[test]
fn overrides_apply_to_each_section() {
    let mut config = ToolkitConfig::default();
    config
        .apply_overrides(vars(&[
            ("OPSDECK_BATCH_CONCURRENCY", "6"),
            ("OPSDECK_BATCH_RETRY_COUNT", "2"),
            ("OPSDECK_BATCH_TIMEOUT_MS", " 1500 "),
            ("OPSDECK_CHUNK_SIZE", "40"),
            ("OPSDECK_CHUNK_CACHE_SIZE", "9"),
            ("OPSDECK_PRELOAD_ENABLED", "false"),
            ("OPSDECK_PRELOAD_DELAY_MS", "250"),
            ("OPSDECK_PRELOAD_TTL_MS", "30000"),
            ("OPSDECK_SHORTCUTS_ENABLED", "false"),
        ]))
        .unwrap();

    assert_eq!(config.batch.concurrency, 6);
    assert_eq!(config.batch.retry_count, 2);
    assert_eq!(config.batch.timeout_ms, Some(1500));
    assert_eq!(config.chunks.chunk_size, 40);
    assert_eq!(config.chunks.cache_size, 9);
    assert!(!config.preload.enabled);
    assert_eq!(config.preload.prefetch_delay_ms, 250);
    assert_eq!(config.preload.cache_ttl_ms, 30_000);
    assert!(!config.shortcuts.enabled);
}

#[test]
fn absent_variables_change_nothing() {
    let mut config = ToolkitConfig::from_json_str(r#"{ "batch": { "concurrency": 3 } }"#).unwrap();
    let before = config.clone();
    config.apply_overrides(vars(&[])).unwrap();
    assert_eq!(config, before);
}

#[test]
fn invalid_override_leaves_config_untouched() {
    let mut config = ToolkitConfig::default();
    let err = config
        .apply_overrides(vars(&[
            ("OPSDECK_CHUNK_SIZE", "40"),
            ("OPSDECK_PRELOAD_TTL_MS", "soon"),
        ]))
        .unwrap_err();

    match err {
        ConfigError::InvalidEnv { name, value } => {
            assert_eq!(name, "OPSDECK_PRELOAD_TTL_MS");
            assert_eq!(value, "soon");
        }
        other => panic!("expected InvalidEnv, got {other:?}"),
    }
    assert_eq!(config, ToolkitConfig::default());
}

// ── Logging ──────────────────────────────────────────────────────

#[test]
fn logging_init_is_repeatable() {
    opsdeck::logging::init(true);
    assert!(!opsdeck::logging::try_init(false));
}
