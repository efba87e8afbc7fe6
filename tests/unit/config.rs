use super::*;

#[test]
fn empty_toml_yields_defaults() {
    let config = AppConfig::from_toml("").unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.export.max_job_age_secs, 3600);
    assert_eq!(config.export.cleanup_interval_secs, 3600);
    assert_eq!(config.export.encoder_program, "ffmpeg");
    assert_eq!(config.export.chunk_size, 16);
    assert!(config.export.rasterizer_enabled);
    assert!(config.export.render_threads.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = AppConfig::from_toml(
        r#"
[export]
encoder_program = "/opt/ffmpeg/bin/ffmpeg"
render_threads = 2
rasterizer_enabled = false

[logging]
level = "debug"
"#,
    )
    .unwrap();
    assert_eq!(config.export.encoder_program, "/opt/ffmpeg/bin/ffmpeg");
    assert_eq!(config.export.render_threads, Some(2));
    assert!(!config.export.rasterizer_enabled);
    assert_eq!(config.export.encoder_timeout_secs, 600);
    assert_eq!(config.logging.level, "debug");

    let threading = config.export.threading();
    assert_eq!(threading.threads, Some(2));
    assert_eq!(threading.chunk_size, 16);
    assert!(threading.parallel);
}

#[test]
fn malformed_toml_is_a_validation_error() {
    let err = AppConfig::from_toml("[export]\nchunk_size = \"many\"").unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert!(
        AppConfig::from_toml("[export]\nencoder_timeout_secs = 0")
            .unwrap_err()
            .is_validation()
    );
}

#[test]
fn load_missing_file_or_no_path_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap(),
        AppConfig::default()
    );
    assert_eq!(AppConfig::load(None).unwrap(), AppConfig::default());
}

#[test]
fn load_reads_file_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pathreel.toml");
    let mut config = AppConfig::default();
    config.export.max_job_age_secs = 60;
    config.export.output_dir = dir.path().join("out");
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();

    let loaded = AppConfig::load(Some(&path)).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.export.max_job_age_ms(), 60_000);
    assert_eq!(
        loaded.export.cleanup_interval(),
        std::time::Duration::from_secs(3600)
    );
}
