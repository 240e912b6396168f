use hubspot_crm::Config;
use hubspot_crm::api::LogLevel;
use tempfile::TempDir;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::default();
    config.access_token = Some("pat-na1-abc".to_string());
    config.portal_id = Some(123456);
    config.timeouts.read = 90;
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.is_configured());
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "access_token = \"pat-eu1-xyz\"\nlog_level = \"debug\"\n\n[timeouts]\nconnect = 5\n",
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.access_token.as_deref(), Some("pat-eu1-xyz"));
    assert_eq!(config.log_level(), LogLevel::Debug);
    assert_eq!(config.timeouts.connect, 5);
    assert_eq!(config.timeouts.read, 30);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.base_url, "https://api.hubapi.com");
}

#[test]
fn test_invalid_toml_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "access_token = [unterminated").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}
