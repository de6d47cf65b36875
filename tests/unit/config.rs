use iron_bank::config::ENV_PREFIX;
use iron_bank::{IronBankError, Settings};
use std::io::Write;
use tempfile::Builder;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_configuration_file() {
    let file = write_config(
        r#"
        [storage]
        influx_url = "influx.internal"
        influx_protocol = "https"
        influx_port = 443
        influx_token = "secret"
        pair = "ETHUSD"
        org = "desk"
        bucket = "trades_1m"
        verify_connection = true

        [logging]
        level = "debug"
        format = "json"
        "#,
    );

    let settings = Settings::load(Some(file.path())).unwrap();
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.logging.format, "json");

    let storage = settings.storage.validate().unwrap();
    assert_eq!(storage.influx.url, "https://influx.internal:443");
    assert_eq!(storage.influx.org, "desk");
    assert_eq!(storage.influx.bucket, "trades_1m");
    assert_eq!(storage.influx.token.as_deref(), Some("secret"));
    assert_eq!(storage.pair, "ETHUSD");
    assert!(storage.verify_connection);
}

#[test]
fn test_environment_overrides_file() {
    let file = write_config(
        r#"
        [storage]
        influx_url = "localhost"
        pair = "BTCUSD"
        "#,
    );

    let key = format!("{ENV_PREFIX}__STORAGE__BUCKET");
    std::env::set_var(&key, "from_env");
    let loaded = Settings::load(Some(file.path()));
    std::env::remove_var(&key);

    let storage = loaded.unwrap().storage.validate().unwrap();
    assert_eq!(storage.influx.bucket, "from_env");
    assert_eq!(storage.influx.url, "http://localhost:8086");
}

#[test]
fn test_malformed_file_is_configuration_error() {
    let file = write_config("[storage\ninflux_url = ");

    let error = Settings::load(Some(file.path())).unwrap_err();
    assert!(matches!(error, IronBankError::Configuration { .. }));
}

#[test]
fn test_missing_pair_rejected_after_load() {
    let file = write_config("[storage]\ninflux_url = \"localhost\"\n");

    let settings = Settings::load(Some(file.path())).unwrap();
    assert!(matches!(
        settings.storage.validate().unwrap_err(),
        IronBankError::MissingConfigValue { ref key } if key == "pair"
    ));
}
