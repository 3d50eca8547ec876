//! Configuration loading from disk

use bracket_desk::config::{Config, LogFormat};
use rust_decimal_macros::dec;
use std::io::Write;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_config_example_loads() {
    let config: Config = assert_ok!(toml::from_str(include_str!("../../config.toml.example")));
    assert_eq!(config.broker.port, 4001);
    assert_eq!(config.broker.client_id, 1);
    assert_eq!(config.risk.risk_percent, dec!(1.0));
    assert_eq!(config.risk.risk_buttons, vec![dec!(0.25), dec!(0.5), dec!(1.5)]);
    assert_eq!(config.panel.watchlist.len(), 10);
    assert_eq!(config.panel.hotkey_refresh, "F5");
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_config_file_round_trip() {
    let mut config = Config::default();
    config.broker.port = 7497;
    config.risk.risk_percent = dec!(0.5);
    config.panel.watchlist = vec!["SPY".to_string()];

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", toml::to_string(&config).unwrap()).unwrap();

    let loaded = assert_ok!(Config::load(file.path()));
    assert_eq!(loaded.broker.port, 7497);
    assert_eq!(loaded.risk.risk_percent, dec!(0.5));
    assert_eq!(loaded.panel.watchlist, vec!["SPY"]);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert_err!(Config::load(dir.path().join("config.toml")));
}
