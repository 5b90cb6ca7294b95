use std::fs;
use supplychat::config::{AppConfig, ConfigManager, Theme, CONFIG_VERSION};
use tempfile::TempDir;

fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().join("supplychat"));
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, CONFIG_VERSION);
    assert_eq!(config.agent.model, "gpt-3.5-turbo");
    assert_eq!(config.agent.temperature, 0.0);
    assert_eq!(config.agent.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.fast_path.key_column, "sku_id");
    assert_eq!(config.fast_path.quantity_column, "units_sold");
    assert_eq!(config.fast_path.limit, 5);
    assert_eq!(config.display.preview_rows, 5);
    assert_eq!(config.display.chart_row_limit, 10_000);
    assert_eq!(config.loading.delimiter, b',');
    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert!(!config.debug.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_uses_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.agent.max_steps, 5);
}

#[test]
fn test_write_default_config_and_force() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let config_path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");
    assert!(config_path.exists());

    let content = fs::read_to_string(&config_path).unwrap();
    for section in [
        "[agent]",
        "[samples]",
        "[loading]",
        "[fast_path]",
        "[display]",
        "[performance]",
        "[theme.colors]",
        "[debug]",
    ] {
        assert!(content.contains(section), "missing {}", section);
    }

    let err = config_manager.write_default_config(false).unwrap_err();
    assert!(err.to_string().contains("already exists"));
    assert!(config_manager.write_default_config(true).is_ok());
}

#[test]
fn test_default_template_parses_to_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::from_toml(&config_manager.generate_default_config()).unwrap();
    let defaults = AppConfig::default();

    assert_eq!(config.agent.model, defaults.agent.model);
    assert_eq!(config.agent.endpoint, defaults.agent.endpoint);
    assert_eq!(config.fast_path.limit, defaults.fast_path.limit);
    assert_eq!(config.theme.colors.primary, defaults.theme.colors.primary);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_config_keeps_other_defaults() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    config_manager.ensure_config_dir().unwrap();
    fs::write(
        config_manager.config_path("config.toml"),
        "version = \"0.1\"\n[agent]\nmodel = \"gpt-4o-mini\"\n[fast_path]\nlimit = 10\n",
    )
    .unwrap();

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.agent.model, "gpt-4o-mini");
    assert_eq!(config.agent.max_steps, 5);
    assert_eq!(config.fast_path.limit, 10);
    assert_eq!(config.fast_path.key_column, "sku_id");
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        "version = \"9.9\"",
        "[agent]\nmax_steps = 0",
        "[agent]\napi_key_env = \"\"",
        "[fast_path]\nlimit = 0",
        "[fast_path]\nkey_column = \" \"",
        "[display]\npreview_rows = 0",
        "[theme.colors]\nprimary = \"not-a-color\"",
        "[theme.colors]\nchart_series = []",
    ];
    for case in cases {
        let config = AppConfig::from_toml(case).unwrap();
        assert!(config.validate().is_err(), "accepted: {}", case);
    }
}

#[test]
fn test_theme_from_default_config() {
    let theme = Theme::from_config(&AppConfig::default().theme).unwrap();
    assert_eq!(theme.colors.len(), 13);
    assert!(!theme.chart_series.is_empty());
}
