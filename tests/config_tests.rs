//! Loading `delve.toml` from disk.

use delve::utils::config::{ConfigError, DelveConfig};
use std::io::Write;
use tempfile::NamedTempFile;

const MINIMAL: &str = r#"
[providers.local]
type = "ollama"
default_model = "qwen3:8b"

[models.fast]
provider = "local"
model = "qwen3:8b"

[agents.planner]
model = "fast"

[agents.search]
model = "fast"

[agents.writer]
model = "fast"
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_minimal_config_applies_defaults() {
    let file = write_config(MINIMAL);
    let config = DelveConfig::load(file.path()).unwrap();

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.pipeline.agent_timeout_secs, 300);
    assert!(!config.pipeline.browse);
    assert_eq!(config.pipeline.max_searches, 10);
    assert_eq!(config.pipeline.stream_channel_capacity, 32);
    assert_eq!(config.charts.base_url, "https://quickchart.io");
    assert_eq!(config.charts.max_url_length, 2000);
    assert!(config.agents.browser.is_none());
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = DelveConfig::load(dir.path().join("delve.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn test_unknown_model_reference() {
    let file = write_config(&MINIMAL.replace("[agents.writer]\nmodel = \"fast\"", "[agents.writer]\nmodel = \"huge\""));
    let err = DelveConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingModel(model, role) if model == "huge" && role == "writer"));
}

#[test]
fn test_unknown_provider_reference() {
    let file = write_config(&MINIMAL.replace("provider = \"local\"", "provider = \"remote\""));
    let err = DelveConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingProvider(provider, _) if provider == "remote"));
}

#[test]
fn test_browse_requires_browser_role() {
    let file = write_config(&format!("{}\n[pipeline]\nbrowse = true\n", MINIMAL));
    let err = DelveConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));

    let file = write_config(&format!(
        "{}\n[agents.browser]\nmodel = \"fast\"\n\n[pipeline]\nbrowse = true\nagent_timeout_secs = 0\n",
        MINIMAL
    ));
    let config = DelveConfig::load(file.path()).unwrap();
    assert!(config.pipeline.browse);
    assert!(config.pipeline.agent_timeout().is_none());
}

#[test]
fn test_missing_api_key_env() {
    let file = write_config(&format!(
        "{}\n[providers.openai]\ntype = \"openai\"\napi_key_env = \"DELVE_TEST_KEY_THAT_IS_NOT_SET\"\ndefault_model = \"gpt-4o-mini\"\n",
        MINIMAL
    ));
    let err = DelveConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("DELVE_TEST_KEY_THAT_IS_NOT_SET"));
}

#[test]
fn test_invalid_toml() {
    let file = write_config("[agents\nplanner = ");
    assert!(matches!(
        DelveConfig::load(file.path()).unwrap_err(),
        ConfigError::ParseError(_)
    ));
}

#[test]
fn test_sample_config_is_valid() {
    let config = DelveConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/delve.toml")).unwrap();
    assert!(config.get_model(&config.agents.writer.model).is_some());
}
