use super::*;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn explicit_config_dir_wins() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let resolved =
            resolve_config_dir(Some(temp_dir.path())).expect("explicit dir always resolves");
        assert_eq!(resolved, temp_dir.path());
    }

    #[test]
    fn invalid_toml_handling() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        fs::write(
            temp_dir.path().join("config.toml"),
            r#"
            [ollama
            host = "localhost"
            port = "invalid_port"
        "#,
        )
        .expect("should write config file");

        assert!(Config::load(temp_dir.path()).is_err());
    }

    #[test]
    fn partial_config_with_defaults() {
        let partial_toml = r#"
            [ollama]
            host = "custom-host"

            [pipeline]
            sample_cap = 10
        "#;

        let config: Config = toml::from_str(partial_toml).expect("missing fields use defaults");
        assert_eq!(config.ollama.host, "custom-host");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.pipeline.sample_cap, 10);
        assert_eq!(config.pipeline.excerpt_chars, 1000);
    }

    #[test]
    fn empty_file_is_default() {
        let config: Config = toml::from_str("").expect("empty toml is valid");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn out_of_range_values_fail_load() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        fs::write(
            temp_dir.path().join("config.toml"),
            r#"
            [pipeline]
            fetch_timeout_seconds = 30
        "#,
        )
        .expect("should write config file");

        let err = Config::load(temp_dir.path()).expect_err("timeout above cap is rejected");
        assert!(format!("{:#}", err).contains("fetch timeout"));
    }

    #[test]
    fn complete_valid_config() {
        let valid_toml = r#"
            [ollama]
            protocol = "https"
            host = "ollama.internal"
            port = 8443
            model = "mistral:latest"
            timeout_seconds = 90

            [pipeline]
            sample_cap = 20
            excerpt_chars = 500
            fetch_timeout_seconds = 3
            fetch_delay_ms = 0
            user_agent = "scout-test"
        "#;

        let config: Config = toml::from_str(valid_toml).expect("should parse toml correctly");
        assert!(config.validate().is_ok());
        assert_eq!(config.ollama.model, "mistral:latest");
        assert_eq!(config.pipeline.fetch_delay_ms, 0);
        assert_eq!(config.pipeline.user_agent, "scout-test");
    }
}
