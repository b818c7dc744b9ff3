//! Integration tests for config

#[cfg(test)]
mod tests {
    use lockcheck_config::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[tool]
program = "/usr/local/bin/pipenv"
timeout_secs = 120

[tool.extra_env]
PIPENV_NOSPIN = "1"

[network]
enabled = false
max_runs = 5
retry_delay_ms = 100

[paths]
fixtures_dir = "/srv/lockcheck/fixtures"
"#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.tool.program, "/usr/local/bin/pipenv");
        assert_eq!(config.tool.timeout_secs, 120);
        assert_eq!(config.tool.extra_env["PIPENV_NOSPIN"], "1");
        assert!(!config.network.enabled);
        assert_eq!(config.network.max_runs, 5);
        assert_eq!(config.network.retry_delay_ms, 100);
        assert_eq!(
            config.fixtures_dir(),
            PathBuf::from("/srv/lockcheck/fixtures")
        );
        assert_eq!(config.paths.work_dir, None);
    }

    #[tokio::test]
    async fn test_empty_file_gives_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_env_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[tool]\nprogram = \"from-file\"\n").unwrap();

        let mut config = Config::load_or_default(Some(temp_file.path()))
            .await
            .unwrap();
        config
            .merge_env_from(|key| (key == "LOCKCHECK_TOOL").then(|| "from-env".to_string()))
            .unwrap();
        assert_eq!(config.tool.program, "from-env");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut config = Config::default();
        config.index.url = Some("http://127.0.0.1:8080".to_string());
        config
            .tool
            .extra_env
            .insert("PIPENV_VERBOSITY".to_string(), "-1".to_string());

        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
