pub mod models;
pub mod validation;

pub use models::*;
pub use validation::*;

#[cfg(test)]
mod tests {
    use super::*;
    use figment::{
        Figment, Jail,
        providers::{Env, Format, Serialized, Toml},
    };
    use garde::Validate;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_valid_config_loads() {
        let config_toml = r#"
            [server]
            port = 8080
            bind = "0.0.0.0"

            [logging]
            level = "info"
            format = "json"

            [cache]
            profile_ttl_seconds = 120
            role_ttl_seconds = 30
        "#;

        let config: AppConfig = Figment::new()
            .merge(Toml::string(config_toml))
            .extract()
            .expect("Should parse valid config");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.cache.profile_ttl_seconds, 120);
        assert_eq!(config.cache.role_ttl_seconds, 30);
        // Unset fields fall back to their serde defaults
        assert_eq!(config.cache.sweep_interval_seconds, 60);
        assert_eq!(config.store.backend, "memory");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let config_toml = r#"
            [server]
            port = 80
            bind = "0.0.0.0"
        "#;

        let config: AppConfig = Figment::new()
            .merge(Toml::string(config_toml))
            .extract()
            .expect("Should parse");

        let validation = config.validate();
        assert!(validation.is_err());
        assert!(validation.unwrap_err().to_string().contains("port"));
    }

    #[test]
    fn test_validation_catches_invalid_bind() {
        let config_toml = r#"
            [server]
            port = 8080
            bind = "invalid-ip-address"
        "#;

        let config: AppConfig = Figment::new()
            .merge(Toml::string(config_toml))
            .extract()
            .expect("Should parse");

        let validation = config.validate();
        assert!(validation.is_err());
        assert!(validation.unwrap_err().to_string().contains("bind"));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = AppConfig::default();
        config.cache.role_ttl_seconds = 0;

        let validation = config.validate();
        assert!(validation.is_err());
        assert!(validation.unwrap_err().to_string().contains("role_ttl_seconds"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = AppConfig::default();
        config.cache.max_entries = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.store.backend = "postgres".to_string();

        let validation = config.validate();
        assert!(validation.is_err());
        assert!(validation.unwrap_err().to_string().contains("backend"));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_hierarchy() {
        Jail::expect_with(|jail| {
            jail.set_env("APP_SERVER__PORT", "3000");
            jail.set_env("APP_CACHE__PROFILE_TTL_SECONDS", "45");

            let default = r#"[server]
            port = 8080"#;

            let env_specific = r#"[server]
            port = 9090"#;

            let config: AppConfig = Figment::new()
                .merge(Serialized::defaults(AppConfig::default()))
                .merge(Toml::string(default))
                .merge(Toml::string(env_specific))
                .merge(Env::prefixed("APP_").split("__"))
                .extract()?;

            // Environment variables win over files
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.cache.profile_ttl_seconds, 45);
            Ok(())
        });
    }

    #[test]
    fn test_default_values() {
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .extract()
            .expect("Should load defaults");

        assert!(config.validate().is_ok());
        assert_eq!(config.cache.profile_cache().ttl, Duration::from_secs(300));
        assert_eq!(config.cache.role_cache().max_entries, 10_000);
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.store.surreal().database, "main");
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_cli_overrides_files_and_env() {
        Jail::expect_with(|jail| {
            jail.set_env("APP_SERVER__PORT", "3000");

            let mut file = tempfile::NamedTempFile::new().expect("temp file");
            writeln!(file, "[store]\nbackend = \"surreal\"\n[server]\nport = 4000")
                .expect("write config");

            let cli = Cli {
                config: Some(file.path().to_path_buf()),
                port: Some(5000),
                environment: Some("test".to_string()),
            };

            let config = load_config(&cli).expect("config should load");
            assert_eq!(config.server.port, 5000);
            assert_eq!(config.store.backend, "surreal");
            assert_eq!(config.environment, Environment::Test);
            Ok(())
        });
    }

    #[test]
    fn test_selected_environment_sets_profile() {
        Jail::expect_with(|_| {
            let cli = Cli {
                environment: Some("Development".to_string()),
                ..Cli::default()
            };

            let config = load_config(&cli).expect("config should load");
            assert_eq!(config.environment, Environment::Development);
            assert_eq!(config.environment.as_str(), "development");
            Ok(())
        });
    }

    #[test]
    fn test_environment_from_env_var() {
        Jail::expect_with(|jail| {
            jail.set_env("APP_ENVIRONMENT", "staging");

            let config = load_config(&Cli::default()).expect("config should load");
            assert_eq!(config.environment, Environment::Staging);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_environment_rejected() {
        Jail::expect_with(|_| {
            let cli = Cli {
                environment: Some("qa".to_string()),
                ..Cli::default()
            };

            assert!(load_config(&cli).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("APP_CACHE__SWEEP_INTERVAL_SECONDS", "0");

            assert!(load_config(&Cli::default()).is_err());
            Ok(())
        });
    }
}
