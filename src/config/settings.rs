use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use super::ChannelConfig;
use crate::logging::LoggingConfig;

/// Файл настроек, который ищется в текущем каталоге (`subpub.toml`,
/// `subpub.yaml`, ...).
const DEFAULT_FILE: &str = "subpub";
const ENV_PREFIX: &str = "SUBPUB";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub channel: ChannelConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Загружает настройки: значения по умолчанию, затем необязательный файл
    /// `subpub.*`, затем переменные окружения `SUBPUB_*`.
    ///
    /// Вложенные ключи в окружении разделяются `__`, например
    /// `SUBPUB_CHANNEL__MAX_SUBSCRIPTIONS=16`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name(DEFAULT_FILE).required(false))
    }

    /// То же, что [`load`](Self::load), но файл обязателен и задаётся явно.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let cfg = Config::builder()
            // Добавляем значения по умолчанию
            .set_default("channel.name", "default")?
            .set_default("channel.log_handler_failures", true)?
            .set_default("logging.level", "info")?
            .add_source(file)
            // Добавляем переменные окружения с префиксом SUBPUB_
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.name.trim().is_empty() {
            return Err(ConfigError::Message(
                "channel.name must not be empty".to_string(),
            ));
        }
        if self.channel.max_subscriptions == Some(0) {
            return Err(ConfigError::Message(
                "channel.max_subscriptions must be greater than zero".to_string(),
            ));
        }
        self.logging
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::{env, io::Write};

    use serial_test::serial;

    use super::*;
    use crate::logging::LogFormat;

    fn clear_env() {
        for key in [
            "SUBPUB_CHANNEL__NAME",
            "SUBPUB_CHANNEL__MAX_SUBSCRIPTIONS",
            "SUBPUB_LOGGING__LEVEL",
        ] {
            env::remove_var(key);
        }
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// Тест проверяет значения по умолчанию без файла и окружения.
    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();
        let s = Settings::load().unwrap();
        assert_eq!(s.channel.name, "default");
        assert_eq!(s.channel.max_subscriptions, None);
        assert!(s.channel.log_handler_failures);
        assert_eq!(s.logging.level, "info");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let file = toml_file(
            r#"
            [channel]
            name = "orders"
            max_subscriptions = 4

            [logging]
            level = "debug"
            format = "json"
            "#,
        );
        let s = Settings::load_from(file.path()).unwrap();
        assert_eq!(s.channel.name, "orders");
        assert_eq!(s.channel.max_subscriptions, Some(4));
        assert_eq!(s.logging.level, "debug");
        assert_eq!(s.logging.format, LogFormat::Json);
    }

    /// Тест проверяет, что окружение перекрывает файл.
    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let file = toml_file("[channel]\nname = \"from-file\"\n");
        env::set_var("SUBPUB_CHANNEL__NAME", "from-env");
        env::set_var("SUBPUB_CHANNEL__MAX_SUBSCRIPTIONS", "16");
        let s = Settings::load_from(file.path());
        clear_env();

        let s = s.unwrap();
        assert_eq!(s.channel.name, "from-env");
        assert_eq!(s.channel.max_subscriptions, Some(16));
    }

    #[test]
    #[serial]
    fn test_zero_limit_rejected() {
        clear_env();
        let file = toml_file("[channel]\nmax_subscriptions = 0\n");
        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_subscriptions"));
    }

    #[test]
    #[serial]
    fn test_invalid_log_level_rejected() {
        clear_env();
        let file = toml_file("[logging]\nlevel = \"loud\"\n");
        assert!(Settings::load_from(file.path()).is_err());
    }

    #[test]
    fn test_missing_required_file() {
        assert!(Settings::load_from("/definitely/not/here/subpub.toml").is_err());
    }
}
