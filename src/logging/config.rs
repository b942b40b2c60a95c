use std::{collections::BTreeMap, env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::LoggingError;

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Формат вывода логов.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Многострочный, для разработки
    Pretty,
    /// Однострочный
    #[default]
    Compact,
    /// Структурированный JSON
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let s = match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        };
        f.write_str(s)
    }
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень (`trace`..`error`, `off`)
    pub level: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
    /// Уровни для отдельных target'ов, например `subpub::pubsub = "trace"`
    pub targets: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
            targets: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Применяет `SUBPUB_LOG_LEVEL` и `SUBPUB_LOG_FORMAT`, если они заданы.
    ///
    /// Некорректный формат игнорируется, некорректный уровень будет отклонён
    /// в [`validate`](Self::validate).
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("SUBPUB_LOG_LEVEL") {
            self.level = level.trim().to_ascii_lowercase();
        }
        if let Ok(format) = env::var("SUBPUB_LOG_FORMAT") {
            match format.parse() {
                Ok(f) => self.format = f,
                Err(e) => eprintln!("Ignoring SUBPUB_LOG_FORMAT: {e}"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), LoggingError> {
        if !is_level(&self.level) {
            return Err(LoggingError::InvalidLevel(self.level.clone()));
        }
        for (target, level) in &self.targets {
            if target.trim().is_empty() {
                return Err(LoggingError::InvalidTarget(target.clone()));
            }
            if !is_level(level) {
                return Err(LoggingError::InvalidLevel(format!("{target}={level}")));
            }
        }
        Ok(())
    }

    /// Директива для `EnvFilter`, например `"info,subpub::pubsub=trace"`.
    pub fn build_filter_directive(&self) -> String {
        let mut directive = self.level.to_ascii_lowercase();
        for (target, level) in &self.targets {
            directive.push(',');
            directive.push_str(target);
            directive.push('=');
            directive.push_str(&level.to_ascii_lowercase());
        }
        directive
    }
}

fn is_level(level: &str) -> bool {
    LEVELS.contains(&level.to_ascii_lowercase().as_str())
}
