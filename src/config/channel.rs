use serde::{Deserialize, Serialize};

/// Настройки одного канала.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Имя канала, используется только в логах и ошибках.
    pub name: String,
    /// Максимум одновременно зарегистрированных подписок (`None`: без
    /// ограничения).
    pub max_subscriptions: Option<usize>,
    /// Логировать сбои обработчиков на уровне WARN (иначе DEBUG).
    pub log_handler_failures: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_subscriptions: None,
            log_handler_failures: true,
        }
    }
}

impl ChannelConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_subscriptions(
        mut self,
        limit: usize,
    ) -> Self {
        self.max_subscriptions = Some(limit);
        self
    }

    pub fn with_handler_failure_logging(
        mut self,
        enabled: bool,
    ) -> Self {
        self.log_handler_failures = enabled;
        self
    }
}
