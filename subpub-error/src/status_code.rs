use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок каналов.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Состояние подписки
/// - 4xxx: Ограничения (лимиты)
/// - 6xxx: Доставка / жизненный цикл канала
///
/// # Реализация:
/// - `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
/// - опционально: `strum` для `AsRefStr`/`EnumIter` (feature = "strum").
/// - опционально: `serde_repr` для сериализации в виде числового значения
///   (feature = "serde_repr").
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Internal = 1003,
    RuntimeUnavailable = 1006,

    // === 2xxx: Состояние подписки ===
    SubscriptionCancelled = 2010,

    // === 4xxx: Лимиты ===
    SubscriberLimitExceeded = 4003,

    // === 6xxx: Доставка ===
    ChannelClosed = 6001,
    HandlerFailed = 6010,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    ///
    /// Возвращает `None`, если значение не соответствует ни одному варианту.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Вернёт `true`, если переданный `code` означает успешный результат.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Ошибка вызвана неправильным использованием API (например, `get()`
    /// после отмены подписки или превышение лимита).
    pub fn is_client_error(&self) -> bool {
        (2000..=4999).contains(&self.code())
    }

    /// Внутренняя или инфраструктурная ошибка.
    pub fn is_server_error(&self) -> bool {
        let c = self.code();
        matches!(c, 1000..=1999 | 5000..=7999)
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::SubscriptionCancelled => LogLevel::Debug,
            Self::SubscriberLimitExceeded => LogLevel::Info,
            Self::ChannelClosed | Self::HandlerFailed | Self::Unknown => LogLevel::Warn,
            Self::Internal | Self::RuntimeUnavailable => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет разделение клиентских и серверных ошибок.
    #[test]
    fn test_client_vs_server() {
        assert!(StatusCode::SubscriptionCancelled.is_client_error());
        assert!(StatusCode::SubscriberLimitExceeded.is_client_error());
        assert!(!StatusCode::SubscriptionCancelled.is_server_error());
        assert!(StatusCode::RuntimeUnavailable.is_server_error());
        assert!(StatusCode::HandlerFailed.is_server_error());
    }

    /// Тест проверяет конвертацию через `TryFrom<u32>` и `from_u32`.
    #[test]
    fn test_from_try_from_u32() {
        let n = StatusCode::ChannelClosed.code();
        assert_eq!(StatusCode::try_from(n).unwrap(), StatusCode::ChannelClosed);
        assert!(StatusCode::from_u32(99999).is_none());
    }

    #[test]
    fn test_code_and_into() {
        let c = StatusCode::SubscriptionCancelled;
        assert_eq!(c.code(), 2010);
        let n: u32 = c.into();
        assert_eq!(n, 2010);
        assert!(StatusCode::is_success(StatusCode::Success.code()));
        assert!(!StatusCode::is_success(StatusCode::ChannelClosed.code()));
    }

    /// Тест проверяет уровень логирования для разных кодов.
    #[test]
    fn test_log_level_mappings() {
        assert_eq!(StatusCode::Success.log_level(), LogLevel::Trace);
        assert_eq!(
            StatusCode::SubscriptionCancelled.log_level(),
            LogLevel::Debug
        );
        assert_eq!(StatusCode::HandlerFailed.log_level(), LogLevel::Warn);
        assert_eq!(StatusCode::RuntimeUnavailable.log_level(), LogLevel::Error);
    }

    /// Тест проверяет формат `Display`: строка должна содержать имя варианта и
    /// числовой код.
    #[test]
    fn test_display_contains_name_and_code() {
        let s = format!("{}", StatusCode::ChannelClosed);
        assert!(s.contains("6001"), "Display must contain code 6001, got: {s}");
        assert!(
            s.contains("ChannelClosed"),
            "Display must contain variant name 'ChannelClosed', got: {s}"
        );
    }
}
