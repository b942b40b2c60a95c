use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки каналов и подписок.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Подписка уже отменена (`get()` после `cancel()` или выхода из scope).
    #[error("subscription {id} is cancelled")]
    Cancelled { id: u64 },

    /// Канал уничтожен, пока потребитель ждал сообщения.
    #[error("channel '{channel}' is closed")]
    Closed { channel: String },

    /// Нет tokio runtime, на котором можно запускать обработчики.
    #[error("no tokio runtime available to schedule handlers for channel '{channel}'")]
    NoRuntime { channel: String },

    /// Превышен лимит подписчиков канала.
    #[error("subscriber limit ({limit}) exceeded for channel '{channel}'")]
    SubscriberLimitExceeded { channel: String, limit: usize },

    /// Обработчик подписки вернул ошибку или запаниковал.
    ///
    /// Никогда не возвращается издателю, только логируется.
    #[error("handler of subscription {id} on channel '{channel}' failed: {reason}")]
    HandlerFailed {
        channel: String,
        id: u64,
        reason: String,
    },
}

impl ErrorExt for ChannelError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Cancelled { .. } => StatusCode::SubscriptionCancelled,
            Self::Closed { .. } => StatusCode::ChannelClosed,
            Self::NoRuntime { .. } => StatusCode::RuntimeUnavailable,
            Self::SubscriberLimitExceeded { .. } => StatusCode::SubscriberLimitExceeded,
            Self::HandlerFailed { .. } => StatusCode::HandlerFailed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::Cancelled { .. } => "Subscription cancelled".to_string(),
            Self::Closed { .. } => "Channel closed".to_string(),
            Self::NoRuntime { .. } => "Async runtime unavailable".to_string(),
            Self::SubscriberLimitExceeded { .. } => "Too many subscribers".to_string(),
            Self::HandlerFailed { .. } => "Subscriber handler failed".to_string(),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "channel".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::Cancelled { id } => {
                tags.push(("subscription_id", id.to_string()));
            }
            Self::Closed { channel } | Self::NoRuntime { channel } => {
                tags.push(("channel", channel.clone()));
            }
            Self::SubscriberLimitExceeded { channel, limit } => {
                tags.push(("channel", channel.clone()));
                tags.push(("limit", limit.to_string()));
            }
            Self::HandlerFailed { channel, id, .. } => {
                tags.push(("channel", channel.clone()));
                tags.push(("subscription_id", id.to_string()));
            }
        }

        tags
    }
}
