use std::sync::atomic::{AtomicU64, Ordering};

/// Счётчики канала. Обновляются без блокировок.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    published: AtomicU64,
    delivered: AtomicU64,
    handled: AtomicU64,
    handler_failures: AtomicU64,
    dropped: AtomicU64,
    subscriptions_created: AtomicU64,
}

/// Снимок статистики канала.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Общее количество вызовов `publish`.
    pub published: u64,
    /// Сколько раз сообщение было передано подписке (поставлено в очередь или
    /// запланирован обработчик).
    pub delivered: u64,
    /// Успешно завершившиеся вызовы обработчиков.
    pub handled: u64,
    /// Обработчики, вернувшие ошибку или запаниковавшие.
    pub handler_failures: u64,
    /// Доставки в очередь, у которой уже нет получателя.
    pub dropped: u64,
    /// Сколько подписок было создано за время жизни канала.
    pub subscriptions_created: u64,
}

impl StatsCounters {
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(
        &self,
        count: u64,
    ) {
        self.delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_handled(&self) {
        self.handled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_subscription(&self) {
        self.subscriptions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ChannelStats {
        ChannelStats {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            subscriptions_created: self.subscriptions_created.load(Ordering::Relaxed),
        }
    }
}
