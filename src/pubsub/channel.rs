use std::{fmt, future::Future, sync::Arc};

use parking_lot::RwLock;
use subpub_error::{ChannelError, ChannelResult};
use tokio::{runtime::Handle, sync::mpsc};

use super::{
    callback::{self, DeliveryContext, HandlerFn},
    registry::{Endpoint, Registry},
    stats::StatsCounters,
    subscription::{Registration, SubscriptionId, SubscriptionInfo, SubscriptionKind},
    CallbackSubscription, ChannelStats, HandlerOutput, QueueSubscription,
};
use crate::config::ChannelConfig;

/// Состояние канала, общее для всех его клонов.
pub(crate) struct Shared<M> {
    pub(crate) name: Arc<str>,
    pub(crate) config: ChannelConfig,
    pub(crate) registry: Registry<M>,
    pub(crate) stats: Arc<StatsCounters>,
    runtime: RwLock<Option<Handle>>,
}

/// Именованный внутрипроцессный broadcast-канал.
///
/// Поддерживает:
/// - Push-подписки: обработчик запускается отдельной задачей на каждое
///   сообщение ([`subscribe`](Self::subscribe),
///   [`subscribe_async`](Self::subscribe_async))
/// - Pull-подписки с собственной очередью
///   ([`get_subscription`](Self::get_subscription))
/// - Статистику публикаций и сбоев обработчиков
///
/// `Channel` это дешёвый хендл: клоны разделяют один реестр подписок. Когда
/// уничтожен последний клон, ожидающие `get()` получают
/// [`ChannelError::Closed`].
pub struct Channel<M> {
    shared: Arc<Shared<M>>,
}

impl<M> Clone for Channel<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M> Channel<M>
where
    M: Clone + Send + 'static,
{
    /// Создаёт канал с настройками по умолчанию.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(ChannelConfig::named(name))
    }

    pub fn with_config(config: ChannelConfig) -> Self {
        let name: Arc<str> = Arc::from(config.name.as_str());
        tracing::debug!(
            channel = %name,
            max_subscriptions = ?config.max_subscriptions,
            "Channel created"
        );
        Self {
            shared: Arc::new(Shared {
                name,
                config,
                registry: Registry::new(),
                stats: Arc::new(StatsCounters::default()),
                runtime: RwLock::new(None),
            }),
        }
    }

    /// Задаёт runtime, на котором будут запускаться обработчики.
    ///
    /// Без него используется runtime, текущий в момент `subscribe`.
    pub fn with_runtime(
        self,
        runtime: Handle,
    ) -> Self {
        *self.shared.runtime.write() = Some(runtime);
        self
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }

    /// Регистрирует push-подписку с синхронным обработчиком.
    ///
    /// Обработчик может возвращать `()` или `Result<(), E>`; ошибки и паники
    /// логируются и не влияют ни на издателя, ни на другие подписки.
    /// Подписка видна в [`subscriptions`](Self::subscriptions) сразу после
    /// возврата.
    pub fn subscribe<F, R>(
        &self,
        handler: F,
    ) -> ChannelResult<CallbackSubscription<M>>
    where
        F: Fn(M) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        self.register_callback(callback::sync_handler(handler))
    }

    /// Регистрирует push-подписку с асинхронным обработчиком.
    pub fn subscribe_async<F, Fut>(
        &self,
        handler: F,
    ) -> ChannelResult<CallbackSubscription<M>>
    where
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register_callback(callback::async_handler(handler))
    }

    /// Регистрирует pull-подписку с пустой очередью.
    pub fn get_subscription(&self) -> ChannelResult<QueueSubscription<M>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let registration = self.register(Endpoint::Queue(tx))?;
        Ok(QueueSubscription::new(
            registration,
            rx,
            Arc::clone(&self.shared.name),
        ))
    }

    /// Рассылает сообщение всем подпискам, зарегистрированным на момент
    /// вызова.
    ///
    /// Для очередей сообщение добавляется синхронно, для обработчиков только
    /// планируется задача. Никогда не ждёт потребителей и не возвращает
    /// ошибок. Возвращает количество подписок, получивших сообщение.
    pub fn publish(
        &self,
        message: M,
    ) -> usize {
        let shared = &*self.shared;
        shared.stats.record_published();

        let mut delivered = 0usize;
        shared.registry.for_each_live(|id, endpoint| match endpoint {
            Endpoint::Callback { handler, runtime } => {
                callback::dispatch(
                    runtime,
                    Arc::clone(handler),
                    message.clone(),
                    self.delivery_context(id),
                );
                delivered += 1;
            }
            Endpoint::Queue(sender) => {
                if sender.send(message.clone()).is_ok() {
                    delivered += 1;
                } else {
                    shared.stats.record_dropped();
                    tracing::trace!(
                        channel = %shared.name,
                        subscription = %id,
                        "Queue receiver is gone, message dropped"
                    );
                }
            }
        });

        shared.stats.record_delivered(delivered as u64);
        tracing::trace!(channel = %shared.name, delivered, "Message published");
        delivered
    }

    /// Снимок зарегистрированных подписок в порядке регистрации.
    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        self.shared.registry.snapshot()
    }

    pub fn subscription_count(&self) -> usize {
        self.shared.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscription_count() == 0
    }

    /// Снимает все подписки разом. Возвращает их количество.
    ///
    /// Хендлы остаются у владельцев, но `is_alive()` у них становится
    /// `false`, а `get()` возвращает [`ChannelError::Cancelled`].
    pub fn unsubscribe_all(&self) -> usize {
        let removed = self.shared.registry.clear();
        tracing::debug!(channel = %self.shared.name, removed, "All subscriptions removed");
        removed
    }

    pub fn stats(&self) -> ChannelStats {
        self.shared.stats.snapshot()
    }

    fn register_callback(
        &self,
        handler: Arc<HandlerFn<M>>,
    ) -> ChannelResult<CallbackSubscription<M>> {
        let runtime = self.runtime()?;
        let registration = self.register(Endpoint::Callback { handler, runtime })?;
        Ok(CallbackSubscription::new(registration))
    }

    fn register(
        &self,
        endpoint: Endpoint<M>,
    ) -> ChannelResult<Registration<M>> {
        let shared = &*self.shared;
        let kind = endpoint.kind();
        let (id, liveness) = shared
            .registry
            .insert(endpoint, shared.config.max_subscriptions)
            .map_err(|limit| ChannelError::SubscriberLimitExceeded {
                channel: shared.name.to_string(),
                limit,
            })?;
        shared.stats.record_subscription();

        tracing::debug!(
            channel = %shared.name,
            subscription = %id,
            kind = ?kind,
            total = shared.registry.len(),
            "Subscription registered"
        );
        Ok(Registration::new(
            id,
            kind,
            liveness,
            Arc::downgrade(&self.shared),
        ))
    }

    fn runtime(&self) -> ChannelResult<Handle> {
        if let Some(handle) = self.shared.runtime.read().as_ref() {
            return Ok(handle.clone());
        }
        Handle::try_current().map_err(|_| ChannelError::NoRuntime {
            channel: self.shared.name.to_string(),
        })
    }

    fn delivery_context(
        &self,
        id: SubscriptionId,
    ) -> DeliveryContext {
        DeliveryContext {
            channel: Arc::clone(&self.shared.name),
            id,
            stats: Arc::clone(&self.shared.stats),
            log_failures: self.shared.config.log_handler_failures,
        }
    }
}

impl<M> fmt::Debug for Channel<M> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.shared.name)
            .field("subscriptions", &self.shared.registry.len())
            .finish()
    }
}
