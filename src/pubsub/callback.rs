use std::{any::Any, fmt, future::Future, panic::AssertUnwindSafe, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use subpub_error::{ChannelError, ErrorExt, LogLevel};
use tokio::runtime::Handle;

use super::{
    stats::StatsCounters,
    subscription::{Registration, Subscription, SubscriptionId, SubscriptionKind},
};

pub(crate) type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// Обработчик в стёртом виде: синхронные и асинхронные обработчики
/// приводятся к функции, возвращающей future.
pub(crate) type HandlerFn<M> = dyn Fn(M) -> HandlerFuture + Send + Sync;

/// Результат синхронного обработчика.
///
/// Позволяет передавать в [`Channel::subscribe`](super::Channel::subscribe)
/// как `|msg| { ... }`, так и `|msg| -> Result<(), E> { ... }`.
pub trait HandlerOutput {
    fn into_result(self) -> anyhow::Result<()>;
}

impl HandlerOutput for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> HandlerOutput for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

pub(crate) fn sync_handler<M, F, R>(handler: F) -> Arc<HandlerFn<M>>
where
    M: Send + 'static,
    F: Fn(M) -> R + Send + Sync + 'static,
    R: HandlerOutput,
{
    let handler = Arc::new(handler);
    Arc::new(move |message: M| {
        let handler = Arc::clone(&handler);
        async move { handler(message).into_result() }.boxed()
    })
}

pub(crate) fn async_handler<M, F, Fut>(handler: F) -> Arc<HandlerFn<M>>
where
    M: Send + 'static,
    F: Fn(M) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |message: M| handler(message).boxed())
}

/// Всё, что нужно запущенной задаче обработчика, кроме самого сообщения.
pub(crate) struct DeliveryContext {
    pub(crate) channel: Arc<str>,
    pub(crate) id: SubscriptionId,
    pub(crate) stats: Arc<StatsCounters>,
    pub(crate) log_failures: bool,
}

impl DeliveryContext {
    /// Уровень события о сбое: из статус-кода ошибки, либо DEBUG, если
    /// логирование сбоев отключено в конфигурации канала.
    fn failure_log_level(
        &self,
        err: &ChannelError,
    ) -> LogLevel {
        if self.log_failures {
            err.status_code().log_level()
        } else {
            LogLevel::Debug
        }
    }

    fn report_failure(
        &self,
        reason: String,
    ) {
        self.stats.record_handler_failure();
        let err = ChannelError::HandlerFailed {
            channel: self.channel.to_string(),
            id: self.id.as_u64(),
            reason,
        };

        macro_rules! emit {
            ($lvl:ident) => {
                tracing::$lvl!(
                    channel = %self.channel,
                    subscription = %self.id,
                    status = %err.status_code(),
                    error = %err,
                    "Subscription handler failed"
                )
            };
        }

        match self.failure_log_level(&err) {
            LogLevel::Error => emit!(error),
            LogLevel::Warn => emit!(warn),
            LogLevel::Info => emit!(info),
            LogLevel::Debug => emit!(debug),
            LogLevel::Trace => emit!(trace),
        }
    }
}

/// Запускает обработчик отдельной задачей и не ждёт её.
///
/// Ошибка или паника обработчика остаются внутри задачи: подписка остаётся
/// зарегистрированной, издатель ничего не узнаёт.
pub(crate) fn dispatch<M>(
    runtime: &Handle,
    handler: Arc<HandlerFn<M>>,
    message: M,
    ctx: DeliveryContext,
) where
    M: Send + 'static,
{
    runtime.spawn(async move {
        let outcome = AssertUnwindSafe(async move { handler(message).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => ctx.stats.record_handled(),
            Ok(Err(err)) => ctx.report_failure(format!("{err:#}")),
            Err(panic) => ctx.report_failure(format!("panicked: {}", panic_message(&*panic))),
        }
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Push-подписка: на каждое сообщение запускает обработчик.
///
/// Снимается с канала при `cancel()` или при `Drop`. Если хендл не нужен,
/// используйте [`detach`](Self::detach).
pub struct CallbackSubscription<M> {
    registration: Registration<M>,
    detached: bool,
}

impl<M> CallbackSubscription<M> {
    pub(crate) fn new(registration: Registration<M>) -> Self {
        Self {
            registration,
            detached: false,
        }
    }

    /// Отпускает хендл, оставляя подписку зарегистрированной.
    ///
    /// Подписка живёт до `Channel::unsubscribe_all` или до уничтожения
    /// канала.
    pub fn detach(mut self) -> SubscriptionId {
        self.detached = true;
        self.registration.id()
    }
}

impl<M> Subscription for CallbackSubscription<M>
where
    M: Send,
{
    fn id(&self) -> SubscriptionId {
        self.registration.id()
    }

    fn kind(&self) -> SubscriptionKind {
        SubscriptionKind::Callback
    }

    fn cancel(&self) {
        self.registration.cancel();
    }

    fn is_alive(&self) -> bool {
        self.registration.is_alive()
    }
}

impl<M> Drop for CallbackSubscription<M> {
    fn drop(&mut self) {
        if !self.detached {
            self.registration.cancel();
        }
    }
}

impl<M> fmt::Debug for CallbackSubscription<M> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CallbackSubscription")
            .field("registration", &self.registration)
            .field("detached", &self.detached)
            .finish()
    }
}
