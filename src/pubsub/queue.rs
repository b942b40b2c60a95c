use std::{fmt, sync::Arc};

use subpub_error::{ChannelError, ChannelResult};
use tokio::sync::mpsc::{self, error::TryRecvError};

use super::subscription::{Registration, Subscription, SubscriptionId, SubscriptionKind};

/// Pull-подписка с собственной неограниченной FIFO-очередью.
///
/// `publish` кладёт сообщение в очередь синхронно, поэтому `get()` видит
/// всё, что было опубликовано до его вызова, в порядке публикации.
///
/// Отписка происходит при `cancel()`, при выходе из [`QueueScope`] и при
/// `Drop`.
pub struct QueueSubscription<M> {
    registration: Registration<M>,
    receiver: mpsc::UnboundedReceiver<M>,
    channel: Arc<str>,
}

impl<M> QueueSubscription<M> {
    pub(crate) fn new(
        registration: Registration<M>,
        receiver: mpsc::UnboundedReceiver<M>,
        channel: Arc<str>,
    ) -> Self {
        Self {
            registration,
            receiver,
            channel,
        }
    }

    /// Имя канала, на который оформлена подписка.
    pub fn channel_name(&self) -> &str {
        &self.channel
    }

    /// Асинхронно ожидает следующее сообщение.
    ///
    /// # Возвращает
    /// - `Ok(M)`: следующее сообщение в порядке публикации
    /// - `Err(ChannelError::Cancelled)`: подписка отменена
    /// - `Err(ChannelError::Closed)`: канал уничтожен и очередь пуста
    pub async fn get(&mut self) -> ChannelResult<M> {
        self.ensure_registered()?;
        match self.receiver.recv().await {
            Some(message) => Ok(message),
            None => Err(self.disconnected_error()),
        }
    }

    /// Забирает сообщение без ожидания. `Ok(None)`, если очередь пуста.
    pub fn try_get(&mut self) -> ChannelResult<Option<M>> {
        self.ensure_registered()?;
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(self.disconnected_error()),
        }
    }

    /// Количество сообщений, ожидающих в очереди.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Входит в scope подписки.
    ///
    /// При выходе из scope любым путём (обычный возврат, `?`, паника)
    /// подписка снимается с канала, а буфер освобождается.
    pub fn enter(&mut self) -> QueueScope<'_, M> {
        QueueScope { subscription: self }
    }

    fn ensure_registered(&self) -> ChannelResult<()> {
        if self.registration.is_registered() {
            Ok(())
        } else {
            Err(ChannelError::Cancelled {
                id: self.registration.id().as_u64(),
            })
        }
    }

    fn disconnected_error(&self) -> ChannelError {
        if self.registration.is_registered() {
            ChannelError::Closed {
                channel: self.channel.to_string(),
            }
        } else {
            ChannelError::Cancelled {
                id: self.registration.id().as_u64(),
            }
        }
    }

    /// Закрывает очередь и выбрасывает непрочитанные сообщения.
    fn release(&mut self) {
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

impl<M> Subscription for QueueSubscription<M>
where
    M: Send,
{
    fn id(&self) -> SubscriptionId {
        self.registration.id()
    }

    fn kind(&self) -> SubscriptionKind {
        SubscriptionKind::Queue
    }

    fn cancel(&self) {
        self.registration.cancel();
    }

    fn is_alive(&self) -> bool {
        self.registration.is_alive()
    }
}

impl<M> Drop for QueueSubscription<M> {
    fn drop(&mut self) {
        self.registration.cancel();
    }
}

impl<M> fmt::Debug for QueueSubscription<M> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("QueueSubscription")
            .field("channel", &self.channel)
            .field("registration", &self.registration)
            .field("pending", &self.receiver.len())
            .finish()
    }
}

/// Scoped-доступ к [`QueueSubscription`].
///
/// ```ignore
/// let mut sub = channel.get_subscription()?;
/// let first = {
///     let mut scope = sub.enter();
///     scope.get().await?
/// }; // здесь подписка уже снята с канала
/// ```
pub struct QueueScope<'a, M> {
    subscription: &'a mut QueueSubscription<M>,
}

impl<M> QueueScope<'_, M> {
    pub fn id(&self) -> SubscriptionId {
        self.subscription.registration.id()
    }

    pub async fn get(&mut self) -> ChannelResult<M> {
        self.subscription.get().await
    }

    pub fn try_get(&mut self) -> ChannelResult<Option<M>> {
        self.subscription.try_get()
    }

    pub fn len(&self) -> usize {
        self.subscription.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscription.is_empty()
    }
}

impl<M> Drop for QueueScope<'_, M> {
    fn drop(&mut self) {
        self.subscription.registration.cancel();
        self.subscription.release();
    }
}
