use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use super::channel::Shared;

/// Идентификатор подписки, уникальный в пределах одного канала.
///
/// Выдаётся по возрастанию, поэтому порядок идентификаторов совпадает с
/// порядком регистрации.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Модель доставки подписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// Push: канал сам вызывает обработчик.
    Callback,
    /// Pull: потребитель забирает сообщения из своей очереди.
    Queue,
}

/// Снимок одной зарегистрированной подписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub kind: SubscriptionKind,
}

/// Общий контракт подписок: отмена и признак жизни.
///
/// Реализуется [`CallbackSubscription`](super::CallbackSubscription) и
/// [`QueueSubscription`](super::QueueSubscription), поэтому код, которому
/// нужно только отписаться, может хранить `Box<dyn Subscription>`.
pub trait Subscription: Send + Sync {
    fn id(&self) -> SubscriptionId;

    fn kind(&self) -> SubscriptionKind;

    /// Снимает подписку с канала. Повторный вызов ничего не делает.
    ///
    /// После возврата подписка отсутствует в реестре и не получает сообщений
    /// от последующих вызовов `publish`.
    fn cancel(&self);

    /// `true`, пока подписка зарегистрирована и канал существует.
    fn is_alive(&self) -> bool;
}

/// Флаг жизни, общий для записи в реестре и хендла подписки.
#[derive(Debug)]
pub(crate) struct Liveness {
    alive: AtomicBool,
}

impl Liveness {
    pub(crate) fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Помечает подписку мёртвой. Возвращает `true` только для вызова,
    /// который действительно сменил состояние.
    pub(crate) fn kill(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }
}

/// Связь хендла подписки с реестром канала.
///
/// Держит канал через `Weak`: живые подписки не продлевают жизнь канала.
pub(crate) struct Registration<M> {
    id: SubscriptionId,
    kind: SubscriptionKind,
    liveness: Arc<Liveness>,
    shared: Weak<Shared<M>>,
}

impl<M> Registration<M> {
    pub(crate) fn new(
        id: SubscriptionId,
        kind: SubscriptionKind,
        liveness: Arc<Liveness>,
        shared: Weak<Shared<M>>,
    ) -> Self {
        Self {
            id,
            kind,
            liveness,
            shared,
        }
    }

    pub(crate) fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn kind(&self) -> SubscriptionKind {
        self.kind
    }

    /// Подписка не отменена (канал при этом может быть уже уничтожен).
    pub(crate) fn is_registered(&self) -> bool {
        self.liveness.is_alive()
    }

    pub(crate) fn channel_exists(&self) -> bool {
        self.shared.strong_count() > 0
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.is_registered() && self.channel_exists()
    }

    pub(crate) fn cancel(&self) {
        if !self.liveness.kill() {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            if shared.registry.remove(self.id) {
                tracing::debug!(
                    channel = %shared.name,
                    subscription = %self.id,
                    kind = ?self.kind,
                    remaining = shared.registry.len(),
                    "Subscription cancelled"
                );
            }
        }
    }
}

impl<M> fmt::Debug for Registration<M> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("alive", &self.is_alive())
            .finish()
    }
}
