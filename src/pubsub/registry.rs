use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;
use tokio::{runtime::Handle, sync::mpsc};

use super::{
    callback::HandlerFn,
    subscription::{Liveness, SubscriptionId, SubscriptionInfo, SubscriptionKind},
};

/// Куда доставлять сообщения конкретной подписки.
pub(crate) enum Endpoint<M> {
    /// Обработчик, запускаемый отдельной задачей на `runtime`.
    Callback {
        handler: Arc<HandlerFn<M>>,
        runtime: Handle,
    },
    /// Очередь pull-подписчика. Запись синхронная.
    Queue(mpsc::UnboundedSender<M>),
}

impl<M> Endpoint<M> {
    pub(crate) fn kind(&self) -> SubscriptionKind {
        match self {
            Self::Callback { .. } => SubscriptionKind::Callback,
            Self::Queue(_) => SubscriptionKind::Queue,
        }
    }
}

pub(crate) struct Entry<M> {
    pub(crate) liveness: Arc<Liveness>,
    pub(crate) endpoint: Endpoint<M>,
}

/// Реестр подписок канала.
///
/// `BTreeMap` по возрастающему id хранит порядок вставки. Все изменения идут
/// под write-lock, публикация обходит реестр под read-lock, поэтому
/// регистрация и отмена атомарны относительно `publish`.
pub(crate) struct Registry<M> {
    entries: RwLock<BTreeMap<SubscriptionId, Entry<M>>>,
    next_id: AtomicU64,
}

impl<M> Registry<M> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Регистрирует новую подписку.
    ///
    /// При заполненном реестре возвращает `Err(limit)`.
    pub(crate) fn insert(
        &self,
        endpoint: Endpoint<M>,
        limit: Option<usize>,
    ) -> Result<(SubscriptionId, Arc<Liveness>), usize> {
        let mut entries = self.entries.write();
        if let Some(limit) = limit {
            if entries.len() >= limit {
                // endpoint уничтожается вне блокировки, как и в `remove`
                drop(entries);
                drop(endpoint);
                return Err(limit);
            }
        }

        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let liveness = Arc::new(Liveness::new());
        entries.insert(
            id,
            Entry {
                liveness: Arc::clone(&liveness),
                endpoint,
            },
        );
        Ok((id, liveness))
    }

    /// Удаляет подписку. Запись уничтожается уже после снятия write-lock:
    /// обработчик может владеть другими подписками этого канала, и их `Drop`
    /// снова заходит в реестр.
    pub(crate) fn remove(
        &self,
        id: SubscriptionId,
    ) -> bool {
        let removed = self.entries.write().remove(&id);
        removed.is_some()
    }

    /// Удаляет все подписки и помечает их мёртвыми. Возвращает число
    /// удалённых.
    pub(crate) fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.write());
        for entry in drained.values() {
            entry.liveness.kill();
        }
        drained.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn snapshot(&self) -> Vec<SubscriptionInfo> {
        self.entries
            .read()
            .iter()
            .map(|(id, entry)| SubscriptionInfo {
                id: *id,
                kind: entry.endpoint.kind(),
            })
            .collect()
    }

    /// Обходит живые подписки в порядке регистрации, удерживая read-lock.
    ///
    /// `f` не должен регистрировать или отменять подписки этого же канала.
    pub(crate) fn for_each_live(
        &self,
        mut f: impl FnMut(SubscriptionId, &Endpoint<M>),
    ) {
        let entries = self.entries.read();
        for (id, entry) in entries.iter() {
            if entry.liveness.is_alive() {
                f(*id, &entry.endpoint);
            }
        }
    }
}
