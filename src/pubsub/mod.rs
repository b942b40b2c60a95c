//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Этот модуль реализует именованные внутрипроцессные каналы вещания:
//!
//! - `channel`: канал, реестр подписок и публикация сообщений.
//! - `callback`: push-подписки, обработчик запускается отдельной задачей.
//! - `queue`: pull-подписки с собственной FIFO-очередью и scoped-доступом.
//! - `subscription`: общий контракт подписок (`cancel`, признак жизни).
//! - `registry` (приватный): хранилище подписок канала.
//! - `stats`: счётчики публикаций и сбоев обработчиков.

mod callback;
pub mod channel;
mod queue;
mod registry;
mod stats;
pub mod subscription;

pub use callback::{CallbackSubscription, HandlerOutput};
pub use channel::Channel;
pub use queue::{QueueScope, QueueSubscription};
pub use stats::ChannelStats;
pub use subscription::{Subscription, SubscriptionId, SubscriptionInfo, SubscriptionKind};
