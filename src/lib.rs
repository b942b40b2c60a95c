//! Именованные внутрипроцессные каналы publish/subscribe.
//!
//! [`Channel`] рассылает сообщения push-подпискам (обработчик запускается
//! отдельной задачей tokio) и pull-подпискам (у каждой своя FIFO-очередь).
//!
//! ```ignore
//! let channel = subpub::Channel::new("orders");
//!
//! let _audit = channel.subscribe(|order: String| println!("audit: {order}"))?;
//! let mut queue = channel.get_subscription()?;
//!
//! channel.publish("order #1".to_string());
//!
//! let mut scope = queue.enter();
//! assert_eq!(scope.get().await?, "order #1");
//! ```

/// Settings loading: channel options and logging.
pub mod config;
/// Logging setup on top of `tracing-subscriber`.
pub mod logging;
/// Pub/Sub: Channel, callback and queue subscriptions.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Settings.
pub use config::{ChannelConfig, Settings};
/// Logging.
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError};
/// Pub/Sub API.
pub use pubsub::{
    CallbackSubscription, Channel, ChannelStats, HandlerOutput, QueueScope, QueueSubscription,
    Subscription, SubscriptionId, SubscriptionInfo, SubscriptionKind,
};
/// Errors and status codes.
pub use subpub_error::{ChannelError, ChannelResult, ErrorExt, StatusCode};
