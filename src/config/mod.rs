//! Загрузка настроек: канал и логирование.

pub mod channel;
pub mod settings;

pub use channel::ChannelConfig;
pub use settings::Settings;
