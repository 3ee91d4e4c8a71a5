pub mod bot;
pub mod callbacks;
pub mod commands;
pub mod formatters;
pub mod transport;

pub use bot::{build_service, run_telegram_bot};
pub use transport::{SentMessage, TeloxideTransport, Transport};
