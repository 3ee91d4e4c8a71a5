pub mod config;
pub mod error;
pub mod i18n;
pub mod notification;
pub mod storage;
pub mod telegram;
pub mod utils;

pub use config::Config;
pub use error::{NotifyError, Result};
