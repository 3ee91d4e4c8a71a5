pub mod cache;
pub mod db;
pub mod models;

pub use cache::{KeyValueStore, RedisStore, SettingsRepository};
pub use db::Database;
pub use models::{User, UserRole};
