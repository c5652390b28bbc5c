pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod ui;

pub use api::{ChatApi, ChatEntry, ChatId, HttpChatClient};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
