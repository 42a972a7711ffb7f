//! Discord REST implementation of the chat platform port.

mod client;
mod config;
mod models;

pub use client::DiscordClient;
pub use config::DiscordConfig;
