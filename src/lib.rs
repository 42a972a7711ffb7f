//! Library crate for compat-list-bot, exposing modules for the binary and tests.

pub mod commands;
pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod platform;
pub mod routes;
pub mod services;
pub mod state;
