//! Tubecast - YouTube to audio Telegram bot
//!
//! This library crate exposes the core functionality for integration testing.

pub mod bot;
pub mod config;
pub mod telegram;
