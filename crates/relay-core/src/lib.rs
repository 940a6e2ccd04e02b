//! Core domain + application logic for the relay bot.
//!
//! This crate is framework-agnostic. Telegram lives behind the
//! [`messaging::port::MessagingPort`] trait, implemented in the adapter crate.

pub mod broadcast;
pub mod config;
pub mod domain;
pub mod engine;
pub mod envelope;
pub mod errors;
pub mod links;
pub mod logging;
pub mod messaging;
pub mod scheduler;
pub mod session;

#[cfg(test)]
pub mod testing;

pub use errors::{Error, Result};
