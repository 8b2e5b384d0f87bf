//! Installer and launcher for the frp tunneling client
//!
//! `frpc-update` downloads the frpc release matching the current platform
//! into an artifact directory; `frpc` runs it, forwarding arguments,
//! signals, and the exit status.

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod launch;
pub mod platform;

pub use error::{Error, Result};
