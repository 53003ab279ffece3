//! Chatline terminal client.
//!
//! Line-oriented front end over [`chatline_client`]: stdin lines become
//! commands or chat text, snapshot changes become printed lines.
//!
//! # Components
//!
//! - [`Args`]: command-line and environment configuration
//! - [`commands`]: input line parsing
//! - [`render`]: snapshot-to-text rendering
//! - [`session`]: the interactive loop

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
mod config;
mod error;
pub mod render;
pub mod session;

pub use config::Args;
pub use error::CliError;
