//! Blinken core: configuration, plugin registry, layout engine, tiles and
//! the built-in content sources. Nothing here touches the terminal.

pub mod command;
pub mod config;
pub mod error;
pub mod help;
pub mod layout;
pub mod plugins;
pub mod registry;
pub mod response;
pub mod sys;
pub mod tile;
pub mod types;

pub use error::{Error, Result};
pub use sys::Sys;
