//! Shared data types: configuration document, structured model, resolved
//! plugin configuration and cell geometry.

pub mod config;
pub mod geometry;
pub mod resolved;
