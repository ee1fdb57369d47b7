//! CLI command implementations.
//!
//! - [`classify`] - Request classification preview
//! - [`config`] - Configuration management (path, show, init)
//! - [`demo`] - Scripted session against in-process backends
//! - [`offline`] - Offline fallback page

pub mod classify;
pub mod config;
pub mod demo;
pub mod offline;
