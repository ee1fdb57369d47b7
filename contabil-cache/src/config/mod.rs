//! User configuration for the cache subsystem.
//!
//! Settings live in an INI file at `~/.contabilidadepro/cache.ini`. Every key
//! is optional; missing keys keep their defaults, invalid ones are rejected
//! with [`ConfigFileError::InvalidValue`].
//!
//! # Example
//!
//! ```ignore
//! use contabil_cache::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let cache_config = config.cache_config("user-42");
//! let worker_config = config.worker_config();
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, LoggingSettings, WorkerSettings};
