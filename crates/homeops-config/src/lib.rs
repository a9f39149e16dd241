//! Configuration, filesystem paths and logging setup shared by the HomeOps crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, StoreMode, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, LogFormat};
pub use paths::Paths;
