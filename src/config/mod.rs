//! Configuration module for gatherer.
//!
//! Handles connection configuration, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{ConnectionError, Driver};
pub use settings::{
    expand_env_vars, ConnectionSettings, PoolSettings, RenderSettings, Settings, SettingsError,
    WorkerSettings, CONFIG_ENV,
};
