//! Configuration loading, validation, and env substitution.
//!
//! Config files: `muster.toml`, `muster.yaml`, or `muster.json`
//! Searched in `./` then `~/.config/muster/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, which is the
//! intended way to keep the API hash and bot token out of the file.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        CoreConfig, DataConfig, GatewayConfig, MusterConfig, NotifyConfig, RunSettings,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
