//! Layered client configuration
//!
//! Three layers are merged, later ones winning:
//! 1. Built-in defaults
//! 2. User config (~/.config/portal/config.toml, or `--config`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{
    default_state_path, user_config_path, ConfigError, ConfigOrigin, ConfigSource,
    EffectiveConfig, PortalSettings,
};
pub use merge::{deep_merge, merge_layers};
