//! # lodge-settings
//!
//! Configuration for the lodge aggregate store, loaded from three layers
//! (in priority order):
//! 1. **Compiled defaults**: [`LodgeSettings::default()`]
//! 2. **User file**: `~/.lodge/settings.json`, deep-merged over defaults
//! 3. **Environment variables**: `LODGE_*` overrides
//!
//! Settings are plain values handed to constructors; nothing here is global.
//!
//! ```no_run
//! let settings = lodge_settings::load_settings().unwrap_or_default();
//! println!("consolidate every {} records", settings.consolidation.num_records);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
