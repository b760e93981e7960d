//! Configuration types for the chore engine.

use crate::error::{ChoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level engine configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Snapshot file location. `None` picks the platform default.
    pub state_path: Option<PathBuf>,
    /// Notification emission toggles.
    pub notify: NotifyConfig,
    /// Rollover scheduler settings.
    pub rollover: RolloverConfig,
}

/// Per-kind notification toggles. Disabled kinds are simply not emitted;
/// the state change itself is never affected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Emit an event when a task reaches `awaiting_approval` (or a bonus is
    /// marked done).
    pub task_complete: bool,
    /// Emit an event on successful shop purchases.
    pub shop_purchase: bool,
    /// Include the item image in purchase events.
    pub purchase_image: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            task_complete: true,
            shop_purchase: true,
            purchase_image: true,
        }
    }
}

/// Rollover scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloverConfig {
    /// Seconds between date checks. The pass itself only runs when the
    /// local calendar date changes.
    pub tick_secs: u64,
    /// Run one rollover pass immediately when the scheduler starts, to
    /// cover a process that was down at the midnight boundary.
    pub eager_on_start: bool,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            tick_secs: 60,
            eager_on_start: true,
        }
    }
}

impl BoardConfig {
    /// Parse a configuration from TOML text. Missing fields take defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ChoreError::Config(format!("invalid config: {e}")))
    }

    /// Load a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ChoreError::Config(format!(
                    "cannot read {}: {e}",
                    path.display()
                )));
            }
        };
        Self::from_toml(&text)
    }
}
