use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Playback options baked into the LSO header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Options {
    /// Wrap back to frame 0 after the last frame
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Interpolate between frames instead of stepping
    pub smooth: bool,
    /// Go dark after the last frame instead of holding it.
    /// Only meaningful when `looping` is false.
    #[serde(alias = "dark after")]
    pub dark_after: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            looping: true,
            smooth: true,
            dark_after: false,
        }
    }
}

impl Options {
    /// Load options from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        let options: Options = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse options file {}", path.display()))?;
        Ok(options)
    }

    /// Settle dependent fields. A looping script never has a last frame,
    /// so `dark_after` is dropped when `looping` is set.
    pub fn resolved(self) -> Self {
        Options {
            dark_after: self.dark_after && !self.looping,
            ..self
        }
    }
}
