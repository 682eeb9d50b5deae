//! Builder and reader options
//!
//! Both option structs deserialize with `#[serde(default)]`, so a TOML file
//! only needs the keys it changes:
//!
//! ```toml
//! sync_on_finalize = false
//!
//! [compression]
//! kind = "zstd"
//! level = 9
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use trailstore_core::{Error, Result};

// ============================================================================
// Compression
// ============================================================================

/// Compression applied to the data section at finalize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Compression {
    /// Store encoded trails as-is
    None,
    /// zstd at the given level
    Zstd {
        /// zstd compression level (1-22)
        level: i32,
    },
}

impl Default for Compression {
    fn default() -> Self {
        Compression::Zstd { level: 3 }
    }
}

// ============================================================================
// Builder Options
// ============================================================================

/// Options controlling how a store is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Data section compression
    pub compression: Compression,
    /// fsync the store file before the final rename
    pub sync_on_finalize: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        BuilderOptions {
            compression: Compression::default(),
            sync_on_finalize: true,
        }
    }
}

impl BuilderOptions {
    /// Fast builds - no compression, no fsync
    pub fn fast() -> Self {
        BuilderOptions {
            compression: Compression::None,
            sync_on_finalize: false,
        }
    }

    /// Smallest files - high zstd level
    pub fn compact() -> Self {
        BuilderOptions {
            compression: Compression::Zstd { level: 19 },
            ..Default::default()
        }
    }

    /// Parse options from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if let Compression::Zstd { level } = self.compression {
            if !(1..=22).contains(&level) {
                return Err(Error::Config(format!(
                    "zstd level {} outside 1..=22",
                    level
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Open Options
// ============================================================================

/// Options controlling how a store is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOptions {
    /// Verify the body checksum before decoding sections
    pub verify_checksum: bool,
    /// Decode every trail at open so later reads cannot hit corruption
    pub validate_trails: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            verify_checksum: true,
            validate_trails: false,
        }
    }
}

impl OpenOptions {
    /// Strict open - verify checksum and decode every trail
    pub fn strict() -> Self {
        OpenOptions {
            verify_checksum: true,
            validate_trails: true,
        }
    }

    /// Fast open - skip the body checksum
    pub fn fast() -> Self {
        OpenOptions {
            verify_checksum: false,
            validate_trails: false,
        }
    }
}
