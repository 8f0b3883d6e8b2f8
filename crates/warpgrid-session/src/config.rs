//! Session configuration.
//!
//! Loaded from the `[session]` table of a TOML file or from a standalone
//! TOML document:
//!
//! ```toml
//! reader_timeout = "30s"
//! writer_timeout = "500ms"
//! max_header_size = 131072
//! ```
//!
//! Durations accept `ms`, `s` and `m` suffixes; a bare number is seconds.
//! `"0"` disables the timeout.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default upper bound for an encoded header buffer (128 KiB).
pub const DEFAULT_MAX_HEADER_SIZE: usize = 128 * 1024;

/// Per-session I/O settings applied by the pool connector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Timeout for reading the response. Zero means none.
    #[serde(deserialize_with = "deserialize_duration")]
    pub reader_timeout: Duration,
    /// Timeout for writing the request. Zero means none.
    #[serde(deserialize_with = "deserialize_duration")]
    pub writer_timeout: Duration,
    /// Largest encoded header buffer a session will send.
    pub max_header_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reader_timeout: Duration::ZERO,
            writer_timeout: Duration::ZERO,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    session: SessionConfig,
}

impl SessionConfig {
    /// Parse a standalone TOML document.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read the `[session]` table of a TOML file. A missing table yields
    /// the defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;
        Ok(file.session)
    }
}

/// Parse a duration string such as `"30s"`, `"500ms"`, `"2m"` or `"10"`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(u64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Text(text) => parse_duration(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration: {text:?}"))),
    }
}
