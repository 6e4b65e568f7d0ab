//! Version codec
//!
//! Reads and rewrites the semantic version embedded in a version file. The
//! codec works on raw bytes and never touches the filesystem; callers load and
//! persist the file themselves.
//!
//! Only the matched value span is ever rewritten. Everything else in the file,
//! including other occurrences of the same version string, is preserved
//! byte-for-byte.

mod pattern;

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use tracing::debug;

use crate::domain::Version;
use crate::error::{Result, TaggerError};

/// Supported version file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// PHP constant, e.g. `define('VERSION', '1.2.3');`
    Php,
    /// YAML mapping entry, e.g. `version: 1.2.3`
    Yaml,
    /// JSON object member, e.g. `"version": "1.2.3"`
    Json,
}

impl FileFormat {
    /// Extract the version assigned to `key` from `content`
    pub fn read_version(&self, content: &[u8], key: &str) -> Result<Version> {
        let span = self.locate(content, key)?;
        let text = std::str::from_utf8(&content[span]).map_err(|_| {
            TaggerError::parse(format!("Value of '{}' is not valid UTF-8", key))
        })?;

        Version::parse(text)
    }

    /// Replace the version assigned to `key` with `new_version`.
    ///
    /// `old_version` must be the value currently in the matched span; a
    /// mismatch means the file changed since it was read and is rejected.
    pub fn write_version(
        &self,
        content: &[u8],
        key: &str,
        old_version: &str,
        new_version: &Version,
    ) -> Result<Vec<u8>> {
        let span = self.locate(content, key)?;
        if &content[span.clone()] != old_version.as_bytes() {
            return Err(TaggerError::parse(format!(
                "Expected '{}' to be {} but found '{}'",
                key,
                old_version,
                String::from_utf8_lossy(&content[span])
            )));
        }

        let replacement = new_version.to_string();
        debug!(
            format = %self,
            key,
            start = span.start,
            end = span.end,
            "rewriting version value"
        );

        let mut updated = Vec::with_capacity(content.len() + replacement.len());
        updated.extend_from_slice(&content[..span.start]);
        updated.extend_from_slice(replacement.as_bytes());
        updated.extend_from_slice(&content[span.end..]);
        Ok(updated)
    }

    /// Byte range of the version value for `key`
    fn locate(&self, content: &[u8], key: &str) -> Result<Range<usize>> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Err(TaggerError::parse("Version file is empty"));
        }

        let re = pattern::build(*self, key)?;
        re.captures(content)
            .and_then(|captures| captures.name(pattern::VALUE_GROUP))
            .map(|value| value.range())
            .ok_or_else(|| {
                TaggerError::parse(format!(
                    "Cannot find version key '{}' in {} version file",
                    key, self
                ))
            })
    }
}

impl FromStr for FileFormat {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "php" => Ok(FileFormat::Php),
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            "json" => Ok(FileFormat::Json),
            other => Err(TaggerError::configuration(format!(
                "Unsupported version file format '{}' (expected php, yaml or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileFormat::Php => "php",
            FileFormat::Yaml => "yaml",
            FileFormat::Json => "json",
        };
        f.write_str(name)
    }
}

/// A file format bound to the key holding the version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCodec {
    pub format: FileFormat,
    pub key: String,
}

impl VersionCodec {
    pub fn new(format: FileFormat, key: impl Into<String>) -> Self {
        VersionCodec {
            format,
            key: key.into(),
        }
    }

    pub fn read(&self, content: &[u8]) -> Result<Version> {
        self.format.read_version(content, &self.key)
    }

    pub fn write(&self, content: &[u8], old_version: &str, new_version: &Version) -> Result<Vec<u8>> {
        self.format
            .write_version(content, &self.key, old_version, new_version)
    }
}
