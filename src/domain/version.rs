use crate::error::{Result, TaggerError};
use std::fmt;
use std::str::FromStr;

/// Semantic version representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a strict `MAJOR.MINOR.PATCH` string.
    ///
    /// Prefixes (`v1.2.3`), pre-release and build metadata are rejected: the
    /// version is used verbatim as a tag name, so it has to round-trip through
    /// `Display` unchanged.
    pub fn parse(text: &str) -> Result<Self> {
        let parsed = semver::Version::parse(text).map_err(|e| {
            TaggerError::parse(format!(
                "Invalid version '{}' - expected MAJOR.MINOR.PATCH: {}",
                text, e
            ))
        })?;

        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(TaggerError::parse(format!(
                "Invalid version '{}' - pre-release and build metadata are not supported",
                text
            )));
        }

        Ok(Version {
            major: component(text, parsed.major)?,
            minor: component(text, parsed.minor)?,
            patch: component(text, parsed.patch)?,
        })
    }

    /// Bump version according to bump type.
    ///
    /// Fails when the bumped component is already `u32::MAX`.
    pub fn bump(&self, bump_type: VersionBump) -> Result<Self> {
        let next = match bump_type {
            VersionBump::Major => self.major.checked_add(1).map(|major| Version {
                major,
                minor: 0,
                patch: 0,
            }),
            VersionBump::Minor => self.minor.checked_add(1).map(|minor| Version {
                major: self.major,
                minor,
                patch: 0,
            }),
            VersionBump::Patch => self.patch.checked_add(1).map(|patch| Version {
                major: self.major,
                minor: self.minor,
                patch,
            }),
        };

        next.ok_or_else(|| {
            TaggerError::input(format!(
                "Cannot apply a {} bump to {}: the component is already at its maximum",
                bump_type, self
            ))
        })
    }
}

fn component(text: &str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        TaggerError::parse(format!(
            "Invalid version '{}' - component {} is too large",
            text, value
        ))
    })
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionBump::Major => f.write_str("major"),
            VersionBump::Minor => f.write_str("minor"),
            VersionBump::Patch => f.write_str("patch"),
        }
    }
}

/// What the operator asked for at the bump prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpRequest {
    Bump(VersionBump),
    Explicit(Version),
}

impl BumpRequest {
    /// Parse operator input: `major`, `minor`, `patch` (case-insensitive) or an explicit `x.y.z`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        match input.to_ascii_lowercase().as_str() {
            "major" => Ok(BumpRequest::Bump(VersionBump::Major)),
            "minor" => Ok(BumpRequest::Bump(VersionBump::Minor)),
            "patch" => Ok(BumpRequest::Bump(VersionBump::Patch)),
            "" => Err(TaggerError::input(
                "expected 'major', 'minor', 'patch' or an explicit version",
            )),
            _ => Version::parse(input)
                .map(BumpRequest::Explicit)
                .map_err(|_| {
                    TaggerError::input(format!(
                        "'{}' is neither a bump keyword nor a valid MAJOR.MINOR.PATCH version",
                        input
                    ))
                }),
        }
    }

    /// Compute the next version from the current one
    pub fn apply(&self, current: &Version) -> Result<Version> {
        match self {
            BumpRequest::Bump(bump) => current.bump(*bump),
            BumpRequest::Explicit(version) => Ok(*version),
        }
    }
}
