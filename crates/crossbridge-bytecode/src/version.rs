use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Release level nibble of a packed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseLevel {
    Alpha,
    Beta,
    Candidate,
    Final,
}

impl ReleaseLevel {
    fn nibble(self) -> u32 {
        match self {
            ReleaseLevel::Alpha => 0xA,
            ReleaseLevel::Beta => 0xB,
            ReleaseLevel::Candidate => 0xC,
            ReleaseLevel::Final => 0xF,
        }
    }

    fn from_nibble(nibble: u32) -> Option<Self> {
        match nibble {
            0xA => Some(ReleaseLevel::Alpha),
            0xB => Some(ReleaseLevel::Beta),
            0xC => Some(ReleaseLevel::Candidate),
            0xF => Some(ReleaseLevel::Final),
            _ => None,
        }
    }
}

/// Version tag of the source runtime that produced a body.
///
/// Serialized as `"3.11.0"`; pre-releases as `"3.12.0b2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuntimeVersion {
    pub major: u8,
    pub minor: u8,
    pub micro: u8,
    pub level: ReleaseLevel,
    pub serial: u8,
}

impl RuntimeVersion {
    pub const fn new(major: u8, minor: u8, micro: u8) -> Self {
        RuntimeVersion { major, minor, micro, level: ReleaseLevel::Final, serial: 0 }
    }

    /// Unpacks the `0xMMmmuuLS` layout of `sys.hexversion`.
    pub fn from_hex(hex: u32) -> CodecResult<Self> {
        let level = ReleaseLevel::from_nibble((hex >> 4) & 0xF).ok_or_else(|| CodecError::MalformedEncoding {
            offset: 0,
            reason: format!("{hex:#010x} has no valid release level"),
        })?;
        Ok(RuntimeVersion {
            major: (hex >> 24) as u8,
            minor: (hex >> 16) as u8,
            micro: (hex >> 8) as u8,
            level,
            serial: (hex & 0xF) as u8,
        })
    }

    pub fn hex(&self) -> u32 {
        u32::from(self.major) << 24
            | u32::from(self.minor) << 16
            | u32::from(self.micro) << 8
            | self.level.nibble() << 4
            | u32::from(self.serial)
    }

    pub fn major_minor(&self) -> (u8, u8) {
        (self.major, self.minor)
    }
}

impl Default for RuntimeVersion {
    fn default() -> Self {
        RuntimeVersion::new(3, 11, 0)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        match self.level {
            ReleaseLevel::Final => Ok(()),
            ReleaseLevel::Alpha => write!(f, "a{}", self.serial),
            ReleaseLevel::Beta => write!(f, "b{}", self.serial),
            ReleaseLevel::Candidate => write!(f, "rc{}", self.serial),
        }
    }
}

impl FromStr for RuntimeVersion {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid runtime version {text:?}");
        let split = text.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(text.len());
        let (numbers, suffix) = text.split_at(split);
        let parts = numbers
            .split('.')
            .map(|part| part.parse::<u8>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        let (major, minor, micro) = match parts.as_slice() {
            [major, minor] => (*major, *minor, 0),
            [major, minor, micro] => (*major, *minor, *micro),
            _ => return Err(invalid()),
        };
        let (level, serial) = if suffix.is_empty() {
            (ReleaseLevel::Final, 0)
        } else {
            let (level, serial) = if let Some(serial) = suffix.strip_prefix("rc") {
                (ReleaseLevel::Candidate, serial)
            } else if let Some(serial) = suffix.strip_prefix('a') {
                (ReleaseLevel::Alpha, serial)
            } else if let Some(serial) = suffix.strip_prefix('b') {
                (ReleaseLevel::Beta, serial)
            } else {
                return Err(invalid());
            };
            (level, serial.parse::<u8>().map_err(|_| invalid())?)
        };
        Ok(RuntimeVersion { major, minor, micro, level, serial })
    }
}

impl TryFrom<String> for RuntimeVersion {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<RuntimeVersion> for String {
    fn from(version: RuntimeVersion) -> Self {
        version.to_string()
    }
}

/// Inclusive `(major, minor)` range of supported runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionWindow {
    pub min: (u8, u8),
    pub max: (u8, u8),
}

impl Default for VersionWindow {
    fn default() -> Self {
        VersionWindow { min: (3, 10), max: (3, 12) }
    }
}

impl VersionWindow {
    pub fn contains(&self, version: &RuntimeVersion) -> bool {
        (self.min..=self.max).contains(&version.major_minor())
    }

    pub fn check(&self, version: &RuntimeVersion) -> CodecResult<()> {
        if self.contains(version) {
            Ok(())
        } else {
            Err(CodecError::UnsupportedRuntimeVersion { found: *version, window: *self })
        }
    }
}

impl fmt::Display for VersionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} to {}.{}", self.min.0, self.min.1, self.max.0, self.max.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_layout_matches_packed_versions() {
        let version = RuntimeVersion::from_hex(0x030b04f0).unwrap();
        assert_eq!(version, RuntimeVersion::new(3, 11, 4));
        assert_eq!(version.hex(), 0x030b04f0);
        assert_eq!("3.12.0b2".parse::<RuntimeVersion>().unwrap().hex(), 0x030c00b2);
    }

    #[test]
    fn window_is_inclusive_on_minor_versions() {
        let window = VersionWindow::default();
        assert!(window.contains(&RuntimeVersion::new(3, 10, 0)));
        assert!(window.contains(&RuntimeVersion::new(3, 12, 9)));
        assert!(!window.contains(&RuntimeVersion::new(3, 9, 18)));
        assert!(window.check(&RuntimeVersion::new(3, 13, 0)).is_err());
    }
}
