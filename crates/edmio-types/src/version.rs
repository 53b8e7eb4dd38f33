use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Version of the on-disk schema a file was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

/// The schema version this build reads and writes.
pub const BUILD_VERSION: SchemaVersion = SchemaVersion::new(0, 16, 2);

impl SchemaVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns `true` if a file written at `self` is too new for a reader at `reader`.
    ///
    /// Only major and minor take part: a newer patch level is always readable.
    pub fn is_newer_than(&self, reader: &SchemaVersion) -> bool {
        self.major > reader.major || (self.major == reader.major && self.minor > reader.minor)
    }

    /// Returns `true` if this build can read a file written at `self`.
    pub fn is_readable(&self) -> bool {
        !self.is_newer_than(&BUILD_VERSION)
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        BUILD_VERSION
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(TypeError::InvalidVersion(s.to_string()));
        }
        let mut nums = [0u16; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| TypeError::InvalidVersion(s.to_string()))?;
        }
        Ok(Self::new(nums[0], nums[1], nums[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_major_is_rejected() {
        let reader = SchemaVersion::new(0, 16, 2);
        assert!(SchemaVersion::new(1, 0, 0).is_newer_than(&reader));
    }

    #[test]
    fn newer_minor_same_major_is_rejected() {
        let reader = SchemaVersion::new(0, 16, 2);
        assert!(SchemaVersion::new(0, 17, 0).is_newer_than(&reader));
    }

    #[test]
    fn newer_patch_is_accepted() {
        let reader = SchemaVersion::new(0, 16, 2);
        assert!(!SchemaVersion::new(0, 16, 9).is_newer_than(&reader));
    }

    #[test]
    fn older_major_with_larger_minor_is_accepted() {
        let reader = SchemaVersion::new(1, 2, 0);
        assert!(!SchemaVersion::new(0, 99, 0).is_newer_than(&reader));
    }

    #[test]
    fn build_version_reads_itself() {
        assert!(BUILD_VERSION.is_readable());
    }

    #[test]
    fn parse_full_and_partial() {
        assert_eq!("1.2.3".parse::<SchemaVersion>().unwrap(), SchemaVersion::new(1, 2, 3));
        assert_eq!("0.16".parse::<SchemaVersion>().unwrap(), SchemaVersion::new(0, 16, 0));
    }

    #[test]
    fn parse_garbage_fails() {
        assert!(matches!(
            "one.two".parse::<SchemaVersion>(),
            Err(TypeError::InvalidVersion(_))
        ));
        assert!("1.2.3.4".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn display_is_dotted() {
        assert_eq!(SchemaVersion::new(0, 16, 2).to_string(), "0.16.2");
    }
}
