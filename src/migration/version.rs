//! Ordered application schema versions.

use std::fmt;
use std::str::FromStr;

use crate::couch::AdminError;

/// A released Wikifeat database schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchemaVersion {
    /// 0.1a
    V0_1a,
    /// 0.1.1a
    V0_1_1a,
    /// 0.2a
    V0_2a,
    /// 0.3a
    V0_3a,
    /// 0.3.1a
    V0_3_1a,
    /// 0.4a (also written 0.4.0a)
    V0_4a,
    /// 0.5 (also written 0.5.0)
    V0_5,
}

impl SchemaVersion {
    /// Every version, oldest first.
    pub const ALL: [Self; 7] = [
        Self::V0_1a,
        Self::V0_1_1a,
        Self::V0_2a,
        Self::V0_3a,
        Self::V0_3_1a,
        Self::V0_4a,
        Self::V0_5,
    ];

    /// The oldest version a migration can start from.
    pub const OLDEST: Self = Self::V0_1a;

    /// The newest version.
    pub const LATEST: Self = Self::V0_5;

    /// Canonical label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::V0_1a => "0.1a",
            Self::V0_1_1a => "0.1.1a",
            Self::V0_2a => "0.2a",
            Self::V0_3a => "0.3a",
            Self::V0_3_1a => "0.3.1a",
            Self::V0_4a => "0.4a",
            Self::V0_5 => "0.5",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SchemaVersion {
    type Err = AdminError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let normalised = trimmed.strip_prefix('v').unwrap_or(trimmed);
        match normalised {
            "0.1a" => Ok(Self::V0_1a),
            "0.1.1a" => Ok(Self::V0_1_1a),
            "0.2a" => Ok(Self::V0_2a),
            "0.3a" => Ok(Self::V0_3a),
            "0.3.1a" => Ok(Self::V0_3_1a),
            "0.4a" | "0.4.0a" => Ok(Self::V0_4a),
            "0.5" | "0.5.0" => Ok(Self::V0_5),
            _ => Err(AdminError::Configuration {
                message: format!(
                    "unknown schema version '{value}' (expected one of {})",
                    Self::ALL.map(Self::label).join(", ")
                ),
            }),
        }
    }
}
