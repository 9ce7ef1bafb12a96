//! Status enums stored in customer metadata.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Email verification status of a customer.
///
/// Kept in the customer's metadata bag under the `status` key as the
/// lowercase strings `"verified"` / `"unverified"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    #[default]
    Unverified,
}

impl VerificationStatus {
    /// Metadata key holding the status.
    pub const METADATA_KEY: &'static str = "status";

    /// Get the metadata representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
        }
    }

    /// Read the status from a stored metadata value.
    ///
    /// Only the exact string `verified` counts; a missing or unknown value is
    /// unverified.
    #[must_use]
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some("verified") => Self::Verified,
            _ => Self::Unverified,
        }
    }

    /// Interpret a user-supplied flag such as `v=yes`.
    #[must_use]
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "true" | "yes" | "t" | "y" | "verified" => Self::Verified,
            _ => Self::Unverified,
        }
    }

    /// Whether this is [`VerificationStatus::Verified`].
    #[must_use]
    pub const fn is_verified(self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_metadata() {
        assert_eq!(
            VerificationStatus::from_metadata(Some("verified")),
            VerificationStatus::Verified
        );
        assert_eq!(
            VerificationStatus::from_metadata(Some("Verified")),
            VerificationStatus::Unverified
        );
        assert_eq!(
            VerificationStatus::from_metadata(None),
            VerificationStatus::Unverified
        );
    }

    #[test]
    fn test_from_flag() {
        for flag in ["true", "yes", "t", "y", "verified"] {
            assert!(VerificationStatus::from_flag(flag).is_verified(), "{flag}");
        }
        for flag in ["false", "no", "", "1"] {
            assert!(!VerificationStatus::from_flag(flag).is_verified(), "{flag}");
        }
    }

    #[test]
    fn test_display_matches_metadata() {
        assert_eq!(VerificationStatus::Verified.to_string(), "verified");
        assert_eq!(VerificationStatus::Unverified.to_string(), "unverified");
    }
}
