//! Request category taxonomy
//!
//! Seven IT categories plus two sentinels. Declaration order is pinned: the
//! classifier breaks score ties in favour of the category declared first.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};

/// Help-desk request category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Forgotten passwords, lockouts, login failures
    PasswordReset,
    /// Installing, updating or configuring software
    SoftwareInstallation,
    /// Broken laptops, screens, peripherals
    HardwareFailure,
    /// WiFi, VPN, internet and LAN problems
    NetworkConnectivity,
    /// Mail client setup, sync, distribution lists
    EmailConfiguration,
    /// Malware, phishing, suspected compromise
    SecurityIncident,
    /// Questions about IT policy and compliance
    PolicyQuestion,
    /// Nothing usable in the request
    Unknown,
    /// Outside the IT support domain
    #[serde(alias = "non_it_request")]
    NonIt,
}

impl Category {
    /// Every category in declaration order.
    pub const ALL: [Category; 9] = [
        Self::PasswordReset,
        Self::SoftwareInstallation,
        Self::HardwareFailure,
        Self::NetworkConnectivity,
        Self::EmailConfiguration,
        Self::SecurityIncident,
        Self::PolicyQuestion,
        Self::Unknown,
        Self::NonIt,
    ];

    /// Wire tag, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::SoftwareInstallation => "software_installation",
            Self::HardwareFailure => "hardware_failure",
            Self::NetworkConnectivity => "network_connectivity",
            Self::EmailConfiguration => "email_configuration",
            Self::SecurityIncident => "security_incident",
            Self::PolicyQuestion => "policy_question",
            Self::Unknown => "unknown",
            Self::NonIt => "non_it",
        }
    }

    /// True for `Unknown` and `NonIt`.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Unknown | Self::NonIt)
    }

    /// Title-cased label for display, e.g. "Password Reset".
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_lowercase();
        if tag == "non_it_request" {
            return Ok(Self::NonIt);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == tag)
            .ok_or_else(|| TriageError::UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_parse_accepts_legacy_non_it_tag() {
        assert_eq!("non_it_request".parse::<Category>().unwrap(), Category::NonIt);
        assert_eq!("NON_IT".parse::<Category>().unwrap(), Category::NonIt);
        let restored: Category = serde_json::from_str("\"non_it_request\"").unwrap();
        assert_eq!(restored, Category::NonIt);
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        assert!("printer_jam".parse::<Category>().is_err());
    }

    #[test]
    fn test_label() {
        assert_eq!(Category::PasswordReset.label(), "Password Reset");
        assert_eq!(Category::NonIt.label(), "Non It");
    }

    #[test]
    fn test_sentinels() {
        assert!(Category::Unknown.is_sentinel());
        assert!(Category::NonIt.is_sentinel());
        assert!(!Category::PolicyQuestion.is_sentinel());
    }
}
