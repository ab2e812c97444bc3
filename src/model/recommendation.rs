//! Candidate recommendations: model-suggested commands, pre-execution.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority given to candidates that omit one or carry something non-numeric.
pub const DEFAULT_PRIORITY: i64 = 5;

/// Name given to candidates that omit one.
pub const DEFAULT_NAME: &str = "Unnamed";

/// One model-suggested enumeration step.
///
/// `command` is always non-empty and trimmed; the parser drops anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub command: String,
    pub category: Category,

    /// Lower runs first.
    pub priority: i64,
    pub rationale: String,
    pub notes: String,
}

/// Service family a recommendation targets.
///
/// Informational only. Unrecognized values are kept verbatim in `Other`
/// rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Web,
    Ssh,
    Smb,
    Rdp,
    Database,
    Ldap,
    Ftp,
    Smtp,
    Dns,
    #[default]
    Generic,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Web => "web",
            Self::Ssh => "ssh",
            Self::Smb => "smb",
            Self::Rdp => "rdp",
            Self::Database => "database",
            Self::Ldap => "ldap",
            Self::Ftp => "ftp",
            Self::Smtp => "smtp",
            Self::Dns => "dns",
            Self::Generic => "generic",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "web" => Self::Web,
            "ssh" => Self::Ssh,
            "smb" => Self::Smb,
            "rdp" => Self::Rdp,
            "database" => Self::Database,
            "ldap" => Self::Ldap,
            "ftp" => Self::Ftp,
            "smtp" => Self::Smtp,
            "dns" => Self::Dns,
            "generic" => Self::Generic,
            _ => Self::Other(raw),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
