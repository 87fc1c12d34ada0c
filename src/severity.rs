use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Allow,
    Warning,
    Error,
}

impl Severity {
    /// Label used in rendered reports. The `Warning` spelling is a stable
    /// output contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Allow => "allow",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Warning
    }
}
