use serde::{Deserialize, Serialize};

/// A generated credential for one milestone archive.
///
/// The credential is recorded only; archives are not encrypted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    /// Milestone identifier the credential belongs to.
    pub milestone: String,
    pub password: String,
}
