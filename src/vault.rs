//! Credential vault.
//!
//! One credential per milestone, derived from the calendar date and the
//! milestone identifier. The same day reproduces the same credentials; a new
//! day changes all of them. Credentials are recorded, not applied: archives
//! stay unencrypted.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{DamError, Result};
use crate::models::{Milestone, VaultEntry};

/// Prefix of every generated credential.
pub const CREDENTIAL_PREFIX: &str = "beaver_dam";

/// Filename of the vault inside its base directory.
pub const VAULT_FILE: &str = "beaver_passwords.secure";

/// `beaver_dam_<YYYYMMDD>_<identifier>`
pub fn credential(date: NaiveDate, identifier: &str) -> String {
    format!("{}_{}_{}", CREDENTIAL_PREFIX, date.format("%Y%m%d"), identifier)
}

/// Writes the credential list to `<base_dir>/beaver_passwords.secure`.
#[derive(Debug, Clone)]
pub struct CredentialVault {
    base_dir: PathBuf,
}

impl CredentialVault {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.base_dir.join(VAULT_FILE)
    }

    /// One entry per milestone, in registry order.
    pub fn issue(&self, registry: &[Milestone], date: NaiveDate) -> Vec<VaultEntry> {
        issue_for(registry.iter().map(|m| m.identifier.as_str()), date)
    }

    /// Persist the full list in a file only its owner can read.
    ///
    /// A new file is created owner-only; an existing one is tightened after
    /// the write.
    pub fn save(&self, entries: &[VaultEntry]) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).map_err(|e| DamError::io(&self.base_dir, e))?;

        let path = self.path();
        let content = serde_json::to_string_pretty(entries)?;
        let mut file = open_private(&path).map_err(|e| DamError::io(&path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| DamError::io(&path, e))?;
        restrict_to_owner(&path)?;

        tracing::info!("Secured {} credentials in {}", entries.len(), path.display());
        Ok(path)
    }

    pub fn load(&self) -> Result<Vec<VaultEntry>> {
        let path = self.path();
        let content = fs::read_to_string(&path).map_err(|e| DamError::io(&path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Entries for an arbitrary list of identifiers.
pub fn issue_for<'a>(
    identifiers: impl IntoIterator<Item = &'a str>,
    date: NaiveDate,
) -> Vec<VaultEntry> {
    identifiers
        .into_iter()
        .map(|identifier| VaultEntry {
            milestone: identifier.to_string(),
            password: credential(date, identifier),
        })
        .collect()
}

fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::Permissions::from_mode(0o600);
    fs::set_permissions(path, permissions).map_err(|e| DamError::io(path, e))
}

// Owner-only permission bits have no equivalent outside Unix.
#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(
            credential(date, "MILESTONE_4_SECURITY"),
            "beaver_dam_20260307_MILESTONE_4_SECURITY"
        );
    }
}
