//! The two stages, end to end.
//!
//! Generation: registry → synthesis → card files.
//! Packaging: card files → per-milestone archives, then the credential vault.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::{DamError, Result};
use crate::models::{Milestone, VaultEntry};
use crate::packager::{PackageReport, Packager};
use crate::store::CardStore;
use crate::synth::{self, Numbering};
use crate::vault::CredentialVault;

/// Synthesize every card and write it to `store`. Fails on the first write error.
pub fn generate(
    registry: &[Milestone],
    numbering: Numbering,
    store: &CardStore,
) -> Result<Vec<PathBuf>> {
    let cards = synth::synthesize_all(registry, numbering)?;
    tracing::info!(
        "Synthesized {} cards from {} milestones",
        cards.len(),
        registry.len()
    );
    store.write_all(&cards)
}

/// What the packaging stage produced.
#[derive(Debug, Clone)]
pub struct PackageOutcome {
    pub reports: Vec<PackageReport>,
    pub entries: Vec<VaultEntry>,
    pub vault_path: PathBuf,
}

/// Archive every milestone, then write the vault.
///
/// Milestones are packaged independently. If any of them fails the vault is
/// not written and the failed identifiers are returned in the error.
pub fn package(
    registry: &[Milestone],
    packager: &Packager,
    vault: &CredentialVault,
    date: NaiveDate,
) -> Result<PackageOutcome> {
    let mut reports = Vec::with_capacity(registry.len());
    let mut failed = Vec::new();
    for (identifier, result) in packager.package_all(registry) {
        match result {
            Ok(report) => reports.push(report),
            Err(_) => failed.push(identifier),
        }
    }
    if !failed.is_empty() {
        return Err(DamError::Packaging(failed));
    }

    let entries = vault.issue(registry, date);
    let vault_path = vault.save(&entries)?;

    Ok(PackageOutcome {
        reports,
        entries,
        vault_path,
    })
}
