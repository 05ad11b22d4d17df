//! Packaging and vault integration tests.
//!
//! Tests are organized into three sections:
//! - Selection: which card files land in an archive under each match mode
//! - Archives: archive layout, overwrite and failure isolation
//! - Vault: credential derivation and the vault file

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use beaverdam::catalog;
use beaverdam::matcher::MatchMode;
use beaverdam::models::*;
use beaverdam::packager::Packager;
use beaverdam::pipeline;
use beaverdam::store::CardStore;
use beaverdam::synth::Numbering;
use beaverdam::vault::{self, CredentialVault};
use beaverdam::DamError;
use chrono::NaiveDate;
use tempfile::TempDir;

/// Helper to build a milestone with no tasks.
fn make_milestone(identifier: &str, selection: &str) -> Milestone {
    Milestone {
        name: identifier.to_lowercase(),
        identifier: identifier.to_string(),
        card_range: CardRange::new(1, 1),
        selection: selection.to_string(),
        tasks: Vec::new(),
    }
}

/// Helper to create a card directory holding `CARD_006_x.yml` through `CARD_012_x.yml`.
fn setup_cards() -> (TempDir, CardStore) {
    let tmp = tempfile::tempdir().expect("Failed to create temp dir");
    let dir = tmp.path().join("work_cards");
    fs::create_dir_all(&dir).expect("Failed to create card dir");
    for n in 6..=12 {
        fs::write(dir.join(format!("CARD_{:03}_x.yml", n)), format!("n: {}\n", n))
            .expect("Failed to write card");
    }
    (tmp, CardStore::new(dir))
}

/// Helper to list the entry names of a zip archive.
fn archive_entries(path: &Path) -> Vec<String> {
    let file = File::open(path).expect("Failed to open archive");
    let mut archive = zip::ZipArchive::new(file).expect("Failed to read archive");
    (0..archive.len())
        .map(|i| {
            archive
                .by_index(i)
                .expect("Failed to read entry")
                .name()
                .to_string()
        })
        .collect()
}

fn vaults_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("milestone_vaults")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

// ============================================================
// Selection Tests
// ============================================================

mod selection {
    use super::*;

    #[test]
    fn literal_bracket_patterns_select_nothing() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::Literal);
        let milestone = make_milestone("MILESTONE_2_CORE_KV_OPS", "CARD_00[6-9],CARD_01[0-2]");

        let report = packager.package(&milestone).expect("Failed to package");

        assert!(report.included.is_empty());
        assert!(report.archive.exists());
        assert!(archive_entries(&report.archive).is_empty());
    }

    #[test]
    fn numeric_range_patterns_select_all_seven() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::NumericRange);
        let milestone = make_milestone("MILESTONE_2_CORE_KV_OPS", "CARD_00[6-9],CARD_01[0-2]");

        let report = packager.package(&milestone).expect("Failed to package");

        let expected: Vec<String> = (6..=12).map(|n| format!("CARD_{:03}_x.yml", n)).collect();
        assert_eq!(report.included, expected);
        assert_eq!(archive_entries(&report.archive), expected);
    }

    #[test]
    fn literal_plain_segments_select_by_substring() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::Literal);
        let milestone = make_milestone("PICK", "CARD_007,CARD_011_x");

        let report = packager.package(&milestone).expect("Failed to package");
        assert_eq!(report.included, vec!["CARD_007_x.yml", "CARD_011_x.yml"]);
    }

    #[test]
    fn literal_trailing_comma_selects_every_card() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::Literal);

        let report = packager
            .package(&make_milestone("M", "CARD_999,"))
            .expect("Failed to package");
        assert_eq!(report.included.len(), 7);
    }

    #[test]
    fn literal_segments_keep_surrounding_spaces() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::Literal);

        let report = packager
            .package(&make_milestone("M", "CARD_999, x"))
            .expect("Failed to package");
        assert!(report.included.is_empty());
    }

    #[test]
    fn subdirectories_are_not_archived() {
        let (tmp, store) = setup_cards();
        fs::create_dir_all(store.dir().join("CARD_008_nested")).expect("Failed to create subdir");
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::Literal);

        let report = packager
            .package(&make_milestone("M", "CARD_008"))
            .expect("Failed to package");
        assert_eq!(report.included, vec!["CARD_008_x.yml"]);
    }
}

// ============================================================
// Archive Tests
// ============================================================

mod archives {
    use super::*;

    #[test]
    fn archive_is_named_after_identifier() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::Literal);

        let report = packager
            .package(&make_milestone("MILESTONE_9_X", "CARD_006"))
            .expect("Failed to package");

        assert_eq!(report.identifier, "MILESTONE_9_X");
        assert_eq!(report.archive, vaults_dir(&tmp).join("MILESTONE_9_X.zip"));
    }

    #[test]
    fn archive_preserves_card_bytes() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::Literal);
        let report = packager
            .package(&make_milestone("M", "CARD_010"))
            .expect("Failed to package");

        let file = File::open(&report.archive).expect("Failed to open archive");
        let mut archive = zip::ZipArchive::new(file).expect("Failed to read archive");
        let mut entry = archive.by_name("CARD_010_x.yml").expect("Missing entry");
        let mut content = String::new();
        std::io::Read::read_to_string(&mut entry, &mut content).expect("Failed to read entry");
        assert_eq!(content, "n: 10\n");
    }

    #[test]
    fn repackaging_overwrites_instead_of_merging() {
        let (tmp, store) = setup_cards();
        let dir = store.dir().to_path_buf();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::NumericRange);
        let milestone = make_milestone("M", "CARD_00[6-9]");

        packager.package(&milestone).expect("Failed to package");
        fs::remove_file(dir.join("CARD_006_x.yml")).expect("Failed to remove card");
        let report = packager.package(&milestone).expect("Failed to repackage");

        assert_eq!(
            archive_entries(&report.archive),
            vec!["CARD_007_x.yml", "CARD_008_x.yml", "CARD_009_x.yml"]
        );
    }

    #[test]
    fn missing_card_directory_fails() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let packager = Packager::new(
            CardStore::new(tmp.path().join("absent")),
            vaults_dir(&tmp),
            MatchMode::Literal,
        );

        let result = packager.package(&make_milestone("M", "CARD_"));
        assert!(matches!(result, Err(DamError::Io { .. })));
    }

    #[test]
    fn failures_are_isolated_per_milestone() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::NumericRange);
        let registry = vec![
            make_milestone("BROKEN", "CARD_00[9-6]"),
            make_milestone("GOOD", "CARD_01[0-2]"),
        ];

        let results = packager.package_all(&registry);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "BROKEN");
        assert!(matches!(results[0].1, Err(DamError::Pattern { .. })));
        let good = results[1].1.as_ref().expect("GOOD should package");
        assert_eq!(good.included.len(), 3);
    }
}

// ============================================================
// Pipeline Tests
// ============================================================

mod pipeline_runs {
    use super::*;

    #[test]
    fn builtin_registry_numeric_range_counts() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let registry = catalog::builtin();
        let store = CardStore::new(tmp.path().join("work_cards"));
        pipeline::generate(&registry, Numbering::Global, &store).expect("Failed to generate");

        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::NumericRange);
        let vault = CredentialVault::new(tmp.path().join("etc"));
        let outcome = pipeline::package(&registry, &packager, &vault, date(2026, 10, 19))
            .expect("Failed to package");

        let counts: Vec<(String, usize)> = outcome
            .reports
            .iter()
            .map(|r| (r.identifier.clone(), r.included.len()))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("MILESTONE_1_TDD_FOUNDATION".to_string(), 8),
                ("MILESTONE_2_CORE_KV_OPS".to_string(), 7),
                ("MILESTONE_3_TTL_CACHE".to_string(), 7),
                ("MILESTONE_4_SECURITY".to_string(), 8),
                ("MILESTONE_5_DATA_MGMT".to_string(), 7),
                ("MILESTONE_6_FILESYSTEM_MIRROR".to_string(), 7),
            ]
        );
    }

    #[test]
    fn builtin_registry_literal_archives_are_empty() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let registry = catalog::builtin();
        let store = CardStore::new(tmp.path().join("work_cards"));
        pipeline::generate(&registry, Numbering::Global, &store).expect("Failed to generate");

        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::Literal);
        let vault = CredentialVault::new(tmp.path().join("etc"));
        let outcome = pipeline::package(&registry, &packager, &vault, date(2026, 10, 19))
            .expect("Failed to package");

        assert_eq!(outcome.reports.len(), registry.len());
        assert!(outcome.reports.iter().all(|r| r.included.is_empty()));
        assert_eq!(outcome.entries.len(), registry.len());
        assert!(outcome.vault_path.exists());
    }

    #[test]
    fn packaging_failure_skips_the_vault() {
        let (tmp, store) = setup_cards();
        let packager = Packager::new(store, vaults_dir(&tmp), MatchMode::NumericRange);
        let vault = CredentialVault::new(tmp.path().join("etc"));
        let registry = vec![
            make_milestone("GOOD", "CARD_00[6-9]"),
            make_milestone("BROKEN", "CARD_[1-100]"),
        ];

        let result = pipeline::package(&registry, &packager, &vault, date(2026, 10, 19));

        match result {
            Err(DamError::Packaging(failed)) => assert_eq!(failed, vec!["BROKEN".to_string()]),
            other => panic!("expected packaging failure, got {:?}", other.map(|o| o.reports)),
        }
        assert!(vaults_dir(&tmp).join("GOOD.zip").exists());
        assert!(!vault.path().exists());
    }
}

// ============================================================
// Vault Tests
// ============================================================

mod vault_file {
    use super::*;

    #[test]
    fn issues_one_credential_per_milestone() {
        let entries = vault::issue_for(["A", "B"], date(2026, 10, 19));
        assert_eq!(
            entries,
            vec![
                VaultEntry {
                    milestone: "A".to_string(),
                    password: "beaver_dam_20261019_A".to_string(),
                },
                VaultEntry {
                    milestone: "B".to_string(),
                    password: "beaver_dam_20261019_B".to_string(),
                },
            ]
        );
    }

    #[test]
    fn same_day_reproduces_and_new_day_changes() {
        let today = vault::issue_for(["A", "B"], date(2026, 10, 19));
        let again = vault::issue_for(["A", "B"], date(2026, 10, 19));
        let tomorrow = vault::issue_for(["A", "B"], date(2026, 10, 20));

        assert_eq!(today, again);
        for (a, b) in today.iter().zip(&tomorrow) {
            assert_eq!(a.milestone, b.milestone);
            assert_ne!(a.password, b.password);
        }
    }

    #[test]
    fn issue_follows_registry_identifiers() {
        let vault = CredentialVault::new("/unused");
        let entries = vault.issue(&catalog::builtin(), date(2026, 1, 2));
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[1].milestone, "MILESTONE_2_CORE_KV_OPS");
        assert_eq!(entries[1].password, "beaver_dam_20260102_MILESTONE_2_CORE_KV_OPS");
    }

    #[test]
    fn save_creates_directory_and_round_trips() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let vault = CredentialVault::new(tmp.path().join("agentic_etc"));
        let entries = vault::issue_for(["A", "B"], date(2026, 10, 19));

        let path = vault.save(&entries).expect("Failed to save");

        assert_eq!(path, tmp.path().join("agentic_etc").join("beaver_passwords.secure"));
        assert_eq!(vault.load().expect("Failed to load"), entries);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("Failed to read"))
                .expect("Vault is not JSON");
        assert_eq!(json[0]["milestone"], "A");
        assert_eq!(json[1]["password"], "beaver_dam_20261019_B");
    }

    #[cfg(unix)]
    #[test]
    fn save_restricts_permissions_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let vault = CredentialVault::new(tmp.path());
        let path = vault
            .save(&vault::issue_for(["A"], date(2026, 10, 19)))
            .expect("Failed to save");

        let mode = fs::metadata(&path)
            .expect("Failed to stat vault")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn save_tightens_an_existing_vault() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let vault = CredentialVault::new(tmp.path());
        fs::write(vault.path(), "[]").expect("Failed to write stale vault");
        fs::set_permissions(vault.path(), fs::Permissions::from_mode(0o644))
            .expect("Failed to chmod stale vault");

        vault
            .save(&vault::issue_for(["A"], date(2026, 10, 19)))
            .expect("Failed to save");

        let mode = fs::metadata(vault.path())
            .expect("Failed to stat vault")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(vault.load().expect("Failed to load").len(), 1);
    }

    #[test]
    fn save_overwrites_previous_vault() {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let vault = CredentialVault::new(tmp.path());
        vault
            .save(&vault::issue_for(["A", "B", "C"], date(2026, 10, 19)))
            .expect("Failed to save");
        vault
            .save(&vault::issue_for(["A"], date(2026, 10, 20)))
            .expect("Failed to save");

        let loaded = vault.load().expect("Failed to load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].password, "beaver_dam_20261020_A");
    }
}
