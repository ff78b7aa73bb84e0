// tests/delete_test.rs
use std::collections::HashSet;

use manifest_relay::manager::ReleaseManager;
use manifest_relay::registry::{MockRegistry, ReleaseRegistry};

const ORG: &str = "community-operators";
const REPO: &str = "etcd";

#[test]
fn test_delete_single_version() {
    let registry = MockRegistry::new(ORG);
    registry.add_release(ORG, REPO, "1.0.0");
    registry.add_release(ORG, REPO, "4.3.2");
    let manager = ReleaseManager::new(&registry);

    let outcome = manager.delete_release(ORG, REPO, "1.0.0").unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.deleted, vec!["1.0.0".to_string()]);

    let remaining = registry.list_releases(ORG, REPO).unwrap();
    assert_eq!(remaining.raw(), &["4.3.2".to_string()]);
}

#[test]
fn test_delete_all_reports_every_version() {
    let registry = MockRegistry::new(ORG);
    registry.add_release(ORG, REPO, "1.0.0");
    registry.add_release(ORG, REPO, "4.3.2");
    let manager = ReleaseManager::new(&registry);

    let outcome = manager.delete_all(ORG, REPO).unwrap();
    assert!(outcome.is_complete());

    let deleted: HashSet<_> = outcome.deleted.iter().cloned().collect();
    let expected: HashSet<_> = ["1.0.0".to_string(), "4.3.2".to_string()]
        .into_iter()
        .collect();
    assert_eq!(deleted, expected);
    assert!(registry.list_releases(ORG, REPO).unwrap().is_empty());
}

#[test]
fn test_delete_all_includes_nonconforming_versions() {
    // The registry can hold version strings this service would never
    // assign; delete-all must still remove them.
    let registry = MockRegistry::new(ORG);
    registry.add_release(ORG, REPO, "1.0.0");
    registry.add_release(ORG, REPO, "latest");
    registry.add_release(ORG, REPO, "v2.0.0-beta");
    let manager = ReleaseManager::new(&registry);

    let outcome = manager.delete_all(ORG, REPO).unwrap();
    assert_eq!(outcome.deleted.len(), 3);
    assert!(outcome.deleted.contains(&"latest".to_string()));
    assert!(outcome.deleted.contains(&"v2.0.0-beta".to_string()));
    assert!(registry.list_releases(ORG, REPO).unwrap().is_empty());
}

#[test]
fn test_delete_all_partial_failure_reports_progress() {
    let registry = MockRegistry::new(ORG);
    registry.add_release(ORG, REPO, "1.0.0");
    registry.add_release(ORG, REPO, "2.0.0");
    registry.add_release(ORG, REPO, "3.0.0");
    registry.fail_delete("2.0.0", "release is referenced by a pending scan");
    let manager = ReleaseManager::new(&registry);

    let outcome = manager.delete_all(ORG, REPO).unwrap();
    assert!(!outcome.is_complete());
    assert_eq!(outcome.deleted, vec!["1.0.0".to_string()]);

    let failure = outcome.failed.unwrap();
    assert_eq!(failure.version, "2.0.0");
    assert!(failure.diagnostic.contains("pending scan"));

    // No rollback: the successfully deleted version stays gone.
    let remaining = registry.list_releases(ORG, REPO).unwrap();
    assert!(!remaining.contains("1.0.0"));
    assert!(remaining.contains("2.0.0"));
    assert!(remaining.contains("3.0.0"));
}

#[test]
fn test_delete_unknown_organization() {
    let registry = MockRegistry::new(ORG);
    let manager = ReleaseManager::new(&registry);

    let err = manager
        .delete_all("martian-green-operators", REPO)
        .unwrap_err();
    assert_eq!(err.kind(), "RegistryOrganizationError");
}
