// tests/push_archive_test.rs
//
// End-to-end push flows over the mock collaborators: version assignment,
// conflict handling, and archive validation failures.

use byteorder::{LittleEndian, WriteBytesExt};

use manifest_relay::buildsys::MockBuildSystem;
use manifest_relay::orchestrator::{PushOrchestrator, PushRequest, PushSource};
use manifest_relay::registry::{MockRegistry, ReleaseRegistry};

const ORG: &str = "community-operators";
const REPO: &str = "etcd";

/// Minimal zip with stored entries; `encrypted` sets the general-purpose
/// encryption bit on every entry.
fn make_archive(entries: &[(&str, &[u8])], encrypted: bool) -> Vec<u8> {
    let flags: u16 = if encrypted { 0x0001 } else { 0 };
    let mut out = Vec::new();
    let mut headers = Vec::new();

    for (name, data) in entries {
        let lfh_offset = out.len() as u32;
        out.extend_from_slice(b"PK\x03\x04");
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(flags).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(data);
        headers.push((name.to_string(), data.len() as u32, lfh_offset));
    }

    let cd_offset = out.len() as u32;
    for (name, size, lfh_offset) in &headers {
        out.extend_from_slice(b"PK\x01\x02");
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(flags).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(*size).unwrap();
        out.write_u32::<LittleEndian>(*size).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(*lfh_offset).unwrap();
        out.extend_from_slice(name.as_bytes());
    }
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(b"PK\x05\x06");
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(headers.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(headers.len() as u16).unwrap();
    out.write_u32::<LittleEndian>(cd_size).unwrap();
    out.write_u32::<LittleEndian>(cd_offset).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out
}

fn manifest_bytes() -> Vec<u8> {
    make_archive(
        &[
            ("manifests/etcdoperator.v0.9.2.clusterserviceversion.yaml", b"spec: {}"),
            ("manifests/etcdclusters.etcd.database.coreos.com.crd.yaml", b"kind: CRD"),
        ],
        false,
    )
}

fn upload(filename: &str, bytes: Vec<u8>, version: Option<&str>) -> PushRequest {
    PushRequest {
        organization: ORG.to_string(),
        repo: REPO.to_string(),
        requested_version: version.map(|v| v.to_string()),
        source: PushSource::Upload {
            filename: filename.to_string(),
            bytes,
        },
    }
}

#[test]
fn test_push_lifecycle_assigns_versions_in_order() {
    let registry = MockRegistry::new(ORG);
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    // First push of an empty repository bootstraps at 1.0.0.
    let result = orchestrator
        .push(upload("manifests.zip", manifest_bytes(), None))
        .unwrap();
    assert_eq!(result.organization, ORG);
    assert_eq!(result.repo, REPO);
    assert_eq!(result.version, "1.0.0");

    // An explicit version is used as-is.
    let result = orchestrator
        .push(upload("manifests.zip", manifest_bytes(), Some("4.3.2")))
        .unwrap();
    assert_eq!(result.version, "4.3.2");

    // Auto-assignment increments the major of the highest version.
    let result = orchestrator
        .push(upload("manifests.zip", manifest_bytes(), None))
        .unwrap();
    assert_eq!(result.version, "5.0.0");

    // Re-requesting a published version conflicts, and nothing is pushed.
    let err = orchestrator
        .push(upload("manifests.zip", manifest_bytes(), Some("5.0.0")))
        .unwrap_err();
    assert_eq!(err.kind(), "VersionAlreadyExists");
    assert_eq!(registry.pushes().len(), 3);

    let releases = registry.list_releases(ORG, REPO).unwrap();
    assert!(releases.contains("1.0.0"));
    assert!(releases.contains("4.3.2"));
    assert!(releases.contains("5.0.0"));
}

#[test]
fn test_push_incorrect_version_formats_rejected() {
    let registry = MockRegistry::new(ORG);
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    for version in ["1.0.0.1", "1.0.0-2", "1.02.0", "1.a.2", "1.1"] {
        let err = orchestrator
            .push(upload("manifests.zip", manifest_bytes(), Some(version)))
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidVersionFormat", "version: {}", version);
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains(version));
    }
    assert!(registry.pushes().is_empty());
}

#[test]
fn test_push_filetype_not_supported() {
    let registry = MockRegistry::new(ORG);
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    let err = orchestrator
        .push(upload("not-a-zip.zip", b"plain text".to_vec(), None))
        .unwrap_err();
    assert_eq!(err.kind(), "UploadedFileError");
    assert!(err.to_string().contains("not a zip file"));
}

#[test]
fn test_push_file_extension_not_zip() {
    let registry = MockRegistry::new(ORG);
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    let err = orchestrator
        .push(upload("archive.tar.gz", manifest_bytes(), None))
        .unwrap_err();
    assert_eq!(err.kind(), "UploadedFileError");
    assert!(err.to_string().contains("file extension"));
}

#[test]
fn test_push_password_protected_archive() {
    let registry = MockRegistry::new(ORG);
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    let encrypted = make_archive(&[("manifests/csv.yaml", b"secret")], true);
    let err = orchestrator
        .push(upload("manifests.zip", encrypted, None))
        .unwrap_err();
    assert_eq!(err.kind(), "UploadedFileError");
    assert!(err.to_string().contains("is encrypted"));
}

#[test]
fn test_push_oversized_archive() {
    let registry = MockRegistry::new(ORG);
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 64);

    let payload = vec![b'a'; 256];
    let oversized = make_archive(&[("manifests/csv.yaml", &payload)], false);
    let err = orchestrator
        .push(upload("manifests.zip", oversized, None))
        .unwrap_err();
    assert_eq!(err.kind(), "UploadedFileError");
    assert!(err.to_string().contains("exceeds the limit"));
}

#[test]
fn test_push_organization_unaccessible() {
    let registry = MockRegistry::new(ORG);
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    let request = PushRequest {
        organization: "martian-green-operators".to_string(),
        repo: REPO.to_string(),
        requested_version: None,
        source: PushSource::Upload {
            filename: "manifests.zip".to_string(),
            bytes: manifest_bytes(),
        },
    };
    let err = orchestrator.push(request).unwrap_err();
    assert_eq!(err.kind(), "RegistryOrganizationError");
    assert_eq!(err.http_status(), 500);
}

#[test]
fn test_push_tool_failure_reports_diagnostic() {
    let registry = MockRegistry::new(ORG);
    registry.fail_next_push("Failed to push: bundle is invalid");
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    let err = orchestrator
        .push(upload("manifests.zip", manifest_bytes(), None))
        .unwrap_err();
    assert_eq!(err.kind(), "RegistryPushError");
    assert!(err.to_string().contains("bundle is invalid"));
}

#[test]
fn test_push_from_build_reference() {
    let registry = MockRegistry::new(ORG);
    let mut buildsys = MockBuildSystem::new();
    buildsys.add_build("etcd-operator-0.9.2-5", "operator_manifests.zip", manifest_bytes());
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    let request = PushRequest {
        organization: ORG.to_string(),
        repo: REPO.to_string(),
        requested_version: Some("4.3.2".to_string()),
        source: PushSource::Build {
            build_id: "etcd-operator-0.9.2-5".to_string(),
        },
    };
    let result = orchestrator.push(request).unwrap();
    assert_eq!(result.version, "4.3.2");
    assert_eq!(
        registry.pushes(),
        vec![(ORG.to_string(), REPO.to_string(), "4.3.2".to_string())]
    );
}

#[test]
fn test_push_from_unknown_build() {
    let registry = MockRegistry::new(ORG);
    let buildsys = MockBuildSystem::new();
    let orchestrator = PushOrchestrator::new(&registry, &buildsys, 0);

    let request = PushRequest {
        organization: ORG.to_string(),
        repo: REPO.to_string(),
        requested_version: None,
        source: PushSource::Build {
            build_id: "no-such-build-1-1".to_string(),
        },
    };
    let err = orchestrator.push(request).unwrap_err();
    assert_eq!(err.kind(), "BuildNotFound");
    assert!(err.to_string().contains("no-such-build-1-1"));
}
