//! Archive backend against a temporary directory.

use std::fs;
use std::path::Path;
use std::time::Duration;

use qlab_adapter_archive::{ArchiveBackend, ArchiveService, BACKEND_NAME};
use qlab_hal::{
    AccountStore, Backend, BackendConfig, BackendRegistry, CircuitSource, Connection,
    CredentialOrigin, Credentials, EnvCredentialSource, HalError, JobId, JobStatus,
    SelectionFilter, connect_with_fallback,
};

const CATALOGUE: &str = r#"[
  {"name": "ibm_brisbane", "simulator": false, "pending_jobs": 42, "num_qubits": 127,
   "processor_family": "Eagle"},
  {"name": "ibm_kyoto", "simulator": false, "pending_jobs": 3, "num_qubits": 127},
  {"name": "ibm_osaka", "simulator": false, "operational": false, "pending_jobs": 0,
   "num_qubits": 127},
  {"name": "aer_simulator", "simulator": true, "pending_jobs": 0, "num_qubits": 32}
]"#;

fn seed(root: &Path) {
    fs::create_dir_all(root.join("jobs")).unwrap();
    fs::write(root.join("backends.json"), CATALOGUE).unwrap();
    fs::write(
        root.join("jobs/bell01.json"),
        r#"{"id": "bell01", "backend": "ibm_kyoto", "status": "DONE", "shots": 500,
            "counts": {"00": 245, "11": 240, "01": 8, "10": 7},
            "created_at": "2024-03-01T12:00:00Z", "execution_time_ms": 3120}"#,
    )
    .unwrap();
    fs::write(
        root.join("jobs/sup02.json"),
        r#"{"id": "sup02", "backend": "ibm_brisbane", "status": "DONE", "register": "c",
            "samples": ["0x0", "0x1", "0x0", "0x0"]}"#,
    )
    .unwrap();
    fs::write(
        root.join("jobs/fail03.json"),
        r#"{"id": "fail03", "backend": "ibm_kyoto", "status": "ERROR", "error": "calibration"}"#,
    )
    .unwrap();
    fs::write(
        root.join("jobs/queued04.json"),
        r#"{"id": "queued04", "backend": "ibm_kyoto", "status": "QUEUED"}"#,
    )
    .unwrap();
}

fn service(root: &Path) -> ArchiveService {
    ArchiveService::connect(root, &Credentials::new("tok-123")).unwrap()
}

// ---------------------------------------------------------------------------
// Connecting
// ---------------------------------------------------------------------------

#[test]
fn test_connect_requires_token() {
    let dir = tempfile::tempdir().unwrap();
    let err = ArchiveService::connect(dir.path(), &Credentials::new("  ")).unwrap_err();
    assert!(err.is_auth());
}

#[test]
fn test_connect_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err =
        ArchiveService::connect(dir.path().join("missing"), &Credentials::new("tok")).unwrap_err();
    assert!(matches!(err, HalError::BackendUnavailable(_)));
}

#[test]
fn test_access_list_rejects_unknown_token() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tokens.json"), r#"["good"]"#).unwrap();

    assert!(ArchiveService::connect(dir.path(), &Credentials::new("good")).is_ok());
    let err = ArchiveService::connect(dir.path(), &Credentials::new("bad")).unwrap_err();
    assert!(err.is_auth());
}

#[test]
fn test_fallback_to_env_after_rejected_saved_account() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("archive");
    fs::create_dir_all(&archive).unwrap();
    fs::write(archive.join("tokens.json"), r#"["fresh"]"#).unwrap();

    let store = AccountStore::at(dir.path().join("account.json"));
    store.save(&Credentials::new("stale"), false).unwrap();
    let dotenv = dir.path().join(".env");
    fs::write(&dotenv, "QLAB_ARCHIVE_TEST_TOKEN=fresh\n").unwrap();
    let env = EnvCredentialSource::new(["QLAB_ARCHIVE_TEST_TOKEN"]).with_dotenv(&dotenv);

    match connect_with_fallback(&store, &env, |creds| {
        ArchiveService::connect(&archive, creds)
    }) {
        Connection::Connected { service, origin } => {
            assert_eq!(origin, CredentialOrigin::Environment);
            assert_eq!(service.credentials().token, "fresh");
        }
        other => panic!("expected Connected, got {other:?}"),
    }
    assert_eq!(store.load().unwrap().unwrap().token, "fresh");
}

#[test]
fn test_fallback_needs_auth_without_any_token() {
    let dir = tempfile::tempdir().unwrap();
    let store = AccountStore::at(dir.path().join("account.json"));
    let env = EnvCredentialSource::new(["QLAB_ARCHIVE_TEST_UNSET_TOKEN"]);

    let conn = connect_with_fallback(&store, &env, |creds| {
        ArchiveService::connect(dir.path(), creds)
    });
    assert!(matches!(conn, Connection::NeedsAuth { .. }));
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_least_busy_hardware() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let service = service(dir.path());

    assert_eq!(service.backends().await.unwrap().len(), 4);

    let best = service
        .least_busy(SelectionFilter::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(best.name, "ibm_kyoto");

    let with_sims = SelectionFilter {
        include_simulators: true,
        ..SelectionFilter::default()
    };
    let best = service.least_busy(with_sims).await.unwrap().unwrap();
    assert_eq!(best.name, "aer_simulator");
}

#[tokio::test]
async fn test_missing_catalogue_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());
    assert!(service.backends().await.unwrap().is_empty());
    assert!(
        service
            .least_busy(SelectionFilter::default())
            .await
            .unwrap()
            .is_none()
    );
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_wait_completed_job() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let backend = service(dir.path()).backend();

    let result = backend.wait(&JobId::new("bell01")).await.unwrap();
    assert_eq!(result.shots, 500);
    assert_eq!(result.backend, "ibm_kyoto");
    assert_eq!(result.register, "meas");
    assert_eq!(result.counts.get("00"), 245);
    assert_eq!(result.execution_time_ms, Some(3120));
    assert!(result.is_consistent());
}

#[tokio::test]
async fn test_result_from_samples_keeps_register() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let backend = service(dir.path()).backend();

    let result = backend.result(&JobId::new("sup02")).await.unwrap();
    assert_eq!(result.register, "c");
    assert_eq!(result.counts.get("0"), 3);
    assert_eq!(result.counts.get("1"), 1);
    assert_eq!(result.shots, 4);
}

#[tokio::test]
async fn test_failed_job() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let backend = service(dir.path()).backend();

    assert_eq!(
        backend.status(&JobId::new("fail03")).await.unwrap(),
        JobStatus::Failed("calibration".into())
    );
    let err = backend.wait(&JobId::new("fail03")).await.unwrap_err();
    assert!(matches!(err, HalError::JobFailed(msg) if msg == "calibration"));
}

#[tokio::test]
async fn test_wait_times_out_on_queued_job() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let backend = service(dir.path())
        .backend()
        .with_wait_policy(Duration::from_millis(5), Duration::from_millis(20));

    let err = backend.wait(&JobId::new("queued04")).await.unwrap_err();
    assert!(matches!(err, HalError::Timeout(id) if id == "queued04"));
}

#[tokio::test]
async fn test_unknown_job() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let backend = service(dir.path()).backend();

    let err = backend.status(&JobId::new("nope")).await.unwrap_err();
    assert!(matches!(err, HalError::JobNotFound(id) if id == "nope"));
}

#[tokio::test]
async fn test_job_ids_listed() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let ids = service(dir.path()).archive().job_ids().await.unwrap();
    let ids: Vec<_> = ids.iter().map(JobId::as_str).collect();
    assert_eq!(ids, vec!["bell01", "fail03", "queued04", "sup02"]);
}

#[tokio::test]
async fn test_archive_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let backend = service(dir.path()).backend();

    let circuit = CircuitSource::new("bell", "OPENQASM 3.0;");
    let err = backend.submit(&circuit, 500).await.unwrap_err();
    assert!(matches!(err, HalError::Unsupported(_)));
    let err = backend.cancel(&JobId::new("bell01")).await.unwrap_err();
    assert!(matches!(err, HalError::Unsupported(_)));
}

#[tokio::test]
async fn test_availability_summarizes_catalogue() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let availability = service(dir.path()).backend().availability().await.unwrap();
    assert!(availability.is_available);
    assert_eq!(availability.queue_depth, Some(45));
    assert_eq!(
        availability.status_message.as_deref(),
        Some("3 of 4 backends operational")
    );
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_registry_builds_archive_backend() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let mut registry = BackendRegistry::new();
    registry.register::<ArchiveBackend>(BACKEND_NAME);

    let config = BackendConfig::new(BACKEND_NAME)
        .with_endpoint(dir.path().to_string_lossy())
        .with_token("tok-123");
    let backend = registry.create(BACKEND_NAME, config).unwrap();
    assert_eq!(backend.name(), "archive");

    let result = backend.wait(&JobId::new("bell01")).await.unwrap();
    assert_eq!(result.shots, 500);
}

#[test]
fn test_registry_without_token() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = BackendRegistry::new();
    registry.register::<ArchiveBackend>(BACKEND_NAME);

    let config = BackendConfig::new(BACKEND_NAME).with_endpoint(dir.path().to_string_lossy());
    let err = registry.create(BACKEND_NAME, config).err().unwrap();
    assert!(err.is_auth());
}
