//! End-to-end ledger and registry behaviour.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use veriset::pipeline::{
    MemoryBlobStore, TrainingOutput, TrainingPayload, TrainingRequest, TrainingResponse,
    TrainingService,
};
use veriset::store::{InsertResult, LedgerStore, MemoryStore};
use veriset::{
    digest, open_store, DigestOrigin, ErrorKind, ProvenanceLedger, Registry, RegistryConfig,
    RequestId, Source, StoreConfig, VerificationStatus,
};
use veriset_testkit::{init_tracing, make_record, TestFixture};

fn ledger() -> ProvenanceLedger<MemoryStore> {
    ProvenanceLedger::new(MemoryStore::new(), RegistryConfig::default()).unwrap()
}

#[tokio::test]
async fn test_ledger_outcomes() {
    init_tracing();
    let fixture = TestFixture::new();
    let ledger = ledger();

    let a_path = fixture.write_file("a.csv", b"dataset A");
    let b_path = fixture.write_file("b.csv", b"dataset B");
    let a_label = a_path.to_string_lossy().into_owned();

    ledger
        .register(make_record("r1", b"dataset A", &a_label, 100))
        .await
        .unwrap();

    let valid = ledger.verify("r1", &Source::path(&a_path)).await.unwrap();
    assert_eq!(valid.status, VerificationStatus::Valid);
    assert!(valid.valid);
    assert!(valid.details.hash_match && valid.details.path_match);

    let mismatch = ledger.verify("r1", &Source::path(&b_path)).await.unwrap();
    assert_eq!(mismatch.status, VerificationStatus::Mismatch);
    assert!(!mismatch.valid);

    let not_found = ledger.verify("unknown", &Source::path(&a_path)).await.unwrap();
    assert_eq!(not_found.status, VerificationStatus::NotFound);
    assert!(!not_found.valid);
}

#[tokio::test]
async fn test_modified_file_at_same_path() {
    let fixture = TestFixture::new();
    let config = RegistryConfig {
        cache_digests: false,
        ..RegistryConfig::default()
    };
    let ledger = ProvenanceLedger::new(MemoryStore::new(), config).unwrap();

    let path = fixture.write_file("train.csv", b"original");
    let label = path.to_string_lossy().into_owned();
    ledger
        .register(make_record("r1", b"original", &label, 1))
        .await
        .unwrap();

    fixture.write_file("train.csv", b"tampered");

    let outcome = ledger.verify("r1", &Source::path(&path)).await.unwrap();
    assert_eq!(outcome.status, VerificationStatus::PathMatchContentMismatch);
    assert!(!outcome.valid);
    assert!(outcome.warning.is_some());
    assert!(outcome.details.path_match);
    assert!(!outcome.details.hash_match);
}

#[tokio::test]
async fn test_digest_cache_returns_stale_digest() {
    let fixture = TestFixture::new();
    let ledger = ledger();

    let path = fixture.write_file("train.csv", b"original");
    let label = path.to_string_lossy().into_owned();
    ledger
        .register(make_record("r1", b"original", &label, 1))
        .await
        .unwrap();

    let first = ledger.verify("r1", &Source::path(&path)).await.unwrap();
    assert_eq!(first.status, VerificationStatus::Valid);

    // The cache is keyed by path and never evicted.
    fixture.write_file("train.csv", b"tampered");
    let second = ledger.verify("r1", &Source::path(&path)).await.unwrap();
    assert_eq!(second.status, VerificationStatus::Valid);
}

#[tokio::test]
async fn test_overwrite_then_verify_old_content() {
    let ledger = ledger();

    ledger
        .register(make_record("r1", b"old", "old.csv", 1))
        .await
        .unwrap();
    let result = ledger
        .register(make_record("r1", b"new", "new.csv", 2))
        .await
        .unwrap();
    assert_eq!(result, InsertResult::Replaced);

    let outcome = ledger
        .verify("r1", &Source::bytes("old.csv", &b"old"[..]))
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Mismatch);
}

#[tokio::test]
async fn test_history_newest_first() {
    let ledger = ledger();

    ledger.register(make_record("r1", b"1", "1.csv", 100)).await.unwrap();
    ledger.register(make_record("r3", b"3", "3.csv", 300)).await.unwrap();
    ledger.register(make_record("r2", b"2", "2.csv", 200)).await.unwrap();

    let ids: Vec<String> = ledger
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.request_id.to_string())
        .collect();
    assert_eq!(ids, vec!["r3", "r2", "r1"]);
}

#[tokio::test]
async fn test_path_fallback_is_flagged() {
    let ledger = ledger();
    let missing = "/no/such/dir/train.csv";

    ledger
        .register(make_record("r1", missing.as_bytes(), missing, 1))
        .await
        .unwrap();

    let outcome = ledger.verify("r1", &Source::path(missing)).await.unwrap();
    assert_eq!(outcome.status, VerificationStatus::PathFallbackMatch);
    assert!(outcome.valid);
    assert!(outcome.warning.is_some());
    assert_eq!(outcome.details.digest_origin, Some(DigestOrigin::PathText));
}

#[tokio::test]
async fn test_path_fallback_disabled() {
    let config = RegistryConfig {
        allow_path_fallback: false,
        ..RegistryConfig::default()
    };
    let ledger = ProvenanceLedger::new(MemoryStore::new(), config).unwrap();
    ledger
        .register(make_record("r1", b"x", "x.csv", 1))
        .await
        .unwrap();

    let err = ledger
        .verify("r1", &Source::path("/no/such/dir/x.csv"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceReadFailure);
}

#[tokio::test]
async fn test_verify_empty_file_is_error() {
    let fixture = TestFixture::new();
    let ledger = ledger();
    ledger
        .register(make_record("r1", b"x", "x.csv", 1))
        .await
        .unwrap();

    let empty = fixture.write_file("empty.csv", b"");
    let err = ledger.verify("r1", &Source::path(&empty)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyInput);
}

#[tokio::test]
async fn test_concurrent_registration() {
    let ledger = Arc::new(ledger());

    let mut handles = Vec::new();
    for i in 0..64 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            let id = format!("r{}", i);
            let content = format!("content {}", i);
            ledger
                .register(make_record(&id, content.as_bytes(), "c.csv", i))
                .await
                .unwrap();
            let outcome = ledger
                .verify(&id, &Source::bytes("c.csv", content.into_bytes()))
                .await
                .unwrap();
            assert_eq!(outcome.status, VerificationStatus::Valid);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(ledger.list().await.unwrap().len(), 64);
}

#[tokio::test]
async fn test_register_dataset_reports_tree_shape() {
    let config = RegistryConfig {
        chunk_size: 4,
        ..RegistryConfig::default()
    };
    let fixture = TestFixture::with_config(config);
    let path = fixture.write_file("data.bin", b"0123456789");

    let registration = fixture
        .registry
        .register_dataset(&Source::path(&path))
        .await
        .unwrap();

    assert_eq!(registration.chunk_count, 3);
    assert_eq!(registration.file_size, 10);
    assert_eq!(
        registration.merkle_root,
        veriset::hash_reader(&b"0123456789"[..], 4).unwrap().root()
    );
    assert!(!registration.blob_reference.blob_id.is_empty());
    assert_eq!(registration.integrity_tag.as_bytes()[..5], b"itag-"[..]);
    assert!(registration.tx_digest.is_none());
    assert!(fixture.registrar.events().await.is_empty());
}

#[tokio::test]
async fn test_register_dataset_on_chain() {
    let config = RegistryConfig {
        register_on_chain: true,
        ..RegistryConfig::default()
    };
    let fixture = TestFixture::with_config(config);

    let registration = fixture
        .registry
        .register_dataset(&Source::bytes("upload.csv", &b"rows"[..]))
        .await
        .unwrap();

    assert!(registration.tx_digest.is_some());
    let events = fixture.registrar.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].dataset_id, registration.dataset_id);
    assert_eq!(events[0].merkle_root, registration.merkle_root);
}

#[tokio::test]
async fn test_register_dataset_errors() {
    let fixture = TestFixture::new();

    let empty = fixture
        .registry
        .register_dataset(&Source::bytes("empty", Bytes::new()))
        .await
        .unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::EmptyInput);
    assert!(!empty.is_upstream());

    let unreadable = fixture
        .registry
        .register_dataset(&Source::path("/no/such/file"))
        .await
        .unwrap_err();
    assert_eq!(unreadable.kind(), ErrorKind::SourceReadFailure);

    fixture.blobs.set_failing(true);
    let upload = fixture
        .registry
        .register_dataset(&Source::bytes("x", &b"x"[..]))
        .await
        .unwrap_err();
    assert_eq!(upload.kind(), ErrorKind::UpstreamUploadFailure);
    assert!(upload.is_upstream());
}

#[tokio::test]
async fn test_train_then_verify() {
    let config = RegistryConfig {
        verify_training_signatures: true,
        ..RegistryConfig::default()
    };
    let fixture = TestFixture::with_config(config);
    let path = fixture.write_file("train.csv", b"x,y\n1,2\n3,4\n");
    let source = Source::path(&path);

    let run = fixture
        .registry
        .train(&source, "epochs=2", "model-v1")
        .await
        .unwrap();

    assert_eq!(run.record.request_id.as_str(), run.response.response.data.request_hash);
    assert_eq!(run.record.authenticity_tag, run.response.signature);
    assert_eq!(run.record.timestamp, run.response.response.timestamp_ms as i64);
    assert_eq!(run.record.content_digest, digest(b"x,y\n1,2\n3,4\n"));
    run.response
        .verify_signature(&fixture.trainer.verifying_key())
        .unwrap();

    let outcome = fixture
        .registry
        .verify(run.record.request_id.as_str(), &source)
        .await
        .unwrap();
    assert_eq!(outcome.status, VerificationStatus::Valid);

    let history = fixture.registry.list_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].artifact_ref, "model-v1");
    assert_eq!(history[0].source_label, path.to_string_lossy());
}

#[tokio::test]
async fn test_train_upstream_failure() {
    let fixture = TestFixture::new();
    fixture.trainer.set_failing(true);

    let err = fixture
        .registry
        .train(&Source::bytes("d", &b"d"[..]), "x", "m")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamProcessingFailure);
    assert!(fixture.registry.list_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_train_unreadable_source_is_error() {
    let fixture = TestFixture::new();
    assert!(fixture.registry.config().allow_path_fallback);
    let missing = Source::path(fixture.dir().join("no-such-dir").join("train.csv"));

    let err = fixture
        .registry
        .train(&missing, "epochs=1", "model")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceReadFailure);
    assert!(fixture.registry.list_history().await.unwrap().is_empty());
}

/// Training service stamping responses past the end of `i64`.
struct FarFutureTrainer;

#[async_trait]
impl TrainingService for FarFutureTrainer {
    async fn process(
        &self,
        request: TrainingRequest,
    ) -> veriset::pipeline::Result<TrainingResponse> {
        Ok(TrainingResponse {
            response: TrainingPayload {
                data: TrainingOutput {
                    request_hash: digest(request.input_data.as_bytes()).to_hex(),
                    updated_weights: vec![0.5],
                },
                timestamp_ms: u64::MAX,
            },
            signature: String::new(),
        })
    }
}

#[tokio::test]
async fn test_train_rejects_out_of_range_timestamp() {
    let registry = Registry::new(
        MemoryStore::new(),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(FarFutureTrainer),
        RegistryConfig::default(),
    )
    .unwrap();

    let err = registry
        .train(&Source::bytes("d", &b"d"[..]), "x", "m")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedCollaboratorResponse);
    assert!(registry.list_history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_blob_detects_corruption() {
    let fixture = TestFixture::new();
    let data = Bytes::from_static(b"stored dataset");

    let registration = fixture
        .registry
        .register_dataset(&Source::bytes("upload.csv", data.clone()))
        .await
        .unwrap();
    let blob_id = registration.blob_reference.blob_id.clone();

    let run = fixture
        .registry
        .train(&Source::bytes(blob_id.as_str(), data), "x", "m")
        .await
        .unwrap();
    let request_id = run.record.request_id.as_str();

    let intact = fixture.registry.verify_blob(request_id, &blob_id).await.unwrap();
    assert_eq!(intact.status, VerificationStatus::Valid);

    fixture
        .blobs
        .corrupt(&blob_id, Bytes::from_static(b"stored datasex"))
        .await;
    let corrupted = fixture.registry.verify_blob(request_id, &blob_id).await.unwrap();
    assert_eq!(corrupted.status, VerificationStatus::PathMatchContentMismatch);
}

#[tokio::test]
async fn test_sqlite_ledger_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = StoreConfig::Sqlite {
        path: dir.path().join("ledger.db"),
    };

    {
        let ledger = ProvenanceLedger::new(open_store(&config)?, RegistryConfig::default())?;
        ledger
            .register(make_record("r1", b"durable", "d.csv", 7))
            .await?;
    }

    let store = open_store(&config)?;
    let record = store
        .get_record(&RequestId::new("r1")?)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record lost on reopen"))?;
    assert_eq!(record.content_digest, digest(b"durable"));

    let ledger = ProvenanceLedger::new(store, RegistryConfig::default())?;
    let outcome = ledger
        .verify("r1", &Source::bytes("d.csv", &b"durable"[..]))
        .await?;
    assert_eq!(outcome.status, VerificationStatus::Valid);
    Ok(())
}
