//! Boot-to-upload flow of the HTTP task against the simulated client.

use mflt_demo::adapters::http_client::HttpChunkClient;
use mflt_demo::app::auto_connect::CredentialSource;
use mflt_demo::chunks::{Chunk, ChunkStore, DiagRecord};
use mflt_demo::config::BuildConfig;
use mflt_demo::diagnostics::{CrashEntry, CrashLog};
use mflt_demo::error::{Error, UploadError};
use mflt_demo::tasks::http::HttpTask;

use crate::mocks::{MockKv, MockWifi, RecordingDelay};

type Task = HttpTask<MockKv, MockWifi, HttpChunkClient, RecordingDelay>;

fn task(kv: MockKv, wifi: MockWifi) -> (Task, &'static ChunkStore) {
    let store: &'static ChunkStore = Box::leak(Box::new(ChunkStore::new()));
    let build = BuildConfig {
        wifi_ssid: "BuildNet",
        wifi_auth_type: "wpa2",
        wifi_password: "buildpass",
        project_key: "test-key",
        ..BuildConfig::default()
    };
    let client = HttpChunkClient::new("DEADBEEFCAFE", build.project_key);
    let task = HttpTask::new(kv, wifi, client, RecordingDelay::default(), build, store);
    (task, store)
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_joins_with_compile_time_config() {
    let (mut t, _) = task(MockKv::new(), MockWifi::new());
    let outcome = t.boot_network().expect("boot succeeds");
    assert_eq!(outcome.source, Some(CredentialSource::CompileTime));
    assert!(matches!(outcome.result, Some(Ok(_))));
}

#[test]
fn failed_join_does_not_abort_boot() {
    let (mut t, _) = task(MockKv::new(), MockWifi::failing(5, 0x3001));
    let outcome = t.boot_network().expect("boot tolerates join failure");
    assert!(matches!(outcome.result, Some(Err(_))));
}

#[test]
fn client_init_failure_aborts_boot() {
    let (mut t, _) = task(MockKv::new(), MockWifi::new());
    t.transport().fail_init_with(UploadError::ClientInit(-1));
    assert_eq!(
        t.boot_network(),
        Err(Error::Upload(UploadError::ClientInit(-1)))
    );
}

#[test]
fn crashes_from_previous_boot_are_queued_once() {
    let mut kv = MockKv::new();
    let mut log = CrashLog::new();
    log.init(&kv);
    log.write_entry(&mut kv, &CrashEntry::new(12, "assert", 0x4008_1234));

    let (mut t, store) = task(kv, MockWifi::new());
    t.boot_network().unwrap();
    assert_eq!(store.len(), 1);

    // A second boot sees the entry already reported.
    t.boot_network().unwrap();
    assert_eq!(store.len(), 1);
}

// ── Upload ────────────────────────────────────────────────────

#[test]
fn queued_records_are_posted_as_postcard_chunks() {
    let (mut t, store) = task(MockKv::new(), MockWifi::new());
    t.boot_network().unwrap();
    store.record(DiagRecord::trace("first"));
    store.record(DiagRecord::trace("second"));

    assert_eq!(t.post_chunks(), 1);
    assert!(store.is_empty());

    let posted = t.transport().posted();
    assert_eq!(posted.len(), 1);
    let chunk: Chunk = postcard::from_bytes(&posted[0]).unwrap();
    assert_eq!(chunk.records.len(), 2);
}

#[test]
fn rejected_post_keeps_chunk_for_next_cycle() {
    let (mut t, store) = task(MockKv::new(), MockWifi::new());
    t.boot_network().unwrap();
    store.record(DiagRecord::trace("pending"));

    t.transport().reject_next(503);
    assert_eq!(t.post_chunks(), 0);
    assert_eq!(store.len(), 1);
    assert!(t.transport().posted().is_empty());

    assert_eq!(t.post_chunks(), 1);
    assert!(store.is_empty());
}

#[test]
fn posts_go_to_the_device_chunk_endpoint() {
    let (t, _) = task(MockKv::new(), MockWifi::new());
    assert_eq!(
        t.transport().url(),
        "https://chunks.memfault.com/api/v0/chunks/DEADBEEFCAFE"
    );
    assert_eq!(t.transport().project_key(), "test-key");
}
