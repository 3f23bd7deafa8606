//! Fuzz target: `CrashLog` ring buffer
//!
//! Drives the KV-backed ring with arbitrary entries and also plants raw
//! fuzz bytes in a slot to exercise decoding. Verifies:
//! - No panics on corrupted slot contents
//! - `read_all` never returns more than `CRASH_RING_SLOTS` entries
//! - `take_unreported` hands each entry out once
//!
//! cargo fuzz run fuzz_crash_log

#![no_main]

use libfuzzer_sys::fuzz_target;
use mflt_demo::adapters::nvs::NvsAdapter;
use mflt_demo::app::ports::KvStorePort;
use mflt_demo::diagnostics::{CrashEntry, CrashLog, CRASH_RING_SLOTS};

fuzz_target!(|data: &[u8]| {
    let Some((&count, rest)) = data.split_first() else {
        return;
    };
    let Ok(mut kv) = NvsAdapter::new() else {
        return;
    };

    let mut log = CrashLog::new();
    log.init(&kv);

    let writes = count as usize % 8;
    for i in 0..writes {
        let reason = core::str::from_utf8(rest).unwrap_or("fuzz");
        let pc = u32::from_le_bytes(
            rest.get(..4).and_then(|s| s.try_into().ok()).unwrap_or([0; 4]),
        );
        log.write_entry(&mut kv, &CrashEntry::new(i as u64, reason, pc));
    }

    // Raw bytes in a slot must decode to an entry or be skipped.
    let _ = kv.write("crash", "e3", rest);
    if let Ok(entry) = postcard::from_bytes::<CrashEntry>(rest) {
        let _ = postcard::to_allocvec(&entry);
    }

    let entries = log.read_all(&kv);
    assert!(entries.len() <= CRASH_RING_SLOTS);

    let first = log.take_unreported(&mut kv);
    assert!(first.len() <= CRASH_RING_SLOTS);
    let second = log.take_unreported(&mut kv);
    assert!(second.is_empty(), "entries reported twice");

    log.clear(&mut kv);
    assert!(log.read_all(&kv).is_empty());
});
