//! Fuzz target for the snapshot decoder and loader.
//!
//! Arbitrary bytes go through format detection and decoding; anything that
//! decodes is handed to `from_snapshot`, which must reject inconsistent
//! graphs with an error rather than panic.
//!
//! # Running
//!
//! ```bash
//! cd fuzz
//! cargo +nightly fuzz run fuzz_snapshot_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use vellum_core::{DistanceMetric, HnswIndex, IndexSnapshot, MemoryVectorStore};

fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = IndexSnapshot::from_bytes(data) else {
        return;
    };
    if let Ok(index) =
        HnswIndex::from_snapshot(DistanceMetric::Cosine, &snapshot, MemoryVectorStore::new())
    {
        let _ = index.export_index();
    }
});
