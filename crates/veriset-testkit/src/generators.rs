//! Proptest generators for property-based testing.

use proptest::prelude::*;

use veriset_core::{Digest, ProvenanceRecord, RequestId};

/// Generate a non-empty dataset of at most `max_len` bytes.
pub fn dataset(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Generate a dataset plus a single-byte mutation: (data, index, xor mask).
///
/// The mask is never zero, so the mutated byte always differs.
pub fn dataset_with_mutation(max_len: usize) -> impl Strategy<Value = (Vec<u8>, usize, u8)> {
    dataset(max_len).prop_flat_map(|data| {
        let len = data.len();
        (Just(data), 0..len, 1u8..=u8::MAX)
    })
}

/// Apply a mutation produced by [`dataset_with_mutation`].
pub fn mutate(data: &[u8], index: usize, mask: u8) -> Vec<u8> {
    let mut out = data.to_vec();
    out[index] ^= mask;
    out
}

/// Generate a small chunk size, so short datasets still span many leaves.
pub fn chunk_size() -> impl Strategy<Value = usize> {
    1usize..=64
}

/// Generate a request identifier.
pub fn request_id() -> impl Strategy<Value = RequestId> {
    "[a-f0-9]{8,64}".prop_filter_map("non-empty", |s| RequestId::new(s).ok())
}

/// Generate a digest.
pub fn digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest::from_bytes)
}

/// Generate a source label.
pub fn source_label() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_/-]{0,31}\\.(csv|json|bin)".prop_map(String::from)
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=1_900_000_000_000i64
}

/// Parameters for generating a provenance record.
#[derive(Debug, Clone)]
pub struct RecordParams {
    pub request_id: RequestId,
    pub content_digest: Digest,
    pub source_label: String,
    pub artifact_ref: String,
    pub timestamp: i64,
}

impl Arbitrary for RecordParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            request_id(),
            digest(),
            source_label(),
            "[a-z0-9-]{1,16}",
            timestamp(),
        )
            .prop_map(|(request_id, content_digest, source_label, artifact_ref, timestamp)| {
                RecordParams {
                    request_id,
                    content_digest,
                    source_label,
                    artifact_ref,
                    timestamp,
                }
            })
            .boxed()
    }
}

impl RecordParams {
    pub fn to_record(&self) -> ProvenanceRecord {
        ProvenanceRecord::builder(self.request_id.clone(), self.content_digest)
            .source_label(self.source_label.clone())
            .artifact_ref(self.artifact_ref.clone())
            .authenticity_tag(hex::encode(self.content_digest.as_bytes()))
            .timestamp(self.timestamp)
            .build()
    }
}
