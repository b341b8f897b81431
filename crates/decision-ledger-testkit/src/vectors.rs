//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical byte encoding of records, which every
//! operation receipt is hashed over. A change here changes every receipt.

use decision_ledger_core::{
    canonical_record_bytes, Author, DecisionRecord, NewRecord, SequenceId,
};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub sequence_id: u64,
    pub category: &'static str,
    pub message: &'static str,
    /// Author public key bytes.
    pub author: [u8; 32],
    pub recorded_at: u64,
    /// Expected canonical bytes (hex).
    pub expected_canonical: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "first bootstrap log",
            sequence_id: 0,
            category: "bootstrap",
            message: "first on-chain log",
            author: [0x11; 32],
            recorded_at: 1_736_870_400_000,
            expected_canonical: "a500000169626f6f74737472617002726669727374206f6e2d636861696e206c6f67\
                                 03582011111111111111111111111111111111111111111111111111111111111111\
                                 11041b00000194658b1000",
        },
        GoldenVector {
            name: "second bootstrap log",
            sequence_id: 1,
            category: "bootstrap",
            message: "second on-chain log",
            author: [0x11; 32],
            recorded_at: 1_736_870_401_000,
            expected_canonical: "a500010169626f6f74737472617002737365636f6e64206f6e2d636861696e206c6f\
                                 67035820111111111111111111111111111111111111111111111111111111111111\
                                 1111041b00000194658b13e8",
        },
        GoldenVector {
            name: "two-byte sequence id, multi-byte message, zero time",
            sequence_id: 300,
            category: "risk",
            message: "décision",
            author: [0x00; 32],
            recorded_at: 0,
            expected_canonical: "a50019012c01647269736b026964c3a9636973696f6e035820000000000000000000\
                                 00000000000000000000000000000000000000000000000400",
        },
    ]
}

/// Build the record a vector describes.
pub fn record_from_vector(vector: &GoldenVector) -> DecisionRecord {
    NewRecord::new(
        vector.category,
        vector.message,
        Author::from_bytes(vector.author),
        vector.recorded_at,
    )
    .into_record(SequenceId(vector.sequence_id))
}

/// Verify every vector, returning the name and actual hex of the first
/// mismatch.
pub fn verify_all_vectors() -> Result<(), (String, String)> {
    for vector in all_vectors() {
        let record = record_from_vector(&vector);
        let actual = canonical_record_bytes(&record)
            .map(hex::encode)
            .map_err(|e| (vector.name.to_string(), e.to_string()))?;
        if actual != vector.expected_canonical {
            return Err((vector.name.to_string(), actual));
        }
    }
    Ok(())
}
