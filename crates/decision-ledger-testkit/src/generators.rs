//! Proptest generators for property-based testing.

use proptest::prelude::*;

use decision_ledger_core::{
    Author, EntryLimits, Keypair, LedgerId, NewRecord, DEFAULT_MAX_CATEGORY_LEN,
    DEFAULT_MAX_MESSAGE_LEN,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Author.
pub fn author() -> impl Strategy<Value = Author> {
    any::<[u8; 32]>().prop_map(Author::from_bytes)
}

/// Generate a random LedgerId.
pub fn ledger_id() -> impl Strategy<Value = LedgerId> {
    any::<[u8; 32]>().prop_map(LedgerId::from_bytes)
}

/// Generate a reasonable timestamp in Unix milliseconds.
pub fn timestamp() -> impl Strategy<Value = u64> {
    0u64..=u64::MAX / 2
}

/// Generate a category that passes the default limits.
pub fn category() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,31}".prop_map(String::from)
}

/// Generate a message that passes the default limits.
///
/// Includes multi-byte characters so byte and char lengths differ.
pub fn message() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,é€]{1,200}".prop_map(String::from)
}

/// Generate a `(category, message)` pair the default limits accept.
pub fn valid_entry() -> impl Strategy<Value = (String, String)> {
    (category(), message())
}

/// Generate a `(category, message)` pair the default limits reject.
pub fn invalid_entry() -> impl Strategy<Value = (String, String)> {
    prop_oneof![
        message().prop_map(|m| (String::new(), m)),
        category().prop_map(|c| (c, String::new())),
        message().prop_map(|m| ("c".repeat(DEFAULT_MAX_CATEGORY_LEN + 1), m)),
        category().prop_map(|c| (c, "m".repeat(DEFAULT_MAX_MESSAGE_LEN + 1))),
    ]
}

/// Generate limits small enough that generated entries hit them.
pub fn tight_limits() -> impl Strategy<Value = EntryLimits> {
    (1usize..=16, 1usize..=64).prop_map(|(c, m)| EntryLimits::new(c, m))
}

/// Parameters for generating a candidate record.
#[derive(Debug, Clone)]
pub struct EntryParams {
    pub category: String,
    pub message: String,
    pub author: Author,
    pub recorded_at: u64,
}

impl EntryParams {
    pub fn to_new_record(&self) -> NewRecord {
        NewRecord::new(
            self.category.clone(),
            self.message.clone(),
            self.author,
            self.recorded_at,
        )
    }
}

impl Arbitrary for EntryParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (category(), message(), author(), timestamp())
            .prop_map(|(category, message, author, recorded_at)| EntryParams {
                category,
                message,
                author,
                recorded_at,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decision_ledger_core::{
        canonical_record_bytes, compute_receipt, validate_entry, SequenceId,
    };

    proptest! {
        #[test]
        fn valid_entries_pass_default_limits((c, m) in valid_entry()) {
            prop_assert!(validate_entry(&c, &m, &EntryLimits::default()).is_ok());
        }

        #[test]
        fn invalid_entries_fail_default_limits((c, m) in invalid_entry()) {
            prop_assert!(validate_entry(&c, &m, &EntryLimits::default()).is_err());
        }

        #[test]
        fn canonical_bytes_deterministic(params: EntryParams, seq in 0u64..1_000_000) {
            let r1 = params.to_new_record().into_record(SequenceId(seq));
            let r2 = params.to_new_record().into_record(SequenceId(seq));
            prop_assert_eq!(
                canonical_record_bytes(&r1).unwrap(),
                canonical_record_bytes(&r2).unwrap()
            );
        }

        #[test]
        fn receipt_depends_on_ledger(params: EntryParams, a in ledger_id(), b in ledger_id()) {
            prop_assume!(a != b);
            let record = params.to_new_record().into_record(SequenceId(0));
            prop_assert_ne!(
                compute_receipt(&a, &record).unwrap(),
                compute_receipt(&b, &record).unwrap()
            );
        }
    }
}
