//! Append policy: the single check point deciding who may append.
//!
//! Sequencing and storage never look at authorization; swapping the policy
//! changes nothing else.

use std::collections::HashSet;

use decision_ledger_core::Author;

/// Decides whether an author may append to the ledger.
pub trait AppendPolicy: Send + Sync {
    fn authorize(&self, author: &Author) -> bool;
}

/// Anyone may append.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenWrite;

impl AppendPolicy for OpenWrite {
    fn authorize(&self, _author: &Author) -> bool {
        true
    }
}

/// Only listed authors may append.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    authors: HashSet<Author>,
}

impl AllowList {
    pub fn new(authors: impl IntoIterator<Item = Author>) -> Self {
        Self {
            authors: authors.into_iter().collect(),
        }
    }

    pub fn allow(&mut self, author: Author) {
        self.authors.insert(author);
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

impl AppendPolicy for AllowList {
    fn authorize(&self, author: &Author) -> bool {
        self.authors.contains(author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_write_allows_everyone() {
        assert!(OpenWrite.authorize(&Author::from_bytes([0; 32])));
        assert!(OpenWrite.authorize(&Author::from_bytes([0xff; 32])));
    }

    #[test]
    fn test_allow_list() {
        let alice = Author::from_bytes([1; 32]);
        let bob = Author::from_bytes([2; 32]);

        let mut policy = AllowList::new([alice]);
        assert!(policy.authorize(&alice));
        assert!(!policy.authorize(&bob));

        policy.allow(bob);
        assert!(policy.authorize(&bob));
        assert_eq!(policy.len(), 2);
    }

    #[test]
    fn test_empty_allow_list_denies_all() {
        let policy = AllowList::default();
        assert!(policy.is_empty());
        assert!(!policy.authorize(&Author::from_bytes([1; 32])));
    }
}
