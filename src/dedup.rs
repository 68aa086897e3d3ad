//! Membership set and deduplicators
//!
//! The membership set remembers every fingerprint seen during one run. It
//! never evicts and has no capacity limit: a run over N unique records holds
//! N digests in memory until it ends, and nothing is spilled to disk.

use crate::fingerprint::{Blake3, DigestKind, ExactKey, Fingerprinter, Md5};
use ahash::RandomState;
use hashbrown::HashSet;
use std::hash::Hash;
use std::mem;

/// Fingerprints seen so far in the current run
#[derive(Debug)]
pub struct MembershipSet<D> {
    seen: HashSet<D, RandomState>,
    heap_bytes: usize,
}

impl<D: Eq + Hash> MembershipSet<D> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity_and_hasher(capacity, RandomState::new()),
            heap_bytes: 0,
        }
    }

    /// Returns `true` if `digest` was already present, otherwise records it
    /// and returns `false`.
    #[inline]
    pub fn contains_or_insert(&mut self, digest: D) -> bool {
        !self.seen.insert(digest)
    }

    pub fn contains(&self, digest: &D) -> bool {
        self.seen.contains(digest)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Approximate bytes held by the table: one slot plus one control byte
    /// per bucket, and any heap data owned by stored digests
    pub fn memory_usage(&self) -> usize {
        self.seen.capacity() * (mem::size_of::<D>() + 1) + self.heap_bytes
    }

    fn add_heap_bytes(&mut self, bytes: usize) {
        self.heap_bytes += bytes;
    }
}

impl<D: Eq + Hash> Default for MembershipSet<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Key-level deduplication, independent of the digest in use
pub trait Deduplicator {
    /// Returns `true` if `key` has been seen before in this run
    fn check_and_insert(&mut self, key: &[u8]) -> bool;

    /// Number of unique keys remembered
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate memory held by the membership set in bytes
    fn memory_usage(&self) -> usize;
}

/// Fingerprints keys with `F` and tracks them in a [`MembershipSet`]
pub struct FingerprintDeduplicator<F: Fingerprinter> {
    fingerprinter: F,
    set: MembershipSet<F::Digest>,
}

impl<F: Fingerprinter> FingerprintDeduplicator<F> {
    pub fn new(fingerprinter: F) -> Self {
        Self::with_capacity(fingerprinter, 0)
    }

    pub fn with_capacity(fingerprinter: F, capacity: usize) -> Self {
        Self {
            fingerprinter,
            set: MembershipSet::with_capacity(capacity),
        }
    }
}

impl<F: Fingerprinter> Deduplicator for FingerprintDeduplicator<F> {
    #[inline]
    fn check_and_insert(&mut self, key: &[u8]) -> bool {
        let digest = self.fingerprinter.fingerprint(key);
        let heap = F::heap_size(&digest);
        let duplicate = self.set.contains_or_insert(digest);
        if !duplicate {
            self.set.add_heap_bytes(heap);
        }
        duplicate
    }

    fn len(&self) -> usize {
        self.set.len()
    }

    fn memory_usage(&self) -> usize {
        self.set.memory_usage()
    }
}

/// Build the deduplicator for a run
pub fn create_deduplicator(kind: DigestKind, capacity: usize) -> Box<dyn Deduplicator> {
    match kind {
        DigestKind::Md5 => Box::new(FingerprintDeduplicator::with_capacity(Md5, capacity)),
        DigestKind::Blake3 => Box::new(FingerprintDeduplicator::with_capacity(Blake3, capacity)),
        DigestKind::Exact => Box::new(FingerprintDeduplicator::with_capacity(ExactKey, capacity)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_set() {
        let mut set = MembershipSet::new();

        assert!(!set.contains_or_insert([1u8; 16]));
        assert!(!set.contains_or_insert([2u8; 16]));
        assert!(set.contains_or_insert([1u8; 16]));

        assert_eq!(set.len(), 2);
        assert!(set.contains(&[2u8; 16]));
        assert!(!set.contains(&[3u8; 16]));
    }

    #[test]
    fn test_sets_are_independent() {
        let mut first = MembershipSet::new();
        let mut second = MembershipSet::new();

        assert!(!first.contains_or_insert(7u64));
        assert!(!second.contains_or_insert(7u64));
        assert!(first.contains_or_insert(7u64));
    }

    #[test]
    fn test_every_digest_kind() {
        for kind in [DigestKind::Md5, DigestKind::Blake3, DigestKind::Exact] {
            let mut dedup = create_deduplicator(kind, 16);

            assert!(!dedup.check_and_insert(b"test1"));
            assert!(!dedup.check_and_insert(b"test2"));
            assert!(dedup.check_and_insert(b"test1"));
            assert!(!dedup.check_and_insert(b""));
            assert!(dedup.check_and_insert(b""));

            assert_eq!(dedup.len(), 3, "{kind}");
        }
    }

    // Fingerprint equality stands in for key equality. With 128-bit digests a
    // false duplicate needs a collision, which cannot be provoked in a test;
    // the exact mode compares keys directly.
    #[test]
    fn test_exact_keys_tracks_heap() {
        let mut dedup = FingerprintDeduplicator::new(ExactKey);
        let empty = dedup.memory_usage();

        assert!(!dedup.check_and_insert(b"0123456789"));
        assert!(dedup.check_and_insert(b"0123456789"));

        assert!(dedup.memory_usage() >= empty + 10);
    }

    #[test]
    fn test_memory_grows_with_unique_keys() {
        let mut dedup = FingerprintDeduplicator::new(Md5);
        assert!(dedup.is_empty());

        for i in 0..1000u32 {
            dedup.check_and_insert(&i.to_le_bytes());
        }

        assert_eq!(dedup.len(), 1000);
        assert!(dedup.memory_usage() >= 1000 * 17);
    }
}
