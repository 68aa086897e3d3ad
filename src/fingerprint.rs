//! Fingerprint functions
//!
//! A fingerprint stands in for its key inside the membership set, so memory
//! grows with the digest width rather than with key length. Equal keys always
//! yield equal fingerprints. Distinct keys sharing a fingerprint would be
//! reported as duplicates; for MD5 that takes around 2^64 unique keys before
//! it becomes likely, for BLAKE3 around 2^128. [`ExactKey`] removes the risk
//! entirely by storing the key itself.

use clap::ValueEnum;
use std::fmt;
use std::hash::Hash;

/// Maps a key to the value stored in the membership set
pub trait Fingerprinter {
    type Digest: Eq + Hash;

    fn fingerprint(&self, key: &[u8]) -> Self::Digest;

    /// Heap bytes owned by a stored digest beyond its inline size
    fn heap_size(_digest: &Self::Digest) -> usize {
        0
    }
}

/// 128-bit MD5 digest
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5;

impl Fingerprinter for Md5 {
    type Digest = [u8; 16];

    #[inline]
    fn fingerprint(&self, key: &[u8]) -> [u8; 16] {
        md5::compute(key).0
    }
}

/// 256-bit BLAKE3 digest, for inputs where MD5's collision bound is too loose
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3;

impl Fingerprinter for Blake3 {
    type Digest = [u8; 32];

    #[inline]
    fn fingerprint(&self, key: &[u8]) -> [u8; 32] {
        blake3::hash(key).into()
    }
}

/// Keeps the full key; no false positives, memory grows with key bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactKey;

impl Fingerprinter for ExactKey {
    type Digest = Box<[u8]>;

    #[inline]
    fn fingerprint(&self, key: &[u8]) -> Box<[u8]> {
        key.into()
    }

    fn heap_size(digest: &Box<[u8]>) -> usize {
        digest.len()
    }
}

/// Fingerprint selection exposed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DigestKind {
    /// 128-bit MD5 (default)
    #[default]
    Md5,
    /// 256-bit BLAKE3, lower collision risk for very large inputs
    Blake3,
    /// Store whole keys, zero false positives
    Exact,
}

impl fmt::Display for DigestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5 (128-bit)"),
            Self::Blake3 => write!(f, "blake3 (256-bit)"),
            Self::Exact => write!(f, "exact keys"),
        }
    }
}
