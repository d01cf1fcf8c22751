use crate::delta::strong::{strong_digest, DIGEST_BYTES};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Position of a hashed block inside the target file.
///
/// `round_offset` is where the producing round began scanning (always zero
/// for the first round), `index` the ordinal of the block within that scan.
/// The absolute offset is `round_offset + index * block_len`, where only
/// the producer knows the block length; consumers carry it alongside in
/// copy records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPos {
    pub round_offset: u64,
    pub index: u32,
}

impl TargetPos {
    pub fn absolute(&self, block_len: u32) -> u64 {
        self.round_offset + self.index as u64 * block_len as u64
    }
}

/// A block's strong digest together with where it sits in the target.
///
/// Identity is the digest alone: two records with equal digests are the
/// same block content wherever they appear, and the index keeps only one.
#[derive(Debug, Clone, Copy)]
pub struct StrongRecord {
    pub digest: [u8; DIGEST_BYTES],
    pub pos: TargetPos,
}

impl PartialEq for StrongRecord {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for StrongRecord {}

impl PartialOrd for StrongRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StrongRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digest.cmp(&other.digest)
    }
}

/// Multimap from fast hash to the strong records sharing it.
///
/// Fast-hash collisions are expected; the inner set disambiguates by
/// digest. Built once per round by the hashing side, consulted read-only
/// by the delta side, then discarded.
#[derive(Debug, Default)]
pub struct HashIndex {
    table: HashMap<u32, BTreeSet<StrongRecord>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its fast hash. A record whose digest is
    /// already present under that hash is dropped.
    pub fn insert(&mut self, fast: u32, record: StrongRecord) {
        self.table.entry(fast).or_default().insert(record);
    }

    /// Look up the block at `window`. Misses cheaply when the fast hash is
    /// absent; otherwise computes the strong digest of the window and
    /// matches on that alone.
    pub fn find_block(&self, fast: u32, window: &[u8]) -> Option<&StrongRecord> {
        let set = self.table.get(&fast)?;
        let probe = StrongRecord {
            digest: strong_digest(window),
            // Position is irrelevant to lookup identity.
            pos: TargetPos {
                round_offset: 0,
                index: u32::MAX,
            },
        };
        set.get(&probe)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of distinct records across all fast-hash buckets.
    pub fn len(&self) -> usize {
        self.table.values().map(BTreeSet::len).sum()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
