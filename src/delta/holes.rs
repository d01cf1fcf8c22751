use std::collections::BTreeMap;

/// A contiguous, still-unmatched byte range of the source file, half-open
/// `[offset, offset + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hole {
    pub offset: u64,
    pub length: u64,
}

impl Hole {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Ordered set of disjoint holes.
///
/// Invariants: sorted by offset, pairwise non-overlapping, no zero-length
/// members. Initialized to one hole covering the whole source; only
/// [`HoleSet::split`] shrinks it between rounds.
#[derive(Debug, Clone, Default)]
pub struct HoleSet {
    // offset -> length
    holes: BTreeMap<u64, u64>,
}

impl HoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One hole covering `[0, length)`; empty when `length` is zero.
    pub fn single(length: u64) -> Self {
        let mut set = Self::new();
        if length > 0 {
            set.holes.insert(0, length);
        }
        set
    }

    /// Insert a hole. Callers are responsible for disjointness; zero-length
    /// holes are ignored.
    pub fn insert(&mut self, hole: Hole) {
        if hole.length > 0 {
            self.holes.insert(hole.offset, hole.length);
        }
    }

    /// The hole whose range contains `offset`, if any.
    pub fn find_containing(&self, offset: u64) -> Option<Hole> {
        let (&start, &length) = self.holes.range(..=offset).next_back()?;
        if offset < start + length {
            Some(Hole::new(start, length))
        } else {
            None
        }
    }

    /// Carve a matched range out of its containing hole, leaving the left
    /// and/or right remnants.
    ///
    /// ```text
    /// |--------------------------------------|
    /// |---------| matched block |------------|
    /// ```
    ///
    /// # Panics
    ///
    /// The delta pipeline only records ranges it just matched inside a
    /// hole, so a range with no fully-containing hole means the pipeline's
    /// bookkeeping broke; that is a bug, not a recoverable condition.
    pub fn split(&mut self, range: Hole) {
        let parent = self
            .find_containing(range.offset)
            .filter(|p| p.offset <= range.offset && p.end() >= range.end())
            .unwrap_or_else(|| {
                panic!(
                    "no hole contains [{}, {}): hole bookkeeping is corrupt",
                    range.offset,
                    range.end()
                )
            });

        self.holes.remove(&parent.offset);
        if parent.offset < range.offset {
            self.holes
                .insert(parent.offset, range.offset - parent.offset);
        }
        if parent.end() > range.end() {
            self.holes.insert(range.end(), parent.end() - range.end());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Hole> + '_ {
        self.holes
            .iter()
            .map(|(&offset, &length)| Hole::new(offset, length))
    }

    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.holes.len()
    }

    /// Total unresolved bytes across all holes.
    pub fn total_bytes(&self) -> u64 {
        self.holes.values().sum()
    }
}
