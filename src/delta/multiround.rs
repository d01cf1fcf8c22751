use crate::delta::generator::{generate_delta, DeltaSink, RoundMode};
use crate::delta::hasher::{hash_blocks, hash_file, hash_holes};
use crate::delta::holes::HoleSet;
use crate::delta::index::HashIndex;
use crate::delta::strong::FileDigest;
use crate::delta::{block_size, round_schedule, MIN_BLOCK_SIZE};
use crate::error::{DeltaError, Result};
use crate::reader::FileReader;
use tracing::info;

/// What a delta run reports back besides the stream itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaSummary {
    /// Whole-file digest of the target, folded in during the first hashing
    /// pass. `None` when the target does not exist. Integrity checking of
    /// the reconstruction is delegated to this value.
    pub target_digest: Option<[u8; 16]>,
    /// Number of rounds actually run.
    pub rounds: u32,
    pub source_size: u64,
}

/// One round at the target-derived block size: hash the whole target,
/// then emit copies and literals for the whole source.
pub fn single_round<R1, R2, S>(source: &mut R1, target: &mut R2, sink: &mut S) -> Result<DeltaSummary>
where
    R1: FileReader,
    R2: FileReader,
    S: DeltaSink,
{
    if !source.exists() {
        return Err(DeltaError::SourceMissing {
            file: source.name().to_string(),
        });
    }
    source.open()?;
    let source_size = source.size();

    let mut index = HashIndex::new();
    let target_digest = hash_file(target, &mut index)?;
    let blk = match target_digest {
        Some(_) => block_size(target.size()),
        None => MIN_BLOCK_SIZE,
    };

    let mut holes = HoleSet::single(source_size);
    generate_delta(source, sink, &index, &mut holes, blk, RoundMode::Final)?;
    source.close();

    Ok(DeltaSummary {
        target_digest,
        rounds: 1,
        source_size,
    })
}

/// Multi-round delta: start at the target-derived block size, divide by
/// the round base until the floor, matching coarse first and re-examining
/// only the remaining holes with finer blocks.
///
/// The first round hashes the whole target; later rounds hash it over the
/// remaining hole ranges clamped to the target's size, each region scanned
/// with `round_offset` at its start. Every round gets a fresh index, and
/// only the last round emits literals.
pub fn multiround<R1, R2, S>(source: &mut R1, target: &mut R2, sink: &mut S) -> Result<DeltaSummary>
where
    R1: FileReader,
    R2: FileReader,
    S: DeltaSink,
{
    if !source.exists() {
        return Err(DeltaError::SourceMissing {
            file: source.name().to_string(),
        });
    }
    source.open()?;
    let source_size = source.size();
    let mut holes = HoleSet::single(source_size);

    if !target.exists() {
        // Nothing to match against: one final round over one big hole.
        let index = HashIndex::new();
        generate_delta(
            source,
            sink,
            &index,
            &mut holes,
            MIN_BLOCK_SIZE,
            RoundMode::Final,
        )?;
        source.close();
        return Ok(DeltaSummary {
            target_digest: None,
            rounds: 1,
            source_size,
        });
    }

    target.open()?;
    let target_size = target.size();
    let schedule = round_schedule(target_size);
    let last = schedule.len() - 1;
    let mut target_digest = None;

    for (round, &blk) in schedule.iter().enumerate() {
        let mut index = HashIndex::new();
        if round == 0 {
            let mut ctx = FileDigest::new();
            target.seek(0)?;
            hash_blocks(target, &mut index, target_size, blk, 0, Some(&mut ctx))?;
            target_digest = Some(ctx.finalize());
        } else {
            hash_holes(target, &mut index, &holes, blk)?;
        }

        let mode = if round == last {
            RoundMode::Final
        } else {
            RoundMode::Intermediate
        };
        generate_delta(source, sink, &index, &mut holes, blk, mode)?;

        info!(
            round = round + 1,
            block_len = blk,
            indexed = index.len(),
            unresolved = holes.total_bytes(),
            "delta round complete"
        );
    }

    target.close();
    source.close();

    Ok(DeltaSummary {
        target_digest,
        rounds: schedule.len() as u32,
        source_size,
    })
}
