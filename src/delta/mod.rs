pub mod applier;
pub mod generator;
pub mod hasher;
pub mod holes;
pub mod index;
pub mod multiround;
pub mod rolling;
pub mod strong;

pub use applier::{apply_delta, DeltaOp, DeltaScript};
pub use generator::{generate_delta, DeltaSink, RoundMode};
pub use hasher::{hash_blocks, hash_file, hash_holes, HashSink};
pub use holes::{Hole, HoleSet};
pub use index::{HashIndex, StrongRecord, TargetPos};
pub use multiround::{multiround, single_round, DeltaSummary};
pub use rolling::Rollsum;
pub use strong::{file_digest, strong_digest, FileDigest, DIGEST_BYTES};

/// Smallest block length used in any round.
pub const MIN_BLOCK_SIZE: u32 = 400;

/// Largest block length the sizing policy will pick.
pub const MAX_BLOCK_SIZE: u32 = 1 << 20;

/// Each successive multi-round divides the block length by this.
pub const MULTIROUND_BASE: u32 = 3;

/// Staging buffer capacity for the pipelines. 32-bit builds historically
/// shipped the larger buffer; keep the split so both behave as deployed.
#[cfg(target_pointer_width = "32")]
pub const BUFFER_LEN: usize = 1 << 25;
#[cfg(not(target_pointer_width = "32"))]
pub const BUFFER_LEN: usize = 1 << 23;

/// Block length for a file of `file_size` bytes.
///
/// The rsync square-root policy: roughly sqrt(size) rounded to a multiple
/// of 8, floored at [`MIN_BLOCK_SIZE`] and capped at [`MAX_BLOCK_SIZE`].
pub fn block_size(file_size: u64) -> u32 {
    let min = MIN_BLOCK_SIZE as u64;
    if file_size <= min * min {
        return MIN_BLOCK_SIZE;
    }

    // Largest power of two c with c*c <= file_size: shift the size right
    // two bits for every doubling of c.
    let mut c: u64 = 1;
    let mut l = file_size;
    loop {
        l >>= 2;
        if l == 0 {
            break;
        }
        c <<= 1;
    }

    if c >= MAX_BLOCK_SIZE as u64 {
        return MAX_BLOCK_SIZE;
    }

    // Greedily set bits from c downward, dropping any bit that pushes the
    // square past the file size. Stopping at bit 8 rounds the result to a
    // multiple of 8.
    let mut blength: u64 = 0;
    while c >= 8 {
        blength |= c;
        if file_size < blength * blength {
            blength &= !c;
        }
        c >>= 1;
    }
    blength.max(min) as u32
}

/// Block lengths for each round of multi-round operation, largest first.
///
/// Starts at [`block_size`] of the file and divides by [`MULTIROUND_BASE`]
/// until the next step would drop below [`MIN_BLOCK_SIZE`]. The last entry
/// is the final round's block length; a small file gets a single round.
pub fn round_schedule(file_size: u64) -> Vec<u32> {
    let mut blk = block_size(file_size);
    let mut schedule = vec![blk];
    loop {
        let next = blk / MULTIROUND_BASE;
        if next < MIN_BLOCK_SIZE {
            break;
        }
        schedule.push(next);
        blk = next;
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_files_get_min_block() {
        assert_eq!(block_size(0), MIN_BLOCK_SIZE);
        assert_eq!(block_size(1), MIN_BLOCK_SIZE);
        assert_eq!(block_size(400 * 400), MIN_BLOCK_SIZE);
    }

    #[test]
    fn test_huge_files_clamp_to_max() {
        assert_eq!(block_size(1 << 40), MAX_BLOCK_SIZE);
        assert_eq!(block_size(u64::MAX), MAX_BLOCK_SIZE);
    }

    #[test]
    fn test_block_size_is_multiple_of_8_within_bounds() {
        for size in [1_000_000u64, 1_000_000_000, 1_000_000_000_000] {
            let blk = block_size(size);
            assert_eq!(blk % 8, 0, "block size {} for {} not 8-aligned", blk, size);
            assert!((MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&blk));
            // Roughly sqrt: the square must not exceed the file size.
            assert!((blk as u64) * (blk as u64) <= size);
        }
    }

    #[test]
    fn test_block_size_exact_square() {
        // sqrt(10^6) = 1000, already a multiple of 8.
        assert_eq!(block_size(1_000_000), 1000);
    }

    #[test]
    fn test_round_schedule_divides_by_base() {
        let schedule = round_schedule(13_000_000); // block_size ≈ 3600
        assert!(schedule.len() > 1);
        for pair in schedule.windows(2) {
            assert_eq!(pair[1], pair[0] / MULTIROUND_BASE);
            assert!(pair[1] >= MIN_BLOCK_SIZE);
        }
    }

    #[test]
    fn test_round_schedule_small_file_single_round() {
        assert_eq!(round_schedule(1000), vec![MIN_BLOCK_SIZE]);
        // 1000 / 3 = 333 < 400, so one round even above the floor.
        assert_eq!(round_schedule(1_000_000), vec![1000]);
    }
}
