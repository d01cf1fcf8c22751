use crate::delta::holes::HoleSet;
use crate::delta::index::{HashIndex, StrongRecord, TargetPos};
use crate::delta::rolling::Rollsum;
use crate::delta::strong::{strong_digest, FileDigest};
use crate::delta::{block_size, BUFFER_LEN};
use crate::error::{DeltaError, Result};
use crate::reader::FileReader;
use tracing::debug;

/// Consumer of (fast hash, strong record) tuples from the hashing pipeline.
/// A local index implements this by inserting; a wire writer would frame
/// the tuples instead.
pub trait HashSink {
    fn add_block(&mut self, fast: u32, record: StrongRecord);
}

impl HashSink for HashIndex {
    fn add_block(&mut self, fast: u32, record: StrongRecord) {
        self.insert(fast, record);
    }
}

/// Stream `to_read` bytes through fixed-size blocks, emitting one tuple per
/// complete `block_len` window at `index = 0, 1, 2, …`.
///
/// The trailing partial block yields no tuple; the last sub-block tail of a
/// file is therefore never matchable and will surface as a literal on the
/// source side. Every byte actually read, partial tail included, feeds the
/// optional whole-file digest.
pub fn hash_blocks<R: FileReader, S: HashSink>(
    reader: &mut R,
    sink: &mut S,
    to_read: u64,
    block_len: u32,
    round_offset: u64,
    file_digest: Option<&mut FileDigest>,
) -> Result<()> {
    hash_blocks_buffered(
        reader,
        sink,
        to_read,
        block_len,
        round_offset,
        file_digest,
        BUFFER_LEN,
    )
}

fn hash_blocks_buffered<R: FileReader, S: HashSink>(
    reader: &mut R,
    sink: &mut S,
    to_read: u64,
    block_len: u32,
    round_offset: u64,
    mut file_digest: Option<&mut FileDigest>,
    buf_cap: usize,
) -> Result<()> {
    if to_read == 0 {
        return Ok(());
    }

    let blk = block_len as usize;
    let cap = if to_read < buf_cap as u64 {
        to_read as usize
    } else {
        buf_cap
    };
    debug_assert!(cap >= blk || to_read < block_len as u64);

    let mut buf = vec![0u8; cap];
    let mut remaining = to_read;
    let mut carry = 0usize; // bytes held over from the previous fill
    let mut index: u32 = 0;

    while remaining > 0 {
        // Fill the staging buffer. The region length bounds what is left to
        // read, so a zero-byte read here means the file shrank under us.
        let want = (cap - carry).min(remaining.min(usize::MAX as u64) as usize);
        let mut end = carry;
        let mut need = want;
        while need > 0 {
            let n = reader.read(&mut buf[end..end + need])?;
            if n == 0 {
                return Err(DeltaError::ShortRead {
                    file: reader.name().to_string(),
                    remaining,
                });
            }
            if let Some(ctx) = file_digest.as_deref_mut() {
                ctx.update(&buf[end..end + n]);
            }
            remaining -= n as u64;
            end += n;
            need -= n;
        }

        // Consume as many complete blocks as this fill holds.
        let mut rd = 0usize;
        while end - rd >= blk {
            let window = &buf[rd..rd + blk];
            sink.add_block(
                Rollsum::hash(window),
                StrongRecord {
                    digest: strong_digest(window),
                    pos: TargetPos {
                        round_offset,
                        index,
                    },
                },
            );
            index += 1;
            rd += blk;
        }

        carry = end - rd;
        if carry > 0 {
            buf.copy_within(rd..end, 0);
        }
    }

    debug!(
        round_offset,
        block_len,
        blocks = index,
        tail = carry,
        "hashed region"
    );
    Ok(())
}

/// Hash an entire target file, the first-round entry point.
///
/// A missing file is not an error: it produces no tuples and `None`, and
/// the source side will see everything as one big hole. An existing file
/// is hashed at [`block_size`] of its length with `round_offset = 0`, and
/// the whole-file digest folded in during the same pass is returned.
pub fn hash_file<R: FileReader, S: HashSink>(
    reader: &mut R,
    sink: &mut S,
) -> Result<Option<[u8; 16]>> {
    if !reader.exists() {
        debug!("target missing, nothing to hash");
        return Ok(None);
    }

    reader.open()?;
    let size = reader.size();
    let blk = block_size(size);
    let mut ctx = FileDigest::new();
    hash_blocks(reader, sink, size, blk, 0, Some(&mut ctx))?;
    reader.close();
    Ok(Some(ctx.finalize()))
}

/// Hash the target over each hole region, the entry point for rounds after
/// the first. Each hole is clamped to the target's size and scanned with
/// `round_offset` at the hole start and a per-hole index from zero.
pub fn hash_holes<R: FileReader, S: HashSink>(
    reader: &mut R,
    sink: &mut S,
    holes: &HoleSet,
    block_len: u32,
) -> Result<()> {
    let size = reader.size();
    for hole in holes.iter() {
        if hole.offset >= size {
            // Holes are sorted; nothing further maps into the target.
            break;
        }
        let len = hole.length.min(size - hole.offset);
        if len < block_len as u64 {
            // No complete window fits, so the region cannot contribute.
            continue;
        }
        let pos = reader.seek(hole.offset)?;
        if pos != hole.offset {
            return Err(DeltaError::Seek {
                file: reader.name().to_string(),
                expected: hole.offset,
                actual: pos,
            });
        }
        hash_blocks(reader, sink, len, block_len, hole.offset, None)?;
    }
    Ok(())
}
