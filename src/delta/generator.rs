use crate::delta::holes::{Hole, HoleSet};
use crate::delta::index::{HashIndex, TargetPos};
use crate::delta::rolling::Rollsum;
use crate::delta::BUFFER_LEN;
use crate::error::{DeltaError, Result};
use crate::reader::FileReader;
use tracing::debug;

/// Consumer of the delta stream: copy records for block matches, literal
/// records for bytes the target cannot supply.
pub trait DeltaSink {
    /// `len` bytes at source offset `s_offset` match the target block at
    /// `pos` (hashed with block length `len`).
    fn copy(&mut self, pos: &TargetPos, len: u32, s_offset: u64);

    /// These bytes at source offset `s_offset` must travel verbatim.
    fn literal(&mut self, data: &[u8], s_offset: u64);
}

/// What a round does with unmatched bytes.
///
/// Intermediate rounds defer literals (a smaller block size may still match
/// them) and instead shrink the hole set; the final round emits literals
/// for everything left and leaves the holes alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    Intermediate,
    Final,
}

impl RoundMode {
    fn emit_literals(self) -> bool {
        matches!(self, RoundMode::Final)
    }

    fn split_holes(self) -> bool {
        matches!(self, RoundMode::Intermediate)
    }
}

/// Slide a byte-granular window over every hole of the source, emitting
/// copy records where the index recognizes a block and literal records (or
/// hole splits, per `mode`) for the rest.
pub fn generate_delta<R: FileReader, S: DeltaSink>(
    reader: &mut R,
    sink: &mut S,
    index: &HashIndex,
    holes: &mut HoleSet,
    block_len: u32,
    mode: RoundMode,
) -> Result<()> {
    generate_delta_buffered(reader, sink, index, holes, block_len, mode, BUFFER_LEN)
}

fn generate_delta_buffered<R: FileReader, S: DeltaSink>(
    reader: &mut R,
    sink: &mut S,
    index: &HashIndex,
    holes: &mut HoleSet,
    block_len: u32,
    mode: RoundMode,
    buf_cap: usize,
) -> Result<()> {
    let emit = mode.emit_literals();
    let split = mode.split_holes();
    let blk = block_len as usize;
    debug_assert!(buf_cap >= blk);

    let largest = holes.iter().map(|h| h.length).max().unwrap_or(0);
    if largest == 0 {
        return Ok(());
    }
    let cap = largest.max(block_len as u64).min(buf_cap as u64) as usize;
    let mut buf = vec![0u8; cap];

    let hole_list: Vec<Hole> = holes.iter().collect();
    let mut matched: Vec<Hole> = Vec::new();
    let mut copies = 0u64;
    let mut literal_bytes = 0u64;

    for hole in hole_list {
        // A hole shorter than one block produces no windows: its whole
        // content is one literal on the final round, untouched otherwise.
        if hole.length < block_len as u64 {
            if emit {
                seek_to(reader, hole.offset)?;
                let len = hole.length as usize;
                read_exact(reader, &mut buf[..len], hole.length)?;
                sink.literal(&buf[..len], hole.offset);
                literal_bytes += hole.length;
            }
            continue;
        }

        seek_to(reader, hole.offset)?;
        let mut to_read = hole.length;
        let mut s_offset = hole.offset;

        // Three cursors into the staging buffer: sentry marks the start of
        // the pending literal run, rd the candidate window, end the first
        // unread slot.
        let mut sentry = 0usize;
        let mut rd = 0usize;
        let mut end = 0usize;

        let mut sum = Rollsum::new();
        let mut fresh = true;
        let mut outchar = 0u8;

        loop {
            let remain = end - rd;
            if remain < blk {
                if to_read == 0 {
                    let pending = end - sentry;
                    if pending > 0 && emit {
                        sink.literal(&buf[sentry..end], s_offset);
                        literal_bytes += pending as u64;
                    }
                    break;
                }

                // Flush the pending run, then compact the window tail to
                // the front and refill. The rolling state stays valid: the
                // bytes under the window do not change, only their offsets.
                let pending = rd - sentry;
                if pending > 0 {
                    if emit {
                        sink.literal(&buf[sentry..rd], s_offset);
                        literal_bytes += pending as u64;
                    }
                    s_offset += pending as u64;
                }
                if remain > 0 {
                    buf.copy_within(rd..end, 0);
                }
                sentry = 0;
                rd = 0;
                end = remain;

                let want = (cap - remain).min(to_read.min(usize::MAX as u64) as usize);
                let mut need = want;
                while need > 0 {
                    let n = reader.read(&mut buf[end..end + need])?;
                    if n == 0 {
                        return Err(DeltaError::ShortRead {
                            file: reader.name().to_string(),
                            remaining: to_read,
                        });
                    }
                    to_read -= n as u64;
                    end += n;
                    need -= n;
                }
                continue;
            }

            let fast = if fresh {
                sum.seed(&buf[rd..rd + blk]);
                fresh = false;
                sum.digest()
            } else {
                sum.roll(outchar, buf[rd + blk - 1]);
                sum.digest()
            };

            if let Some(record) = index.find_block(fast, &buf[rd..rd + blk]) {
                let pending = rd - sentry;
                if pending > 0 {
                    if emit {
                        sink.literal(&buf[sentry..rd], s_offset);
                        literal_bytes += pending as u64;
                    }
                    s_offset += pending as u64;
                }

                sink.copy(&record.pos, block_len, s_offset);
                copies += 1;
                if split {
                    matched.push(Hole::new(s_offset, block_len as u64));
                }

                rd += blk;
                s_offset += block_len as u64;
                sentry = rd;
                fresh = true;
            } else {
                outchar = buf[rd];
                rd += 1;
            }
        }
    }

    if split {
        for range in &matched {
            holes.split(*range);
        }
    }

    debug!(
        block_len,
        copies,
        literal_bytes,
        holes_left = holes.len(),
        unresolved = holes.total_bytes(),
        "delta round done"
    );
    Ok(())
}

fn seek_to<R: FileReader>(reader: &mut R, offset: u64) -> Result<()> {
    let pos = reader.seek(offset)?;
    if pos != offset {
        return Err(DeltaError::Seek {
            file: reader.name().to_string(),
            expected: offset,
            actual: pos,
        });
    }
    Ok(())
}

fn read_exact<R: FileReader>(reader: &mut R, buf: &mut [u8], region: u64) -> Result<()> {
    let mut filled = 0usize;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(DeltaError::ShortRead {
                file: reader.name().to_string(),
                remaining: region - filled as u64,
            });
        }
        filled += n;
    }
    Ok(())
}
