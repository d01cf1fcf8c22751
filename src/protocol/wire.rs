//! Wire codec for strong-hash records.
//!
//! A record travels as `u32 index ‖ u64 round_offset ‖ [u8; 16] digest`,
//! 28 bytes fixed, little-endian. The hashing side always sends the fast
//! hash with it, so the unit of exchange is the 32-byte entry
//! `u32 fast ‖ record`; the receiving side feeds decoded entries straight
//! into its index.

use crate::delta::index::{StrongRecord, TargetPos};
use crate::delta::strong::DIGEST_BYTES;
use crate::protocol::WireError;
use bytes::{Buf, BufMut};

/// Encoded size of a bare strong-hash record.
pub const RECORD_LEN: usize = 28;

/// Encoded size of a (fast hash, record) entry.
pub const ENTRY_LEN: usize = RECORD_LEN + 4;

pub fn put_record<B: BufMut>(record: &StrongRecord, buf: &mut B) {
    buf.put_u32_le(record.pos.index);
    buf.put_u64_le(record.pos.round_offset);
    buf.put_slice(&record.digest);
}

pub fn get_record<B: Buf>(buf: &mut B) -> Result<StrongRecord, WireError> {
    if buf.remaining() < RECORD_LEN {
        return Err(WireError::Truncated {
            needed: RECORD_LEN,
            available: buf.remaining(),
        });
    }
    let index = buf.get_u32_le();
    let round_offset = buf.get_u64_le();
    let mut digest = [0u8; DIGEST_BYTES];
    buf.copy_to_slice(&mut digest);
    Ok(StrongRecord {
        digest,
        pos: TargetPos {
            round_offset,
            index,
        },
    })
}

pub fn put_entry<B: BufMut>(fast: u32, record: &StrongRecord, buf: &mut B) {
    buf.put_u32_le(fast);
    put_record(record, buf);
}

pub fn get_entry<B: Buf>(buf: &mut B) -> Result<(u32, StrongRecord), WireError> {
    if buf.remaining() < ENTRY_LEN {
        return Err(WireError::Truncated {
            needed: ENTRY_LEN,
            available: buf.remaining(),
        });
    }
    let fast = buf.get_u32_le();
    let record = get_record(buf)?;
    Ok((fast, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::index::HashIndex;
    use crate::delta::rolling::Rollsum;
    use crate::delta::strong::strong_digest;
    use bytes::BytesMut;

    fn sample_record() -> StrongRecord {
        StrongRecord {
            digest: strong_digest(b"a block"),
            pos: TargetPos {
                round_offset: 0x1122_3344_5566,
                index: 9,
            },
        }
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample_record();
        let mut buf = BytesMut::new();
        put_record(&record, &mut buf);
        assert_eq!(buf.len(), RECORD_LEN);

        let decoded = get_record(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.digest, record.digest);
        assert_eq!(decoded.pos, record.pos);
    }

    #[test]
    fn test_record_layout() {
        let record = StrongRecord {
            digest: [0xAA; 16],
            pos: TargetPos {
                round_offset: 0x0102,
                index: 0x0304,
            },
        };
        let mut buf = BytesMut::new();
        put_record(&record, &mut buf);
        assert_eq!(&buf[..4], &[0x04, 0x03, 0x00, 0x00]);
        assert_eq!(&buf[4..12], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&buf[12..], &[0xAA; 16]);
    }

    #[test]
    fn test_entry_stream_rebuilds_index() {
        // Sender-side tuples framed, then decoded into a fresh index that
        // answers lookups like the original.
        let blocks: [&[u8]; 3] = [b"block one!", b"block two.", b"block iii-"];
        let mut buf = BytesMut::new();
        for (i, block) in blocks.iter().enumerate() {
            let record = StrongRecord {
                digest: strong_digest(block),
                pos: TargetPos {
                    round_offset: 0,
                    index: i as u32,
                },
            };
            put_entry(Rollsum::hash(block), &record, &mut buf);
        }
        assert_eq!(buf.len(), 3 * ENTRY_LEN);

        let mut index = HashIndex::new();
        let mut frame = buf.freeze();
        while frame.remaining() > 0 {
            let (fast, record) = get_entry(&mut frame).unwrap();
            index.insert(fast, record);
        }

        assert_eq!(index.len(), 3);
        let hit = index
            .find_block(Rollsum::hash(blocks[1]), blocks[1])
            .unwrap();
        assert_eq!(hit.pos.index, 1);
    }

    #[test]
    fn test_truncated_record() {
        let mut short = &[0u8; 27][..];
        assert!(matches!(
            get_record(&mut short),
            Err(WireError::Truncated { needed: 28, .. })
        ));
    }

    #[test]
    fn test_truncated_entry() {
        let mut short = &[0u8; 31][..];
        assert!(matches!(
            get_entry(&mut short),
            Err(WireError::Truncated { needed: 32, .. })
        ));
    }
}
