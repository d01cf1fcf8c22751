use crate::error::Result;
use crate::reader::FileReader;
use md4::{Digest, Md4};

/// Width of the strong digest, fixed by the wire record layout.
pub const DIGEST_BYTES: usize = 16;

/// Strong digest of a byte span.
///
/// MD4, kept for rsync lineage. The pipelines never compare block contents
/// after a digest match; 128 bits of collision resistance is the whole
/// guarantee, so any substitute must keep the 16-byte width.
pub fn strong_digest(data: &[u8]) -> [u8; DIGEST_BYTES] {
    Md4::digest(data).into()
}

/// Streaming digest context for whole-file checksums.
///
/// The hashing pipeline feeds every byte it reads through one of these, so
/// the file-level integrity digest falls out of the same pass that produces
/// the block hashes.
pub struct FileDigest {
    ctx: Md4,
}

impl FileDigest {
    pub fn new() -> Self {
        Self { ctx: Md4::new() }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.ctx.update(data);
    }

    pub fn finalize(self) -> [u8; DIGEST_BYTES] {
        self.ctx.finalize().into()
    }
}

impl Default for FileDigest {
    fn default() -> Self {
        Self::new()
    }
}

/// Digest an entire file through its reader, standalone.
pub fn file_digest<R: FileReader>(reader: &mut R) -> Result<[u8; DIGEST_BYTES]> {
    let mut ctx = FileDigest::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        ctx.update(&buf[..n]);
    }
    Ok(ctx.finalize())
}
