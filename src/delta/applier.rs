use crate::delta::generator::DeltaSink;
use crate::delta::index::TargetPos;
use crate::error::{DeltaError, Result};
use crate::reader::FileReader;
use std::io::{Seek, SeekFrom, Write};

/// One reconstruction instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaOp {
    /// Take `len` bytes from the target at `pos` and place them at source
    /// offset `s_offset`. `len` is the block length of the round that
    /// produced `pos`, which is what makes the position resolvable.
    Copy {
        pos: TargetPos,
        len: u32,
        s_offset: u64,
    },
    /// Place these bytes at source offset `s_offset` verbatim.
    Data { bytes: Vec<u8>, s_offset: u64 },
}

/// In-memory delta stream: collects ops in emission order and tallies how
/// the source split between matched and transmitted bytes.
#[derive(Debug, Default)]
pub struct DeltaScript {
    pub ops: Vec<DeltaOp>,
    copy_bytes: u64,
    literal_bytes: u64,
}

impl DeltaScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy_bytes(&self) -> u64 {
        self.copy_bytes
    }

    pub fn literal_bytes(&self) -> u64 {
        self.literal_bytes
    }

    /// Fraction of the reconstructed bytes that had to travel as literals.
    pub fn literal_ratio(&self) -> f64 {
        let total = self.copy_bytes + self.literal_bytes;
        if total == 0 {
            return 0.0;
        }
        self.literal_bytes as f64 / total as f64
    }
}

impl DeltaSink for DeltaScript {
    fn copy(&mut self, pos: &TargetPos, len: u32, s_offset: u64) {
        self.copy_bytes += len as u64;
        self.ops.push(DeltaOp::Copy {
            pos: *pos,
            len,
            s_offset,
        });
    }

    fn literal(&mut self, data: &[u8], s_offset: u64) {
        self.literal_bytes += data.len() as u64;
        self.ops.push(DeltaOp::Data {
            bytes: data.to_vec(),
            s_offset,
        });
    }
}

/// Reconstruct the source from the target plus a delta script.
///
/// Ops from intermediate rounds land at scattered offsets, so every write
/// is positioned rather than appended. Returns the number of bytes
/// written.
pub fn apply_delta<R, W>(target: &mut R, script: &DeltaScript, out: &mut W) -> Result<u64>
where
    R: FileReader,
    W: Write + Seek,
{
    let out_err = |source: std::io::Error| DeltaError::Io {
        file: "<delta output>".to_string(),
        source,
    };

    let mut written = 0u64;
    let mut block = Vec::new();
    for op in &script.ops {
        match op {
            DeltaOp::Copy { pos, len, s_offset } => {
                let t_offset = pos.absolute(*len);
                let at = target.seek(t_offset)?;
                if at != t_offset {
                    return Err(DeltaError::Seek {
                        file: target.name().to_string(),
                        expected: t_offset,
                        actual: at,
                    });
                }

                block.resize(*len as usize, 0);
                let mut filled = 0usize;
                while filled < block.len() {
                    let n = target.read(&mut block[filled..])?;
                    if n == 0 {
                        return Err(DeltaError::ShortRead {
                            file: target.name().to_string(),
                            remaining: (block.len() - filled) as u64,
                        });
                    }
                    filled += n;
                }

                out.seek(SeekFrom::Start(*s_offset)).map_err(out_err)?;
                out.write_all(&block).map_err(out_err)?;
                written += *len as u64;
            }
            DeltaOp::Data { bytes, s_offset } => {
                out.seek(SeekFrom::Start(*s_offset)).map_err(out_err)?;
                out.write_all(bytes).map_err(out_err)?;
                written += bytes.len() as u64;
            }
        }
    }
    out.flush().map_err(out_err)?;
    Ok(written)
}
