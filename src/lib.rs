//! Multi-round rsync-style binary delta computation.
//!
//! The target side summarizes fixed-size blocks with a (rolling, MD4) hash
//! pair; the source side slides a byte-granular window over its data and
//! emits copy records where the target already has the bytes and literal
//! records where it does not. Multi-round operation repeats the exchange
//! with shrinking block sizes, each round narrowing the set of unresolved
//! *holes* so finer rounds only re-examine what coarser ones missed.
//!
//! ```no_run
//! use xsync::delta::{multiround, apply_delta, DeltaScript};
//! use xsync::reader::{FileReader, LocalFileReader};
//!
//! # fn main() -> xsync::Result<()> {
//! let mut source = LocalFileReader::new("new.bin");
//! let mut target = LocalFileReader::new("old.bin");
//! let mut script = DeltaScript::new();
//! let summary = multiround(&mut source, &mut target, &mut script)?;
//! println!(
//!     "{} rounds, {:.1}% literal",
//!     summary.rounds,
//!     script.literal_ratio() * 100.0
//! );
//!
//! let mut target = LocalFileReader::new("old.bin");
//! target.open()?;
//! let mut out = std::fs::File::create("rebuilt.bin")
//!     .map_err(|source| xsync::DeltaError::Io { file: "rebuilt.bin".into(), source })?;
//! apply_delta(&mut target, &script, &mut out)?;
//! # Ok(())
//! # }
//! ```

pub mod delta;
pub mod error;
pub mod protocol;
pub mod reader;

pub use delta::{
    apply_delta, block_size, generate_delta, hash_file, multiround, single_round, DeltaScript,
    DeltaSink, DeltaSummary, HashIndex, HashSink, Hole, HoleSet, RoundMode, Rollsum, StrongRecord,
    TargetPos,
};
pub use error::{DeltaError, Result};
pub use reader::{FileReader, LocalFileReader, MemoryReader};
