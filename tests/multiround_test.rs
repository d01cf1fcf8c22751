// Multi-round operation: coarse rounds shrink the hole set, the final
// round sweeps up what is left, and the combined stream reconstructs the
// source exactly.

use std::fs;
use std::io::Cursor;
use tempfile::TempDir;
use xsync::delta::{generate_delta, hash_blocks, hash_holes};
use xsync::{
    apply_delta, multiround, DeltaScript, FileReader, HashIndex, HoleSet, LocalFileReader,
    MemoryReader, RoundMode,
};

fn random_bytes(mut seed: u32, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        out.extend_from_slice(&seed.to_le_bytes());
    }
    out.truncate(len);
    out
}

#[test]
fn test_manual_rounds_shrink_holes() {
    // Drive three rounds by hand at 3600/1200/400 so every intermediate
    // state is observable. Ten scattered flips; each coarse round must
    // strictly shrink the unresolved byte count.
    let size = 100_000usize;
    let target = random_bytes(0xA5A5, size);
    let mut source = target.clone();
    for site in 0..10 {
        source[site * 9_973 + 100] ^= 0xFF;
    }

    let schedule = [3600u32, 1200, 400];
    let mut holes = HoleSet::single(size as u64);
    let mut script = DeltaScript::new();
    let mut unresolved = vec![holes.total_bytes()];

    for (round, &blk) in schedule.iter().enumerate() {
        let mut tgt = MemoryReader::new("target", target.clone());
        tgt.open().unwrap();
        let mut index = HashIndex::new();
        if round == 0 {
            hash_blocks(&mut tgt, &mut index, size as u64, blk, 0, None).unwrap();
        } else {
            hash_holes(&mut tgt, &mut index, &holes, blk).unwrap();
        }

        let mode = if round == schedule.len() - 1 {
            RoundMode::Final
        } else {
            RoundMode::Intermediate
        };
        let mut src = MemoryReader::new("source", source.clone());
        src.open().unwrap();
        generate_delta(&mut src, &mut script, &index, &mut holes, blk, mode).unwrap();
        unresolved.push(holes.total_bytes());
    }

    // Holes shrink through the intermediate rounds; the final round does
    // not touch them.
    assert!(unresolved[1] < unresolved[0]);
    assert!(unresolved[2] < unresolved[1]);
    assert_eq!(unresolved[3], unresolved[2]);

    // Everything still unresolved at final-round entry either matched at
    // block 400 or went out as literal, never more than the holes held.
    assert!(script.literal_bytes() <= unresolved[2]);
    assert!(script.literal_bytes() >= 10);

    let mut tgt = MemoryReader::new("target", target);
    tgt.open().unwrap();
    let mut out = Cursor::new(Vec::new());
    apply_delta(&mut tgt, &script, &mut out).unwrap();
    assert_eq!(out.into_inner(), source);
}

#[test]
fn test_multiround_driver_roundtrip() {
    // 2 MB target gives a two-round schedule (1408, 469). One byte flipped
    // every 50 KB, roughly 0.002% of the file; the literal volume must
    // stay in the same ballpark as the damage, not the file size.
    let size = 2_000_000usize;
    let target = random_bytes(0x5EED, size);
    let mut source = target.clone();
    let mut sites = 0u64;
    let mut at = 13usize;
    while at < size {
        source[at] ^= 0x80;
        sites += 1;
        at += 50_000;
    }

    let dir = TempDir::new().unwrap();
    let source_path = dir.path().join("source.bin");
    let target_path = dir.path().join("target.bin");
    fs::write(&source_path, &source).unwrap();
    fs::write(&target_path, &target).unwrap();

    let mut src = LocalFileReader::new(&source_path);
    let mut tgt = LocalFileReader::new(&target_path);
    let mut script = DeltaScript::new();
    let summary = multiround(&mut src, &mut tgt, &mut script).unwrap();

    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.source_size, size as u64);
    assert!(summary.target_digest.is_some());

    assert!(script.literal_bytes() >= sites);
    // Each damaged site can poison at most a couple of coarse blocks.
    assert!(script.literal_bytes() <= sites * 3 * 1408);

    let mut tgt = LocalFileReader::new(&target_path);
    tgt.open().unwrap();
    let mut out = Cursor::new(Vec::new());
    apply_delta(&mut tgt, &script, &mut out).unwrap();
    assert_eq!(out.into_inner(), source);
}

#[test]
fn test_multiround_identical_files_no_literals_before_tail() {
    // Identical 2 MB files: everything matches in round one except the
    // sub-block tail, which the finer round also cannot match (1408 and
    // 469 leave different remainders) unless it fits a 469 window.
    let size = 2_000_000usize;
    let data = random_bytes(0xF00D, size);

    let mut src = MemoryReader::new("source", data.clone());
    let mut tgt = MemoryReader::new("target", data.clone());
    let mut script = DeltaScript::new();
    let summary = multiround(&mut src, &mut tgt, &mut script).unwrap();

    assert_eq!(summary.rounds, 2);
    // 2_000_000 = 1420 * 1408 + 640: round one leaves a 640-byte tail
    // hole, round two matches one 469 window of it against the target's
    // own bytes there, leaving 171 literal bytes.
    assert!(script.literal_bytes() < 1408);

    let mut tgt = MemoryReader::new("target", data.clone());
    tgt.open().unwrap();
    let mut out = Cursor::new(Vec::new());
    apply_delta(&mut tgt, &script, &mut out).unwrap();
    assert_eq!(out.into_inner(), data);
}

#[test]
fn test_multiround_grown_source() {
    // Source grew by an appended tail; the tail travels as literals, the
    // body as copies.
    let size = 2_000_000usize;
    let target = random_bytes(0xCAFE, size);
    let mut source = target.clone();
    source.extend_from_slice(&random_bytes(0xD00D, 30_000));

    let mut src = MemoryReader::new("source", source.clone());
    let mut tgt = MemoryReader::new("target", target.clone());
    let mut script = DeltaScript::new();
    multiround(&mut src, &mut tgt, &mut script).unwrap();

    assert!(script.literal_bytes() >= 30_000);
    assert!(script.literal_bytes() < 40_000);

    let mut tgt = MemoryReader::new("target", target);
    tgt.open().unwrap();
    let mut out = Cursor::new(Vec::new());
    apply_delta(&mut tgt, &script, &mut out).unwrap();
    assert_eq!(out.into_inner(), source);
}
