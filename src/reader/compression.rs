//! Transparent Snappy-framed decompression for `.snappy`-suffixed traces.
//!
//! The source library's compressed-trace support (zstd, gated behind a
//! build flag) only ever feeds a fully materialized decompressed stream to
//! the same binary/text backends used for uncompressed traces. This crate's
//! rendition does the same with `snap`'s framing format: decompress once,
//! up front, into a scratch file next to the system temp directory, then
//! open that file exactly as if it had been the trace all along. `reset()`
//! on a compressed source is therefore just reopening the already-expanded
//! scratch file — "re-initializing the decoder" without re-running it.
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, SimError};

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn is_compressed(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("snappy")
}

/// A scratch file holding the fully decompressed contents of a `.snappy`
/// trace, deleted when dropped.
pub struct ScratchFile {
    pub path: PathBuf,
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Decompresses `path` (a Snappy-framed file) into a new scratch file and
/// returns a handle to it. The caller opens the scratch file's path with
/// whichever binary or text backend the trace's underlying format needs.
pub fn decompress(path: &Path) -> Result<ScratchFile> {
    let input = File::open(path).map_err(|source| SimError::IoOpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = snap::read::FrameDecoder::new(input);

    let stamp = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("trace");
    let scratch_path = std::env::temp_dir().join(format!(
        "cachesim-{}-{stamp}-{file_name}",
        std::process::id()
    ));

    let mut out = File::create(&scratch_path).map_err(|source| SimError::IoOpenFailed {
        path: scratch_path.clone(),
        source,
    })?;
    copy_decoded(&mut decoder, &mut out).map_err(|source| SimError::MmapFailed {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(ScratchFile { path: scratch_path })
}

fn copy_decoded<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<()> {
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn detects_snappy_suffix() {
        assert!(is_compressed(Path::new("trace.oracleGeneral.snappy")));
        assert!(!is_compressed(Path::new("trace.oracleGeneral")));
    }

    #[test]
    fn round_trips_through_decompress() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("t.csv.snappy");
        let payload = b"1,100,10\n2,200,20\n";
        let mut encoded = Vec::new();
        {
            let mut encoder = snap::write::FrameEncoder::new(&mut encoded);
            encoder.write_all(payload).unwrap();
            encoder.flush().unwrap();
        }
        std::fs::write(&raw_path, &encoded).unwrap();

        let scratch = decompress(&raw_path).unwrap();
        let contents = std::fs::read(&scratch.path).unwrap();
        assert_eq!(contents, payload);
    }
}
