//! Scratch directories and in-memory streams shared by the server unit tests

use std::io::{Cursor, Error as IoError, ErrorKind, Read, Result as IoResult, Write};
use std::path::{Path, PathBuf};

/// A scratch directory under the system temp dir, removed on drop
pub struct ScratchDir(PathBuf);

impl ScratchDir {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "flatfile-server-{name}-{0}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("Creating a scratch dir should succeed");
        Self(dir)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Reads come from `input`, writes land in `output`.
///
/// With a write limit set, writes are accepted until `output` holds that many
/// bytes and fail with `BrokenPipe` after that, like a peer hanging up.
pub struct Duplex {
    input: Cursor<Vec<u8>>,
    pub output: Vec<u8>,
    write_limit: Option<usize>,
}

impl Duplex {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: Cursor::new(input.to_vec()),
            output: Vec::new(),
            write_limit: None,
        }
    }

    pub fn with_write_limit(input: &[u8], limit: usize) -> Self {
        Self {
            write_limit: Some(limit),
            ..Self::new(input)
        }
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }
}

impl Read for Duplex {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.input.read(buf)
    }
}

impl Write for Duplex {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        let accepted = match self.write_limit {
            Some(limit) => buf.len().min(limit.saturating_sub(self.output.len())),
            None => buf.len(),
        };
        if accepted == 0 && !buf.is_empty() {
            return Err(IoError::new(ErrorKind::BrokenPipe, "peer hung up"));
        }

        self.output.extend_from_slice(&buf[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
