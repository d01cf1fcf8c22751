use crate::error::{DeltaError, Result};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Read-side collaborator of the hashing and delta pipelines.
///
/// Both pipelines drive files exclusively through this trait, so they can
/// run against local files, in-memory buffers, or anything else that can
/// report a size and serve positioned reads.
pub trait FileReader {
    /// Whether the underlying file exists at all. A missing target is not
    /// an error to the hashing pipeline; it just produces no blocks.
    fn exists(&self) -> bool;

    /// Open the file for reading. Must be called before `size`, `read` or
    /// `seek`.
    fn open(&mut self) -> Result<()>;

    fn close(&mut self);

    /// Total size in bytes. Only valid after a successful `open`.
    fn size(&self) -> u64;

    /// Display name used in error messages and logs.
    fn name(&self) -> &str;

    /// Read up to `buf.len()` bytes. `Ok(0)` means end of input; the
    /// pipelines treat that as fatal while bytes are still outstanding.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Seek to an absolute offset, returning the resulting position.
    fn seek(&mut self, offset: u64) -> Result<u64>;
}

/// Local filesystem implementation backed by `std::fs::File`.
pub struct LocalFileReader {
    path: PathBuf,
    name: String,
    file: Option<File>,
    size: u64,
}

impl LocalFileReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self {
            path,
            name,
            file: None,
            size: 0,
        }
    }

    fn io_err(&self, source: std::io::Error) -> DeltaError {
        DeltaError::Io {
            file: self.name.clone(),
            source,
        }
    }
}

impl FileReader for LocalFileReader {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn open(&mut self) -> Result<()> {
        let file = File::open(&self.path).map_err(|source| DeltaError::Open {
            file: self.name.clone(),
            source,
        })?;
        self.size = file
            .metadata()
            .map_err(|source| DeltaError::Io {
                file: self.name.clone(),
                source,
            })?
            .len();
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) {
        self.file = None;
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.read(buf).map_err(|e| DeltaError::Io {
                file: self.name.clone(),
                source: e,
            }),
            None => Err(self.io_err(std::io::Error::other("file not open"))),
        }
    }

    fn seek(&mut self, offset: u64) -> Result<u64> {
        match self.file.as_mut() {
            Some(file) => file
                .seek(SeekFrom::Start(offset))
                .map_err(|e| DeltaError::Io {
                    file: self.name.clone(),
                    source: e,
                }),
            None => Err(self.io_err(std::io::Error::other("file not open"))),
        }
    }
}

/// In-memory implementation used by tests and callers that already hold the
/// data.
pub struct MemoryReader {
    name: String,
    cursor: Cursor<Vec<u8>>,
    present: bool,
}

impl MemoryReader {
    pub fn new<S: Into<String>>(name: S, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            cursor: Cursor::new(data),
            present: true,
        }
    }

    /// A reader standing in for a file that does not exist.
    pub fn missing<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cursor: Cursor::new(Vec::new()),
            present: false,
        }
    }
}

impl FileReader for MemoryReader {
    fn exists(&self) -> bool {
        self.present
    }

    fn open(&mut self) -> Result<()> {
        if !self.present {
            return Err(DeltaError::Open {
                file: self.name.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        self.cursor.set_position(0);
        Ok(())
    }

    fn close(&mut self) {}

    fn size(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.cursor.read(buf).map_err(|e| DeltaError::Io {
            file: self.name.clone(),
            source: e,
        })
    }

    fn seek(&mut self, offset: u64) -> Result<u64> {
        self.cursor
            .seek(SeekFrom::Start(offset))
            .map_err(|e| DeltaError::Io {
                file: self.name.clone(),
                source: e,
            })
    }
}
