//! File access for parsers, catalogs and the ID cache
//!
//! Everything in this crate that touches the filesystem goes through
//! [`FileSource`], so the resolver can be driven entirely from memory.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Source of readable and writable files
pub trait FileSource {
    /// Open a file for buffered, line-by-line reading
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>>;

    /// Replace the whole contents of a file, creating it if needed
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Whether new files can be written into `dir`
    fn is_writable_dir(&self, dir: &Path) -> bool;

    /// Read a whole file into a string
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let mut content = String::new();
        self.open(path)?.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Read a file as an ordered list of lines, without line terminators.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD, so one badly
    /// encoded line never costs the rest of the file.
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut reader = self.open(path)?;
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        Ok(lines)
    }
}

impl<T: FileSource + ?Sized> FileSource for &T {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        (**self).open(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        (**self).write(path, contents)
    }

    fn is_writable_dir(&self, dir: &Path) -> bool {
        (**self).is_writable_dir(dir)
    }
}

/// The local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileSource for LocalFiles {
    fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn is_writable_dir(&self, dir: &Path) -> bool {
        fs::metadata(dir)
            .map(|meta| meta.is_dir() && !meta.permissions().readonly())
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::FileSource;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::io::{self, BufRead, Cursor};
    use std::path::{Path, PathBuf};

    /// In-memory files that remember every open
    #[derive(Debug, Default)]
    pub struct MemoryFiles {
        files: RefCell<HashMap<PathBuf, Vec<u8>>>,
        opened: RefCell<Vec<PathBuf>>,
        read_only: Cell<bool>,
    }

    impl MemoryFiles {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
            self.with_bytes(path, contents.as_bytes())
        }

        pub fn with_bytes(self, path: impl Into<PathBuf>, contents: &[u8]) -> Self {
            self.files.borrow_mut().insert(path.into(), contents.to_vec());
            self
        }

        pub fn set_read_only(&self, read_only: bool) {
            self.read_only.set(read_only);
        }

        /// Number of times `path` was opened for reading
        pub fn open_count(&self, path: impl AsRef<Path>) -> usize {
            self.opened
                .borrow()
                .iter()
                .filter(|p| p.as_path() == path.as_ref())
                .count()
        }

        pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
            self.files
                .borrow()
                .get(path.as_ref())
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        }
    }

    impl FileSource for MemoryFiles {
        fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
            self.opened.borrow_mut().push(path.to_path_buf());
            match self.files.borrow().get(path) {
                Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
                None => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                )),
            }
        }

        fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            if self.read_only.get() {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "read-only file source",
                ));
            }
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }

        fn is_writable_dir(&self, _dir: &Path) -> bool {
            !self.read_only.get()
        }
    }
}
