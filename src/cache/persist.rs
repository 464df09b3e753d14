//! Atomic file publication for cached and exported audio.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Outcome of an atomic write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    /// Our bytes are now at the target path.
    Written,
    /// Another writer published the target first; it was left untouched.
    AlreadyPresent,
}

/// Write `bytes` to `path` through a temporary file in the same directory.
///
/// Readers never observe a partially written file. With `replace` unset the
/// final step refuses to overwrite, so concurrent writers of the same key
/// settle on whichever file landed first.
pub fn write_atomic(path: &Path, bytes: &[u8], replace: bool) -> io::Result<Persisted> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;

    if replace {
        temp.persist(path).map_err(|e| e.error)?;
        return Ok(Persisted::Written);
    }

    match temp.persist_noclobber(path) {
        Ok(_) => Ok(Persisted::Written),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(Persisted::AlreadyPresent),
        Err(e) => Err(e.error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("male/words/word_001.wav");

        assert_eq!(write_atomic(&path, b"abc", false).unwrap(), Persisted::Written);
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn noclobber_keeps_first_writer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("word_001.wav");

        write_atomic(&path, b"first", false).unwrap();
        let second = write_atomic(&path, b"second", false).unwrap();

        assert_eq!(second, Persisted::AlreadyPresent);
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }

    #[test]
    fn replace_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output_batch_1.wav");

        write_atomic(&path, b"old", false).unwrap();
        write_atomic(&path, b"new", true).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn leaves_no_temporary_files_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("word_002.wav");
        write_atomic(&path, b"x", false).unwrap();
        write_atomic(&path, b"y", false).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
