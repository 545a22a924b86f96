//! Crash-safe file replacement
//!
//! Content goes to `<file>.tmp`, is synced, then renamed over the target, so
//! readers see either the previous file or the complete new one.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Replace `path` with whatever `write_fn` produces
pub fn write_atomic<P, F>(path: P, write_fn: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<&File>) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(&temp_path)?;
    {
        let mut writer = BufWriter::new(&file);
        write_fn(&mut writer)?;
        writer.flush()?;
    }
    file.sync_all()?;

    fs::rename(&temp_path, path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.jsonl");
        fs::write(&path, "old\n").unwrap();

        write_atomic(&path, |w| {
            writeln!(w, "line 1")?;
            writeln!(w, "line 2")
        })
        .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line 1\nline 2\n");
        assert!(!temp_dir.path().join("data.jsonl.tmp").exists());
    }

    #[test]
    fn test_write_atomic_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("deeper").join("data.jsonl");

        write_atomic(&path, |w| w.write_all(b"x")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn test_failed_writer_keeps_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.jsonl");
        fs::write(&path, "kept").unwrap();

        let result = write_atomic(&path, |_| Err(io::Error::new(io::ErrorKind::Other, "boom")));

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
    }
}
