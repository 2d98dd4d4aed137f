//! Save folder <-> zip blob conversion

use crate::error::{SyncError, SyncResult};

use std::fs;
use std::io::{self, Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Pack every regular file under `src` into a zip, keyed by its path relative to `src`.
/// Directory entries are not stored; they are implied by the file paths.
pub fn pack(src: &Path) -> SyncResult<Vec<u8>> {
    if !src.is_dir() {
        return Err(SyncError::io("pack", src, io::ErrorKind::NotFound.into()));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let walk_path = walkdir::WalkDir::new(src).min_depth(1).follow_links(false);

    for entry in walk_path {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| {
                SyncError::io("relativize", entry.path(), io::ErrorKind::InvalidInput.into())
            })?;
        let name = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let data = fs::read(entry.path()).map_err(|e| SyncError::io("read", entry.path(), e))?;
        writer.start_file(name, options)?;
        writer
            .write_all(&data)
            .map_err(|e| SyncError::io("compress", entry.path(), e))?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Unpack a zip blob into `dest`, creating it if needed. Existing files at the
/// same paths are overwritten; anything else already in `dest` is left alone.
pub fn unpack(data: &[u8], dest: &Path) -> SyncResult<()> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| SyncError::CorruptArchive(e.to_string()))?;

    fs::create_dir_all(dest).map_err(|e| SyncError::io("create", dest, e))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(path) => dest.join(path),
            None => {
                tracing::warn!(entry = file.name(), "skipping archive entry outside destination");
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| SyncError::io("create", &outpath, e))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::io("create", parent, e))?;
        }
        let mut outfile =
            fs::File::create(&outpath).map_err(|e| SyncError::io("write", &outpath, e))?;
        io::copy(&mut file, &mut outfile).map_err(|e| match e.kind() {
            // Decompression failures surface as InvalidData from the reader side
            io::ErrorKind::InvalidData => SyncError::CorruptArchive(e.to_string()),
            _ => SyncError::io("write", &outpath, e),
        })?;
    }

    Ok(())
}

/// Folder name for an archive file name ("abc__HonourMode.zip" -> "abc__HonourMode")
pub fn strip_archive_extension(file_name: &str) -> &str {
    file_name.strip_suffix(ARCHIVE_EXTENSION).unwrap_or(file_name)
}

/// Archive file name for a folder name
pub fn archive_name(folder_name: &str) -> String {
    format!("{}{}", folder_name, ARCHIVE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn write(root: &Path, rel: &str, data: &[u8]) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, data).unwrap();
    }

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    #[test]
    fn pack_then_unpack_reproduces_tree() {
        let src = tempfile::tempdir().unwrap();
        let folder = src.path().join("0f3a__HonourMode");
        write(&folder, "HonourMode.lsv", b"save body");
        write(&folder, "HonourMode.webp", &[0u8, 1, 2, 3, 255]);
        write(&folder, "meta/nested/info.json", b"{}");
        write(&folder, "empty.bin", b"");

        let blob = pack(&folder).unwrap();

        let dest = tempfile::tempdir().unwrap();
        let out = dest.path().join("restored");
        unpack(&blob, &out).unwrap();

        assert_eq!(snapshot(&folder), snapshot(&out));
    }

    #[test]
    fn pack_skips_directory_entries() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("only/dirs")).unwrap();
        write(src.path(), "a.txt", b"a");

        let blob = pack(src.path()).unwrap();
        let archive = ZipArchive::new(Cursor::new(blob)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[test]
    fn pack_missing_folder_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = pack(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }

    #[test]
    fn unpack_overwrites_existing_file() {
        let src = tempfile::tempdir().unwrap();
        write(src.path(), "save.lsv", b"new");
        let blob = pack(src.path()).unwrap();

        let dest = tempfile::tempdir().unwrap();
        write(dest.path(), "save.lsv", b"old old old");
        unpack(&blob, dest.path()).unwrap();
        assert_eq!(fs::read(dest.path().join("save.lsv")).unwrap(), b"new");
    }

    #[test]
    fn unpack_rejects_garbage() {
        let dest = tempfile::tempdir().unwrap();
        let err = unpack(b"definitely not a zip", &dest.path().join("x")).unwrap_err();
        assert!(matches!(err, SyncError::CorruptArchive(_)));
    }

    #[test]
    fn unpack_skips_escaping_entries() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("../evil.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nope").unwrap();
        writer.start_file("ok.txt", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"fine").unwrap();
        let blob = writer.finish().unwrap().into_inner();

        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("inner");
        unpack(&blob, &dest).unwrap();
        assert!(dest.join("ok.txt").exists());
        assert!(!root.path().join("evil.txt").exists());
    }

    #[test]
    fn archive_names() {
        assert_eq!(archive_name("abc__HonourMode"), "abc__HonourMode.zip");
        assert_eq!(strip_archive_extension("abc__HonourMode.zip"), "abc__HonourMode");
        assert_eq!(strip_archive_extension("plain"), "plain");
    }
}
