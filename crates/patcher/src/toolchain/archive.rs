//! Zip-backed package archive

use super::blocking::check;
use super::{ApkArchive, BlockingScope};
use apkm_errors::{Error, PatchError};
use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use tokio_util::sync::CancellationToken;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entries Android requires to be stored without compression
fn must_store(name: &str) -> bool {
    name == "resources.arsc" || name.ends_with(".so")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipApkArchive;

#[async_trait]
impl ApkArchive for ZipApkArchive {
    async fn extract(&self, apk: &Path, dest: &Path, scope: &BlockingScope) -> Result<(), Error> {
        let apk = apk.to_path_buf();
        let dest = dest.to_path_buf();
        scope
            .run("extract", move |cancel| extract_blocking(&apk, &dest, cancel))
            .await
    }

    async fn repack(
        &self,
        src_dir: &Path,
        out: &Path,
        scope: &BlockingScope,
    ) -> Result<(), Error> {
        let src_dir = src_dir.to_path_buf();
        let out = out.to_path_buf();
        scope
            .run("repack", move |cancel| {
                let result = repack_blocking(&src_dir, &out, cancel);
                if result.is_err() {
                    let _ = std::fs::remove_file(&out);
                }
                result
            })
            .await
    }
}

fn invalid_archive(path: &Path, message: impl ToString) -> Error {
    PatchError::InvalidArchive {
        path: path.display().to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Writer-side zip errors: I/O keeps its storage classification
fn write_error(out: &Path, err: ZipError) -> Error {
    match err {
        ZipError::Io(e) => Error::io_with_path(&e, out),
        other => invalid_archive(out, other),
    }
}

fn extract_blocking(apk: &Path, dest: &Path, cancel: &CancellationToken) -> Result<(), Error> {
    let file = File::open(apk).map_err(|e| Error::io_with_path(&e, apk))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| invalid_archive(apk, e))?;

    for index in 0..archive.len() {
        check(cancel)?;
        let mut entry = archive.by_index(index).map_err(|e| invalid_archive(apk, e))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(invalid_archive(
                apk,
                format!("entry escapes the archive root: {}", entry.name()),
            ));
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| Error::io_with_path(&e, &target))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(&e, parent))?;
        }
        let mut out = File::create(&target).map_err(|e| Error::io_with_path(&e, &target))?;
        io::copy(&mut entry, &mut out).map_err(|e| Error::io_with_path(&e, &target))?;
    }

    Ok(())
}

fn repack_blocking(src_dir: &Path, out: &Path, cancel: &CancellationToken) -> Result<(), Error> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::internal(format!("walk {}: {e}", src_dir.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|e| Error::internal(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((name, entry.path().to_path_buf()));
    }

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(&e, parent))?;
    }
    let file = File::create(out).map_err(|e| Error::io_with_path(&e, out))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    for (name, path) in files {
        check(cancel)?;
        let method = if must_store(&name) {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| write_error(out, e))?;
        let mut input = File::open(&path).map_err(|e| Error::io_with_path(&e, &path))?;
        io::copy(&mut input, &mut writer).map_err(|e| Error::io_with_path(&e, out))?;
    }

    let mut inner = writer.finish().map_err(|e| write_error(out, e))?;
    inner.flush().map_err(|e| Error::io_with_path(&e, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_entries() {
        assert!(must_store("resources.arsc"));
        assert!(must_store("lib/arm64-v8a/libdiscord.so"));
        assert!(!must_store("classes.dex"));
        assert!(!must_store("res/values/strings.xml"));
    }

    #[test]
    fn test_write_errors_keep_storage_classification() {
        let out = Path::new("/tmp/unsigned.apk");
        let full = ZipError::Io(io::Error::from(io::ErrorKind::StorageFull));
        assert!(write_error(out, full).is_insufficient_storage());

        let other = write_error(out, ZipError::InvalidArchive("bad header".into()));
        assert!(!other.is_insufficient_storage());
        assert!(matches!(
            other,
            Error::Patch(PatchError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn test_cancelled_extract_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let apk = dir.path().join("base.apk");
        let mut writer = ZipWriter::new(File::create(&apk).unwrap());
        for i in 0..50 {
            writer
                .start_file(format!("res/raw/{i}.bin"), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"payload").unwrap();
        }
        writer.finish().unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let dest = dir.path().join("apk");
        let err = extract_blocking(&apk, &dest, &cancel).unwrap_err();
        assert!(err.is_cancelled());
        assert!(!dest.exists());
    }
}
