use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::types::FileEntry;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("invalid file name")]
    InvalidName,
    #[error("empty file")]
    Empty,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Flat invoice and photo directories under `<data>/uploads`. Stored
/// names are prefixed with the job number and a timestamp so the
/// directories never collide across orders.
#[derive(Clone, Debug)]
pub struct FileStore {
    invoices_root: PathBuf,
    photos_root: PathBuf,
}

/// Keeps the final path component and reduces it to a safe character
/// set. Returns `None` when nothing usable remains.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches(['.', '_']).to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn random_tag() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Rejects anything that could escape the flat upload directories.
fn safe_join(root: &Path, stored_name: &str) -> Option<PathBuf> {
    if stored_name.is_empty()
        || stored_name.contains('/')
        || stored_name.contains('\\')
        || stored_name.contains("..")
    {
        return None;
    }
    Some(root.join(stored_name))
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(err) = std::fs::remove_file(path) {
            log::warn!("could not remove {}: {}", path.display(), err);
        }
    }
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let uploads = data_dir.as_ref().join("uploads");
        Self {
            invoices_root: uploads.join("invoices"),
            photos_root: uploads.join("photos"),
        }
    }

    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.invoices_root).context("creating invoices dir")?;
        std::fs::create_dir_all(&self.photos_root).context("creating photos dir")?;
        Ok(())
    }

    pub fn invoice_path(&self, stored_name: &str) -> Option<PathBuf> {
        safe_join(&self.invoices_root, stored_name)
    }

    pub fn photo_path(&self, stored_name: &str) -> Option<PathBuf> {
        safe_join(&self.photos_root, stored_name)
    }

    pub fn store_invoice(
        &self,
        job_no: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<FileEntry, FileError> {
        let filename = sanitize_file_name(original_name).ok_or(FileError::InvalidName)?;
        if data.is_empty() {
            return Err(FileError::Empty);
        }
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let stored_name = format!("{job_no}-{timestamp}-{filename}");
        std::fs::write(self.invoices_root.join(&stored_name), data)?;
        Ok(FileEntry {
            original_name: filename,
            stored_name,
            uploaded_at: Utc::now(),
        })
    }

    pub fn store_photo(
        &self,
        job_no: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<FileEntry, FileError> {
        let filename = sanitize_file_name(original_name).ok_or(FileError::InvalidName)?;
        if data.is_empty() {
            return Err(FileError::Empty);
        }
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let stored_name = format!("{job_no}-{timestamp}-{}-{filename}", random_tag());
        std::fs::write(self.photos_root.join(&stored_name), data)?;
        Ok(FileEntry {
            original_name: filename,
            stored_name,
            uploaded_at: Utc::now(),
        })
    }

    /// Best effort; order deletion must not fail on a missing file.
    pub fn delete_invoice(&self, stored_name: &str) {
        if let Some(path) = self.invoice_path(stored_name) {
            remove_quietly(&path);
        }
    }

    pub fn delete_photo(&self, stored_name: &str) {
        if let Some(path) = self.photo_path(stored_name) {
            remove_quietly(&path);
        }
    }

    /// Packs the stored photos into an in-memory ZIP, using the original
    /// names as archive entries. Missing files are skipped.
    pub fn zip_photos(&self, photos: &[FileEntry]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for photo in photos {
            let Some(path) = self.photo_path(&photo.stored_name) else {
                continue;
            };
            if !path.exists() {
                continue;
            }
            let data = std::fs::read(&path)
                .with_context(|| format!("reading photo {}", photo.stored_name))?;
            let entry_name = sanitize_file_name(&photo.original_name)
                .unwrap_or_else(|| photo.stored_name.clone());
            writer
                .start_file(entry_name, options)
                .context("starting zip entry")?;
            writer.write_all(&data).context("writing zip entry")?;
        }

        let cursor = writer.finish().context("finalizing zip")?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.init().unwrap();
        (dir, store)
    }

    #[test]
    fn sanitize_keeps_safe_names() {
        assert_eq!(sanitize_file_name("invoice.pdf").as_deref(), Some("invoice.pdf"));
        assert_eq!(
            sanitize_file_name("my photo (1).jpg").as_deref(),
            Some("my_photo__1_.jpg")
        );
    }

    #[test]
    fn sanitize_strips_directories_and_dot_runs() {
        assert_eq!(
            sanitize_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_file_name("C:\\temp\\a.pdf").as_deref(),
            Some("a.pdf")
        );
        assert_eq!(sanitize_file_name("...."), None);
        assert_eq!(sanitize_file_name("  "), None);
    }

    #[test]
    fn stored_invoice_lands_under_job_prefix() {
        let (_dir, store) = store();
        let entry = store
            .store_invoice("WO-1234", "fatura.pdf", b"%PDF-")
            .unwrap();
        assert!(entry.stored_name.starts_with("WO-1234-"));
        assert!(entry.stored_name.ends_with("-fatura.pdf"));
        assert_eq!(entry.original_name, "fatura.pdf");
        let path = store.invoice_path(&entry.stored_name).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-");
    }

    #[test]
    fn empty_upload_is_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.store_invoice("WO-1234", "a.pdf", b""),
            Err(FileError::Empty)
        ));
        assert!(matches!(
            store.store_photo("WO-1234", "///", b"x"),
            Err(FileError::InvalidName)
        ));
    }

    #[test]
    fn photo_names_do_not_collide() {
        let (_dir, store) = store();
        let a = store.store_photo("WO-1234", "p.jpg", b"a").unwrap();
        let b = store.store_photo("WO-1234", "p.jpg", b"b").unwrap();
        assert_ne!(a.stored_name, b.stored_name);
    }

    #[test]
    fn traversal_names_are_refused() {
        let (_dir, store) = store();
        assert!(store.invoice_path("../escape.pdf").is_none());
        assert!(store.photo_path("a/b.jpg").is_none());
        assert!(store.photo_path("").is_none());
    }

    #[test]
    fn zip_contains_original_names_and_skips_missing() {
        let (_dir, store) = store();
        let photo = store.store_photo("WO-1234", "front.jpg", b"jpegdata").unwrap();
        let ghost = FileEntry {
            original_name: "gone.jpg".into(),
            stored_name: "WO-1234-00000000000000-XXXX-gone.jpg".into(),
            uploaded_at: Utc::now(),
        };

        let bytes = store.zip_photos(&[photo, ghost]).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.by_index(0).unwrap().name(), "front.jpg");
    }

    #[test]
    fn delete_is_quiet_on_missing_files() {
        let (_dir, store) = store();
        store.delete_invoice("nope.pdf");
        store.delete_photo("../nope.jpg");
    }
}
