//! Manifest archive validation.
//!
//! An uploaded (or build-system fetched) byte stream is accepted only if it
//! is a well-formed, unencrypted zip whose total uncompressed size stays
//! within the configured bound. Validation reads central-directory metadata
//! only; entry contents are materialized on demand afterwards.

pub mod zip;

use std::fs;
use std::io::Read;
use std::path::{Component, Path};

use flate2::read::DeflateDecoder;
use tracing::debug;

use crate::error::{RelayError, Result};
use zip::{CompressionMethod, ZipEntry};

/// A validated operator manifest archive.
///
/// Holds the raw bytes plus the parsed entry listing; entries can be
/// materialized individually or extracted as a tree for the registry push
/// tool.
#[derive(Debug)]
pub struct ManifestArchive {
    filename: String,
    bytes: Vec<u8>,
    entries: Vec<ZipEntry>,
}

impl ManifestArchive {
    /// Validate `bytes` as a manifest archive named `filename`.
    ///
    /// Rejections, all as [RelayError::UploadedFile]:
    /// - the final extension is not `.zip` (case-sensitive),
    /// - the bytes are not structurally a zip ("not a zip file"),
    /// - any entry carries the encryption flag ("is encrypted"),
    /// - the summed uncompressed size exceeds `max_uncompressed_size`
    ///   (a limit of 0 disables the bound).
    pub fn open(filename: &str, bytes: Vec<u8>, max_uncompressed_size: u64) -> Result<Self> {
        if Path::new(filename).extension().map(|e| e != "zip").unwrap_or(true) {
            return Err(RelayError::uploaded_file(format!(
                "unsupported file extension of '{}', expected 'zip'",
                filename
            )));
        }

        let entries = zip::list_entries(&bytes).map_err(|_| {
            RelayError::uploaded_file(format!("file '{}' is not a zip file", filename))
        })?;

        if let Some(entry) = entries.iter().find(|e| e.encrypted) {
            return Err(RelayError::uploaded_file(format!(
                "file '{}' is encrypted (entry '{}')",
                filename, entry.name
            )));
        }

        let total_uncompressed: u64 = entries.iter().map(|e| e.uncompressed_size).sum();
        if max_uncompressed_size > 0 && total_uncompressed > max_uncompressed_size {
            return Err(RelayError::uploaded_file(format!(
                "uncompressed size {} of '{}' exceeds the limit of {} bytes",
                total_uncompressed, filename, max_uncompressed_size
            )));
        }

        debug!(
            filename,
            entries = entries.len(),
            total_uncompressed,
            "validated manifest archive"
        );

        Ok(ManifestArchive {
            filename: filename.to_string(),
            bytes,
            entries,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Raw archive bytes handed to the registry push tool
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parsed entry listing
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Materialize a single entry's contents in memory.
    pub fn entry_bytes(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        let data = zip::entry_data(&self.bytes, entry)?;

        match entry.compression {
            CompressionMethod::Stored => Ok(data.to_vec()),
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(data)
                    .read_to_end(&mut out)
                    .map_err(|e| {
                        RelayError::uploaded_file(format!(
                            "entry '{}' of '{}' failed to decompress: {}",
                            entry.name, self.filename, e
                        ))
                    })?;
                Ok(out)
            }
            CompressionMethod::Unknown(method) => Err(RelayError::uploaded_file(format!(
                "entry '{}' of '{}' uses unsupported compression method {}",
                entry.name, self.filename, method
            ))),
        }
    }

    /// Extract every file entry under `dir`, preserving archive paths.
    pub fn extract_to(&self, dir: &Path) -> Result<()> {
        for entry in &self.entries {
            let relative = sanitized_path(&entry.name).ok_or_else(|| {
                RelayError::uploaded_file(format!(
                    "entry '{}' of '{}' has an unsafe path",
                    entry.name, self.filename
                ))
            })?;
            let target = dir.join(relative);

            if entry.is_directory {
                fs::create_dir_all(&target)?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, self.entry_bytes(entry)?)?;
        }
        Ok(())
    }
}

/// Reject absolute paths and parent-directory traversal in entry names.
fn sanitized_path(name: &str) -> Option<&Path> {
    let path = Path::new(name);
    let safe = path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Some(path)
    } else {
        None
    }
}
