// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spool multipart uploads to a temporary directory.
//!
//! Files live until the returned [`SpooledUploads`] is dropped, which
//! happens right after parsing.

use crate::error::ApiError;
use axum::extract::Multipart;
use ifc_report_processing::Upload;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

const ACCEPTED_EXTENSION: &str = "ifc";

/// Uploaded files stored on disk.
#[derive(Debug)]
pub struct SpooledUploads {
    pub uploads: Vec<Upload>,
    pub total_bytes: usize,
    _dir: TempDir,
}

/// Display name of an upload: the last path component, without directories.
pub fn display_name(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("upload.ifc")
        .to_string()
}

pub fn has_ifc_extension(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION))
}

/// Write every file field of `multipart` to disk.
///
/// Fields without a file name are ignored. Any file without the `.ifc`
/// extension rejects the whole request, as does exceeding `max_bytes` in total.
pub async fn spool_uploads(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<SpooledUploads, ApiError> {
    let dir = tempfile::Builder::new().prefix("ifc-report-").tempdir()?;
    let mut uploads = Vec::new();
    let mut total_bytes = 0usize;

    while let Some(mut field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(display_name) else {
            tracing::debug!(field_name = ?field.name(), "Skipping non-file multipart field");
            continue;
        };
        if !has_ifc_extension(&file_name) {
            tracing::warn!(file = %file_name, "Rejected upload with unsupported extension");
            return Err(ApiError::UnsupportedFile(file_name));
        }

        let path = dir.path().join(format!("upload_{}.ifc", uploads.len()));
        let mut file = tokio::fs::File::create(&path).await?;
        let mut size = 0usize;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len();
            total_bytes += chunk.len();
            if total_bytes > max_bytes {
                return Err(ApiError::FileTooLarge {
                    max_mb: max_bytes / (1024 * 1024),
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::debug!(file = %file_name, size, "Spooled upload");
        uploads.push(Upload { file_name, path });
    }

    if uploads.is_empty() {
        tracing::warn!("No file field found in multipart request");
        return Err(ApiError::MissingFile);
    }

    Ok(SpooledUploads {
        uploads,
        total_bytes,
        _dir: dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_strips_directories() {
        assert_eq!(display_name("models/level1/walls.ifc"), "walls.ifc");
        assert_eq!(display_name("C:\\models\\doors.IFC"), "doors.IFC");
        assert_eq!(display_name(""), "upload.ifc");
    }

    #[test]
    fn test_extension_check() {
        assert!(has_ifc_extension("walls.ifc"));
        assert!(has_ifc_extension("WALLS.IFC"));
        assert!(!has_ifc_extension("walls.ifczip"));
        assert!(!has_ifc_extension("report.xlsx"));
        assert!(!has_ifc_extension("ifc"));
    }
}
