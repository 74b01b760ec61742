//! Attachment output: fetch, name, and write report files to disk

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::client::GmailClient;
use crate::error::{ReportError, Result};
use crate::models::{MessageDetail, PartInfo, SubjectPatterns};

/// Writes a message's attachments into date-organized folders under a fixed
/// output root. Existing files at the same path are overwritten.
pub struct AttachmentWriter {
    output_root: PathBuf,
}

/// Choose the output filename for one attachment part.
///
/// School executive summaries are renamed to the school name with a fixed
/// `.pdf` extension; everything else keeps its original attachment filename.
pub fn output_filename(
    message: &MessageDetail,
    part: &PartInfo,
    patterns: &SubjectPatterns,
) -> String {
    match message.executive_summary_prefix(patterns) {
        Some(school) => format!("{}.pdf", school),
        None => part.filename.clone(),
    }
}

impl AttachmentWriter {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Fetch, decode, and write every attachment of a message.
    ///
    /// Each part's body is resolved through its own attachment id rather than
    /// a positional index into the parts list. The destination folder is
    /// created on demand. Returns the written paths; the first failing part
    /// fails the whole message.
    pub async fn write_all<C>(
        &self,
        client: &C,
        message: &MessageDetail,
        patterns: &SubjectPatterns,
    ) -> Result<Vec<PathBuf>>
    where
        C: GmailClient + ?Sized,
    {
        let folder = self.output_root.join(message.folder_name(patterns)?);
        let mut written = Vec::new();

        for part in message.attachment_parts() {
            let attachment_id = part.attachment_id.as_deref().ok_or_else(|| {
                ReportError::TransferError(format!(
                    "part {} ({}) of message {} has no attachment id",
                    part.part_id, part.filename, message.id
                ))
            })?;

            let data = client.get_attachment(&message.id, attachment_id).await?;

            tokio::fs::create_dir_all(&folder).await.map_err(|e| {
                ReportError::TransferError(format!(
                    "failed to create output folder {:?}: {}",
                    folder, e
                ))
            })?;

            let path = folder.join(output_filename(message, part, patterns));
            tokio::fs::write(&path, &data).await.map_err(|e| {
                ReportError::TransferError(format!("failed to write {:?}: {}", path, e))
            })?;

            debug!("Wrote {} bytes to {:?}", data.len(), path);
            written.push(path);
        }

        if !written.is_empty() {
            info!(
                "Message {}: wrote {} file(s) to {:?}",
                message.id,
                written.len(),
                folder
            );
        }

        Ok(written)
    }
}
