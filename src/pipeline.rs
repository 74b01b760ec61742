//! Run orchestration: find, classify, download, archive, report

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cli::ProgressReporter;
use crate::client::GmailClient;
use crate::config::Config;
use crate::error::Result;
use crate::models::SubjectPatterns;
use crate::writer::AttachmentWriter;

/// Labels removed from processed messages when archiving
pub const ARCHIVE_LABELS: [&str; 2] = ["UNREAD", "INBOX"];

/// A per-message failure surfaced in the end-of-run summary
#[derive(Debug, Clone)]
pub struct MessageFailure {
    pub message_id: String,
    pub error: String,
}

/// End-of-run summary. One bad message never hides the rest of the batch;
/// its failure lands here instead.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub messages_found: usize,
    pub messages_processed: usize,
    pub files_written: usize,
    pub messages_archived: usize,
    pub failures: Vec<MessageFailure>,
}

impl RunReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.completed_at - self.started_at).num_seconds()
    }
}

/// Options controlling a single pipeline run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Remove UNREAD/INBOX labels from successfully processed messages
    pub archive: bool,
    /// Report what would happen without writing files or modifying labels
    pub dry_run: bool,
}

/// Run the full pipeline: search, fetch each message, write its attachments,
/// then archive what succeeded.
///
/// Messages are processed one at a time. Classification and transfer errors
/// are isolated per message and collected into the report; only
/// authentication, configuration, and search failures abort the run.
pub async fn run<C>(
    client: &C,
    config: &Config,
    patterns: &SubjectPatterns,
    writer: &AttachmentWriter,
    reporter: &ProgressReporter,
    options: RunOptions,
) -> Result<RunReport>
where
    C: GmailClient + ?Sized,
{
    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    info!("Starting run {} with query {:?}", run_id, config.query);

    let search_spinner = reporter.add_spinner("Searching for matching messages...");
    let message_ids = client.list_message_ids(&config.query).await?;
    reporter.finish_spinner(
        &search_spinner,
        &format!("Matching messages found: {}", message_ids.len()),
    );

    let mut report = RunReport {
        run_id,
        started_at,
        completed_at: started_at,
        messages_found: message_ids.len(),
        messages_processed: 0,
        files_written: 0,
        messages_archived: 0,
        failures: Vec::new(),
    };

    if message_ids.is_empty() {
        info!("No matching messages; nothing to do");
        report.completed_at = Utc::now();
        return Ok(report);
    }

    let mut processed_ids = Vec::new();
    let pb = reporter.add_progress_bar(message_ids.len() as u64, "Downloading message data...");

    for message_id in &message_ids {
        match process_message(client, writer, patterns, message_id, options.dry_run).await {
            Ok(files) => {
                report.messages_processed += 1;
                report.files_written += files;
                processed_ids.push(message_id.clone());
            }
            Err(e) => {
                warn!("Skipping message {}: {}", message_id, e);
                report.failures.push(MessageFailure {
                    message_id: message_id.clone(),
                    error: e.to_string(),
                });
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!(
        "Processed {} of {} messages",
        report.messages_processed, report.messages_found
    ));

    // Only successfully processed messages leave the unread work queue
    if options.archive && !processed_ids.is_empty() {
        if options.dry_run {
            info!("Dry run: would archive {} messages", processed_ids.len());
        } else {
            let (archived, failures) = archive_messages(client, &processed_ids, reporter).await;
            report.messages_archived = archived;
            report.failures.extend(failures);
        }
    }

    report.completed_at = Utc::now();
    Ok(report)
}

/// Fetch one message and write its attachments. Returns the number of files
/// written (zero in dry-run mode).
async fn process_message<C>(
    client: &C,
    writer: &AttachmentWriter,
    patterns: &SubjectPatterns,
    message_id: &str,
    dry_run: bool,
) -> Result<usize>
where
    C: GmailClient + ?Sized,
{
    let message = client.get_message(message_id).await?;

    if let Some(group) = message.printer_group(patterns) {
        debug!("Message {} is a printer-group report: {}", message.id, group);
    }

    if dry_run {
        // Classification still runs so a bad subject is reported in dry runs
        let folder = message.folder_name(patterns)?;
        info!(
            "Dry run: would write {:?} to folder {}",
            message.attachment_filenames(),
            folder
        );
        return Ok(0);
    }

    let written = writer.write_all(client, &message, patterns).await?;
    Ok(written.len())
}

/// Remove the UNREAD and INBOX labels from each message, one modify call per
/// id. Failures are surfaced per message and never abort the batch.
pub async fn archive_messages<C>(
    client: &C,
    message_ids: &[String],
    reporter: &ProgressReporter,
) -> (usize, Vec<MessageFailure>)
where
    C: GmailClient + ?Sized,
{
    let mut archived = 0;
    let mut failures = Vec::new();

    let pb = reporter.add_progress_bar(message_ids.len() as u64, "Archiving messages...");
    for message_id in message_ids {
        match client.remove_labels(message_id, &ARCHIVE_LABELS).await {
            Ok(()) => {
                debug!("Archived message {}", message_id);
                archived += 1;
            }
            Err(e) => {
                warn!("Failed to archive message {}: {}", message_id, e);
                failures.push(MessageFailure {
                    message_id: message_id.clone(),
                    error: format!("archive failed: {}", e),
                });
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message(format!("Archived {} messages", archived));

    (archived, failures)
}
