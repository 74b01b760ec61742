//! Shared test helpers: an in-memory Gmail client fake that records calls

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use papercut_reports::client::GmailClient;
use papercut_reports::error::{ReportError, Result};
use papercut_reports::models::{MessageDetail, PartInfo};

/// In-memory stand-in for the Gmail API. Messages and attachment bodies are
/// seeded up front; label modifications are recorded for assertions.
#[derive(Default)]
pub struct FakeGmailClient {
    messages: Vec<MessageDetail>,
    attachments: HashMap<(String, String), Vec<u8>>,
    modify_calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeGmailClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: MessageDetail) {
        self.messages.push(message);
    }

    pub fn add_attachment(&mut self, message_id: &str, attachment_id: &str, data: Vec<u8>) {
        self.attachments
            .insert((message_id.to_string(), attachment_id.to_string()), data);
    }

    pub fn modify_calls(&self) -> Vec<(String, Vec<String>)> {
        self.modify_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GmailClient for FakeGmailClient {
    async fn list_message_ids(&self, _query: &str) -> Result<Vec<String>> {
        Ok(self.messages.iter().map(|m| m.id.clone()).collect())
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail> {
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ReportError::MessageNotFound(id.to_string()))
    }

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>> {
        self.attachments
            .get(&(message_id.to_string(), attachment_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                ReportError::TransferError(format!(
                    "no attachment {} on message {}",
                    attachment_id, message_id
                ))
            })
    }

    async fn remove_labels(&self, message_id: &str, label_ids: &[&str]) -> Result<()> {
        self.modify_calls.lock().unwrap().push((
            message_id.to_string(),
            label_ids.iter().map(|s| s.to_string()).collect(),
        ));
        Ok(())
    }
}

/// A single-attachment report message in the shape the Gmail API returns:
/// a bodyless container part followed by the attachment part
pub fn report_message(id: &str, subject: &str, filename: &str, attachment_id: &str) -> MessageDetail {
    MessageDetail {
        id: id.to_string(),
        subject: subject.to_string(),
        parts: vec![
            PartInfo {
                filename: String::new(),
                part_id: "0".to_string(),
                attachment_id: None,
            },
            PartInfo {
                filename: filename.to_string(),
                part_id: "1".to_string(),
                attachment_id: Some(attachment_id.to_string()),
            },
        ],
    }
}
