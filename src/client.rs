//! Gmail API client with retry logic for transient failures

use async_trait::async_trait;
use google_gmail1::api::{Message, ModifyMessageRequest};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::GmailHub;
use crate::error::{ReportError, Result};
use crate::models::{MessageDetail, PartInfo, NO_SUBJECT};

const GMAIL_MODIFY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Trait defining the Gmail operations the pipeline needs, kept narrow for
/// easier testing with an in-memory fake
#[async_trait]
pub trait GmailClient: Send + Sync {
    /// List all message IDs matching a query, following result pages until
    /// exhausted. An empty result is a valid, non-error outcome.
    async fn list_message_ids(&self, query: &str) -> Result<Vec<String>>;

    /// Fetch the full message record for one id
    async fn get_message(&self, id: &str) -> Result<MessageDetail>;

    /// Fetch and decode one attachment body
    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>>;

    /// Remove labels from a message (used to mark read and archive)
    async fn remove_labels(&self, message_id: &str, label_ids: &[&str]) -> Result<()>;
}

/// Production Gmail client over the API hub, one request in flight at a time
pub struct ProductionGmailClient {
    hub: GmailHub,
}

impl ProductionGmailClient {
    pub fn new(hub: GmailHub) -> Self {
        Self { hub }
    }

    /// Check if an error is retryable
    fn should_retry(error: &ReportError) -> bool {
        error.is_transient()
    }

    /// Execute an async operation with exponential backoff retry
    async fn with_retry<T, F, Fut>(
        operation_name: &str,
        max_retries: u32,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut delay = Duration::from_secs(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if Self::should_retry(&e) && attempts <= max_retries => {
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name,
                        attempts,
                        max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, Duration::from_secs(30));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Parse a Gmail API Message into our MessageDetail structure
fn parse_message_detail(msg: Message) -> Result<MessageDetail> {
    let id = msg
        .id
        .ok_or_else(|| ReportError::InvalidMessageFormat("Missing message ID".to_string()))?;

    let payload = msg
        .payload
        .ok_or_else(|| ReportError::InvalidMessageFormat("Missing payload".to_string()))?;

    // First header named Subject, else the fallback literal
    let subject = payload
        .headers
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|h| h.name.as_deref() == Some("Subject"))
        .and_then(|h| h.value.clone())
        .unwrap_or_else(|| NO_SUBJECT.to_string());

    let parts = payload
        .parts
        .unwrap_or_default()
        .into_iter()
        .map(|part| PartInfo {
            filename: part.filename.unwrap_or_default(),
            part_id: part.part_id.unwrap_or_default(),
            attachment_id: part.body.and_then(|b| b.attachment_id),
        })
        .collect();

    Ok(MessageDetail { id, subject, parts })
}

#[async_trait]
impl GmailClient for ProductionGmailClient {
    async fn list_message_ids(&self, query: &str) -> Result<Vec<String>> {
        let mut all_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = page_token.clone();
            let response = Self::with_retry("list_messages", 3, || {
                let token = token.clone();
                async move {
                    let mut call = self
                        .hub
                        .users()
                        .messages_list("me")
                        .q(query)
                        .max_results(100);

                    if let Some(t) = token.as_ref() {
                        call = call.page_token(t);
                    }

                    let (_, response) = call.add_scope(GMAIL_MODIFY_SCOPE).doit().await?;
                    Ok(response)
                }
            })
            .await?;

            if let Some(messages) = response.messages {
                for msg_ref in messages {
                    if let Some(id) = msg_ref.id {
                        all_ids.push(id);
                    }
                }
            }

            page_token = response.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!("Search matched {} messages", all_ids.len());
        Ok(all_ids)
    }

    async fn get_message(&self, id: &str) -> Result<MessageDetail> {
        let msg = Self::with_retry("get_message", 3, || async move {
            let (_, msg) = self
                .hub
                .users()
                .messages_get("me", id)
                .format("full")
                .add_scope(GMAIL_MODIFY_SCOPE)
                .doit()
                .await?;
            Ok(msg)
        })
        .await?;

        parse_message_detail(msg)
    }

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Vec<u8>> {
        let body = Self::with_retry("get_attachment", 3, || async move {
            let (_, body) = self
                .hub
                .users()
                .messages_attachments_get("me", message_id, attachment_id)
                .add_scope(GMAIL_MODIFY_SCOPE)
                .doit()
                .await?;
            Ok(body)
        })
        .await?;

        // The SDK decodes the base64url wire form into raw bytes
        body.data.ok_or_else(|| {
            ReportError::TransferError(format!(
                "attachment {} of message {} has no data",
                attachment_id, message_id
            ))
        })
    }

    async fn remove_labels(&self, message_id: &str, label_ids: &[&str]) -> Result<()> {
        let request = ModifyMessageRequest {
            add_label_ids: None,
            remove_label_ids: Some(label_ids.iter().map(|s| s.to_string()).collect()),
        };

        Self::with_retry("remove_labels", 3, || {
            let request = request.clone();
            async move {
                self.hub
                    .users()
                    .messages_modify(request, "me", message_id)
                    .add_scope(GMAIL_MODIFY_SCOPE)
                    .doit()
                    .await?;
                Ok(())
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_gmail1::api::{MessagePart, MessagePartBody, MessagePartHeader};

    fn header(name: &str, value: &str) -> MessagePartHeader {
        MessagePartHeader {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
        }
    }

    fn attachment_part(part_id: &str, filename: &str, attachment_id: &str) -> MessagePart {
        MessagePart {
            part_id: Some(part_id.to_string()),
            filename: Some(filename.to_string()),
            body: Some(MessagePartBody {
                attachment_id: Some(attachment_id.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_message_detail() {
        let msg = Message {
            id: Some("m1".to_string()),
            payload: Some(MessagePart {
                headers: Some(vec![
                    header("From", "papercut@example.org"),
                    header("Subject", "Automated report: Mar 4, 2024"),
                ]),
                parts: Some(vec![
                    MessagePart {
                        part_id: Some("0".to_string()),
                        filename: Some(String::new()),
                        ..Default::default()
                    },
                    attachment_part("1", "report.pdf", "att-1"),
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let detail = parse_message_detail(msg).unwrap();
        assert_eq!(detail.id, "m1");
        assert_eq!(detail.subject, "Automated report: Mar 4, 2024");
        assert_eq!(detail.parts.len(), 2);
        assert_eq!(detail.attachment_filenames(), vec!["report.pdf"]);
        assert_eq!(
            detail.parts[1].attachment_id.as_deref(),
            Some("att-1")
        );
    }

    #[test]
    fn test_parse_message_detail_missing_subject() {
        let msg = Message {
            id: Some("m1".to_string()),
            payload: Some(MessagePart {
                headers: Some(vec![header("From", "papercut@example.org")]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let detail = parse_message_detail(msg).unwrap();
        assert_eq!(detail.subject, NO_SUBJECT);
        assert!(detail.parts.is_empty());
    }

    #[test]
    fn test_parse_message_detail_missing_id() {
        let msg = Message::default();
        assert!(matches!(
            parse_message_detail(msg),
            Err(ReportError::InvalidMessageFormat(_))
        ));
    }

    #[test]
    fn test_attachment_body_decodes_base64url_wire_form() {
        use base64::{engine::general_purpose::URL_SAFE, Engine as _};
        use rand::RngCore;

        let mut bytes = vec![0u8; 256];
        rand::thread_rng().fill_bytes(&mut bytes);

        let json = format!(
            r#"{{"attachmentId":"att-1","data":"{}","size":{}}}"#,
            URL_SAFE.encode(&bytes),
            bytes.len()
        );

        let body: MessagePartBody = serde_json::from_str(&json).unwrap();
        assert_eq!(body.data.as_deref(), Some(bytes.as_slice()));
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_transient_error() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = ProductionGmailClient::with_retry("test_op", 3, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                let current = count.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    Err(ReportError::NetworkError("Connection timeout".to_string()))
                } else {
                    Ok("success".to_string())
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_fails_on_permanent_error() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = ProductionGmailClient::with_retry("test_op", 3, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(ReportError::AuthError("Invalid credentials".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        // Permanent errors are not retried
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_all_retries() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let attempt_count = Arc::new(AtomicU32::new(0));
        let attempt_count_clone = Arc::clone(&attempt_count);

        let result = ProductionGmailClient::with_retry("test_op", 3, || {
            let count = Arc::clone(&attempt_count_clone);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(ReportError::RateLimitExceeded { retry_after: 1 })
            }
        })
        .await;

        assert!(result.is_err());
        // Initial attempt + 3 retries
        assert_eq!(attempt_count.load(Ordering::SeqCst), 4);
    }
}
