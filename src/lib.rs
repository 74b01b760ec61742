//! PaperCut Report Downloader
//!
//! Searches a Gmail mailbox for PaperCut MF report messages, classifies them
//! by subject line, and downloads their attachments into date-organized
//! folders, optionally archiving the processed messages.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 installed-app flow with token caching and a
//!   single delete-and-retry recovery for rejected tokens
//! - **Search**: one configurable Gmail query, paginated until exhausted
//! - **Classification**: configurable subject-line regexes derive the output
//!   folder (report date) and filename (school executive summaries)
//! - **Download**: per-part attachment fetch and overwrite-on-write output
//! - **Archive**: optional per-message UNREAD/INBOX label removal
//!
//! # Example Usage
//!
//! ```no_run
//! use papercut_reports::{auth, client::ProductionGmailClient, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(".papercut-reports/config.json".as_ref()).await?;
//!
//!     let hub = auth::initialize_gmail_hub(
//!         ".papercut-reports/credentials.json".as_ref(),
//!         ".papercut-reports/token.json".as_ref(),
//!         &config.scopes,
//!     )
//!     .await?;
//!
//!     let client = ProductionGmailClient::new(hub);
//!     // Use client to search and download report attachments
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`client`] - Gmail API client with retry logic
//! - [`cli`] - Command-line interface and progress reporting
//! - [`config`] - JSON configuration document
//! - [`error`] - Error types and result alias
//! - [`models`] - Message model and subject-line classification
//! - [`pipeline`] - Run orchestration and archiving
//! - [`writer`] - Attachment output

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod writer;

// Re-export commonly used types for convenience
pub use error::{ReportError, Result};

pub use config::{Config, PatternConfig};
pub use models::{MessageDetail, PartInfo, SubjectPatterns};

pub use client::{GmailClient, ProductionGmailClient};
pub use pipeline::{MessageFailure, RunOptions, RunReport};
pub use writer::AttachmentWriter;

pub use cli::{Cli, Commands, ProgressReporter};
