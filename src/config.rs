//! JSON configuration document: query, scopes, subject patterns, archive flag

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Human-readable notes kept in the document; ignored by logic
    #[serde(default = "default_query_comments")]
    pub query_comments: Vec<String>,

    /// Gmail search query used to find report messages
    #[serde(default = "default_query")]
    pub query: String,

    #[serde(default = "default_scopes_comments")]
    pub scopes_comments: Vec<String>,

    /// OAuth2 scopes requested for the session
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    #[serde(default = "default_archive_comments")]
    pub archive_comments: Vec<String>,

    /// Mark processed messages as read and remove them from the inbox
    #[serde(default)]
    pub archive: bool,

    #[serde(default = "default_patterns_comments")]
    pub patterns_comments: Vec<String>,

    #[serde(default)]
    pub patterns: PatternConfig,

    /// Root folder for downloaded files; defaults to the user's Downloads
    /// directory when unset
    #[serde(default)]
    pub output_root: Option<PathBuf>,
}

/// Regular expressions applied to message subject lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default = "default_school_report")]
    pub school_report: String,
    #[serde(default = "default_printer_group")]
    pub printer_group: String,
    #[serde(default = "default_report_date")]
    pub report_date: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            school_report: default_school_report(),
            printer_group: default_printer_group(),
            report_date: default_report_date(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_comments: default_query_comments(),
            query: default_query(),
            scopes_comments: default_scopes_comments(),
            scopes: default_scopes(),
            archive_comments: default_archive_comments(),
            archive: false,
            patterns_comments: default_patterns_comments(),
            patterns: PatternConfig::default(),
            output_root: None,
        }
    }
}

fn default_query() -> String {
    "label:INBOX from:papercut@UPDATE_ME.COM has:attachment".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["https://www.googleapis.com/auth/gmail.modify".to_string()]
}

fn default_school_report() -> String {
    // Group 2 carries the school name only; "Executive summary" is matched
    // but excluded so the capture can name the output file directly
    r"(Automated report: )([A-Za-z]+(?:\s[A-Za-z]+)*)\s+Executive summary".to_string()
}

fn default_printer_group() -> String {
    r"(Automated report: )(([A-Za-z]+\s)+)-\s+[A-Za-z]+".to_string()
}

fn default_report_date() -> String {
    r"(([A-Z][a-z]{2})\s\d,\s(\d{4}))".to_string()
}

fn default_query_comments() -> Vec<String> {
    vec![
        "This query is used to search for the desired report messages.".to_string(),
        "Update the email address to match your PaperCut sender.".to_string(),
        "To match all messages: from:papercut@UPDATE_ME.org has:attachment".to_string(),
        "To match unread only: label:UNREAD from:papercut@UPDATE_ME.org has:attachment"
            .to_string(),
    ]
}

fn default_scopes_comments() -> Vec<String> {
    vec![
        "Access scopes this application has to the Gmail account".to_string(),
        "(read and modify messages). If these change, delete the cached".to_string(),
        "token file and re-run auth.".to_string(),
    ]
}

fn default_archive_comments() -> Vec<String> {
    vec![
        "true/false flag determining whether messages are archived".to_string(),
        "after the files are downloaded.".to_string(),
    ]
}

fn default_patterns_comments() -> Vec<String> {
    vec![
        "Regular expression search patterns applied to subject lines.".to_string(),
        "These won't change unless the PaperCut reporting format does.".to_string(),
    ]
}

impl Config {
    /// Load configuration from a JSON document.
    ///
    /// Missing file and malformed JSON are both `ConfigError`; callers that
    /// want first-run defaults should use [`Config::load_or_init`].
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ReportError::ConfigError(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ReportError::ConfigError(format!(
                "Failed to parse config file {:?}: {}. Check for misplaced or \
                 trailing commas, or delete the file to regenerate defaults.",
                path, e
            ))
        })?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, writing the default document on first run.
    ///
    /// When the file is missing, the parent directory is created, the default
    /// payload is persisted, and the defaults are returned with guidance
    /// logged. The default query will never match anything until the user
    /// edits the sender address.
    pub async fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path).await?;
            tracing::warn!(
                "Wrote default configuration to {:?}. Update the query's email \
                 address before the next run; the default query will not match \
                 any messages.",
                path
            );
            return Ok(config);
        }

        Self::load(path).await
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ReportError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|e| {
            ReportError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        tokio::fs::write(path, content).await.map_err(|e| {
            ReportError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(ReportError::ConfigError(
                "query cannot be empty".to_string(),
            ));
        }

        if self.scopes.is_empty() {
            return Err(ReportError::ConfigError(
                "scopes cannot be empty".to_string(),
            ));
        }

        for (name, pattern) in [
            ("school_report", &self.patterns.school_report),
            ("printer_group", &self.patterns.printer_group),
            ("report_date", &self.patterns.report_date),
        ] {
            Regex::new(pattern).map_err(|e| {
                ReportError::ConfigError(format!("patterns.{} is not a valid regex: {}", name, e))
            })?;
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Resolve the output root, falling back to the user's Downloads folder
    pub fn resolve_output_root(&self) -> PathBuf {
        match &self.output_root {
            Some(root) => root.clone(),
            None => dirs::download_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
                .unwrap_or_else(|| PathBuf::from("Downloads")),
        }
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}
