//! Message model and subject-line classification

use regex::Regex;

use crate::config::PatternConfig;
use crate::error::{ReportError, Result};

/// Subject used when a message carries no Subject header
pub const NO_SUBJECT: &str = "No Subject";

/// Compiled subject-line patterns, built once from the configuration and
/// passed by reference to everything that classifies messages
#[derive(Debug, Clone)]
pub struct SubjectPatterns {
    pub report_date: Regex,
    pub school_report: Regex,
    pub printer_group: Regex,
}

impl SubjectPatterns {
    pub fn compile(config: &PatternConfig) -> Result<Self> {
        let compile = |name: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                ReportError::ConfigError(format!("patterns.{} is not a valid regex: {}", name, e))
            })
        };

        Ok(Self {
            report_date: compile("report_date", &config.report_date)?,
            school_report: compile("school_report", &config.school_report)?,
            printer_group: compile("printer_group", &config.printer_group)?,
        })
    }
}

/// One MIME part of a fetched message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    /// Part filename; empty for non-attachment parts
    pub filename: String,
    pub part_id: String,
    /// Body reference for separately fetched attachment data
    pub attachment_id: Option<String>,
}

/// Full remote message record with derived classification accessors.
///
/// All accessors taking [`SubjectPatterns`] are pure functions of the fetched
/// payload and the configured patterns.
#[derive(Debug, Clone)]
pub struct MessageDetail {
    pub id: String,
    pub subject: String,
    /// MIME parts in the order returned by the API
    pub parts: Vec<PartInfo>,
}

impl MessageDetail {
    /// Parts that carry a non-empty filename, API order preserved
    pub fn attachment_parts(&self) -> impl Iterator<Item = &PartInfo> {
        self.parts.iter().filter(|p| !p.filename.is_empty())
    }

    /// Filenames of all attachment parts
    pub fn attachment_filenames(&self) -> Vec<&str> {
        self.attachment_parts()
            .map(|p| p.filename.as_str())
            .collect()
    }

    /// Derive the date-organized output folder name from the subject line.
    ///
    /// The report-date pattern captures a three-letter month abbreviation
    /// (group 2) and a four-digit year (group 3); the folder name is the
    /// zero-padded calendar month joined with the year, e.g. "Mar 4, 2024"
    /// yields `03-2024`. A subject without a report date is a
    /// `ClassificationError`.
    pub fn folder_name(&self, patterns: &SubjectPatterns) -> Result<String> {
        let captures = patterns.report_date.captures(&self.subject).ok_or_else(|| {
            ReportError::ClassificationError(format!(
                "no report date found in subject {:?}",
                self.subject
            ))
        })?;

        let month_abbrev = captures
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or_default();
        let year = captures.get(3).map(|m| m.as_str()).unwrap_or_default();

        let month = month_number(month_abbrev).ok_or_else(|| {
            ReportError::ClassificationError(format!(
                "unrecognized month {:?} in subject {:?}",
                month_abbrev, self.subject
            ))
        })?;

        Ok(format!("{}-{}", month, year))
    }

    /// School name from the executive-summary pattern (capture group 2),
    /// used as the output filename for school reports
    pub fn executive_summary_prefix(&self, patterns: &SubjectPatterns) -> Option<String> {
        patterns
            .school_report
            .captures(&self.subject)
            .and_then(|c| c.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Printer-group name from the printer-group pattern (capture group 2,
    /// trimmed); informational only, does not affect output naming
    pub fn printer_group(&self, patterns: &SubjectPatterns) -> Option<String> {
        patterns
            .printer_group
            .captures(&self.subject)
            .and_then(|c| c.get(2))
            .map(|m| m.as_str().trim().to_string())
    }
}

/// Map a three-letter month abbreviation to its zero-padded calendar number
pub fn month_number(abbrev: &str) -> Option<&'static str> {
    match abbrev {
        "Jan" => Some("01"),
        "Feb" => Some("02"),
        "Mar" => Some("03"),
        "Apr" => Some("04"),
        "May" => Some("05"),
        "Jun" => Some("06"),
        "Jul" => Some("07"),
        "Aug" => Some("08"),
        "Sep" => Some("09"),
        "Oct" => Some("10"),
        "Nov" => Some("11"),
        "Dec" => Some("12"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternConfig;

    fn patterns() -> SubjectPatterns {
        SubjectPatterns::compile(&PatternConfig::default()).unwrap()
    }

    fn message(subject: &str) -> MessageDetail {
        MessageDetail {
            id: "m1".to_string(),
            subject: subject.to_string(),
            parts: Vec::new(),
        }
    }

    #[test]
    fn test_folder_name_from_report_date() {
        let msg = message("Automated report: Example Middle School Executive summary for Mar 4, 2024");
        assert_eq!(msg.folder_name(&patterns()).unwrap(), "03-2024");
    }

    #[test]
    fn test_folder_name_is_deterministic() {
        let msg = message("Printing summary Dec 1, 2023");
        let p = patterns();
        assert_eq!(msg.folder_name(&p).unwrap(), msg.folder_name(&p).unwrap());
        assert_eq!(msg.folder_name(&p).unwrap(), "12-2023");
    }

    #[test]
    fn test_folder_name_without_date_is_classification_error() {
        let msg = message("Automated report: no date here");
        match msg.folder_name(&patterns()) {
            Err(ReportError::ClassificationError(text)) => {
                assert!(text.contains("no report date"))
            }
            other => panic!("expected ClassificationError, got {:?}", other),
        }
    }

    #[test]
    fn test_executive_summary_prefix_present() {
        let msg = message("Automated report: Example Middle School Executive summary Mar 4, 2024");
        assert_eq!(
            msg.executive_summary_prefix(&patterns()),
            Some("Example Middle School".to_string())
        );
    }

    #[test]
    fn test_executive_summary_prefix_absent() {
        let msg = message("Automated report: Lab Printers - summary Mar 4, 2024");
        assert_eq!(msg.executive_summary_prefix(&patterns()), None);
    }

    #[test]
    fn test_printer_group_present() {
        let msg = message("Automated report: Lab Printers - summary Mar 4, 2024");
        assert_eq!(
            msg.printer_group(&patterns()),
            Some("Lab Printers".to_string())
        );
    }

    #[test]
    fn test_printer_group_absent() {
        let msg = message("Unrelated subject");
        assert_eq!(msg.printer_group(&patterns()), None);
    }

    #[test]
    fn test_attachment_filenames_preserve_order() {
        let msg = MessageDetail {
            id: "m1".to_string(),
            subject: "s".to_string(),
            parts: vec![
                PartInfo {
                    filename: String::new(),
                    part_id: "0".to_string(),
                    attachment_id: None,
                },
                PartInfo {
                    filename: "b.pdf".to_string(),
                    part_id: "1".to_string(),
                    attachment_id: Some("att-b".to_string()),
                },
                PartInfo {
                    filename: "a.csv".to_string(),
                    part_id: "2".to_string(),
                    attachment_id: Some("att-a".to_string()),
                },
            ],
        };

        assert_eq!(msg.attachment_filenames(), vec!["b.pdf", "a.csv"]);
    }

    #[test]
    fn test_month_number_table() {
        assert_eq!(month_number("Jan"), Some("01"));
        assert_eq!(month_number("Sep"), Some("09"));
        assert_eq!(month_number("Dec"), Some("12"));
        assert_eq!(month_number("Foo"), None);
        assert_eq!(month_number("jan"), None);
    }
}
