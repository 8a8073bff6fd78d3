//! Import defects.
//!
//! Row and reference problems are collected instead of raised so that one
//! import run reports every problem of an archive at once.

use serde::Serialize;
use std::fmt;

/// Severity of a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DefectSeverity {
    /// Reported, does not block the import.
    Warning,
    /// Blocks the import.
    Error,
}

/// One problem found in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDefect {
    /// How serious the problem is.
    pub severity: DefectSeverity,
    /// Archive entry the problem was found in, empty for global problems.
    pub file: String,
    /// Line within the file, if known.
    pub line: Option<u64>,
    /// What is wrong.
    pub message: String,
}

impl fmt::Display for ImportDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.file.is_empty(), self.line) {
            (true, _) => write!(f, "{}", self.message),
            (false, Some(line)) => write!(f, "{}:{}: {}", self.file, line, self.message),
            (false, None) => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

/// Collects defects during one import.
#[derive(Debug, Clone, Default)]
pub struct DefectReporter {
    defects: Vec<ImportDefect>,
}

impl DefectReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a blocking defect.
    pub fn error(&mut self, file: &str, line: Option<u64>, message: impl Into<String>) {
        self.push(DefectSeverity::Error, file, line, message.into());
    }

    /// Records a non-blocking defect.
    pub fn warn(&mut self, file: &str, line: Option<u64>, message: impl Into<String>) {
        self.push(DefectSeverity::Warning, file, line, message.into());
    }

    /// Returns true if any blocking defect was recorded.
    pub fn has_errors(&self) -> bool {
        self.defects
            .iter()
            .any(|defect| defect.severity == DefectSeverity::Error)
    }

    /// Number of blocking defects.
    pub fn error_count(&self) -> usize {
        self.defects
            .iter()
            .filter(|defect| defect.severity == DefectSeverity::Error)
            .count()
    }

    /// Every recorded defect in report order.
    pub fn defects(&self) -> &[ImportDefect] {
        &self.defects
    }

    /// Consumes the reporter.
    pub fn into_defects(self) -> Vec<ImportDefect> {
        self.defects
    }

    fn push(&mut self, severity: DefectSeverity, file: &str, line: Option<u64>, message: String) {
        self.defects.push(ImportDefect {
            severity,
            file: file.to_string(),
            line,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_block() {
        let mut reporter = DefectReporter::new();
        reporter.warn("", None, "Concept 100005 is missing");
        assert!(!reporter.has_errors());

        reporter.error("sct2_Concept_Delta_INT_20200131.txt", Some(3), "Invalid active flag '2'");
        assert!(reporter.has_errors());
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.defects().len(), 2);
    }

    #[test]
    fn test_defect_display() {
        let mut reporter = DefectReporter::new();
        reporter.error("sct2_Concept_Delta_INT_20200131.txt", Some(3), "Invalid active flag '2'");
        reporter.warn("", None, "Concept 100005 is missing");
        let rendered: Vec<String> = reporter.defects().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "sct2_Concept_Delta_INT_20200131.txt:3: Invalid active flag '2'",
                "Concept 100005 is missing",
            ]
        );
    }
}
