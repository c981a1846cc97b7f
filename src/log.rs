// src/log.rs

use std::fmt::Display;
use tracing::{error, info};

/// Maximum number of error lines kept verbatim
pub const MAX_ERROR_LINES: usize = 20;

/// Report-facing log of a mining pass.
///
/// Every line is mirrored to `tracing`; the collected lines are what build
/// summaries and automated checks read back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredLog {
    title: String,
    info_lines: Vec<String>,
    error_lines: Vec<String>,
    skipped_errors: usize,
}

impl FilteredLog {
    /// Creates a log whose first error line will be `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn log_info(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.info_lines.push(line);
    }

    pub fn log_error(&mut self, line: impl Into<String>) {
        let line = line.into();
        error!("{}", line);
        if self.error_lines.is_empty() && !self.title.is_empty() {
            self.error_lines.push(self.title.clone());
        }
        if self.error_lines.len() < MAX_ERROR_LINES {
            self.error_lines.push(line);
        } else {
            self.skipped_errors += 1;
        }
    }

    /// Logs `message` followed by every cause in the error chain.
    pub fn log_exception(&mut self, error: &(dyn std::error::Error + 'static), message: impl Display) {
        self.log_error(message.to_string());
        let mut source = Some(error);
        while let Some(cause) = source {
            self.log_error(cause.to_string());
            source = cause.source();
        }
    }

    /// Appends the lines of `other` without re-emitting them to `tracing`.
    pub fn merge(&mut self, other: FilteredLog) {
        self.info_lines.extend(other.info_lines);
        for line in other.error_lines {
            if self.error_lines.len() < MAX_ERROR_LINES {
                self.error_lines.push(line);
            } else {
                self.skipped_errors += 1;
            }
        }
        self.skipped_errors += other.skipped_errors;
    }

    pub fn info_messages(&self) -> &[String] {
        &self.info_lines
    }

    pub fn error_messages(&self) -> Vec<String> {
        let mut lines = self.error_lines.clone();
        if self.skipped_errors > 0 {
            lines.push(format!(
                "  ... skipped logging of {} additional errors ...",
                self.skipped_errors
            ));
        }
        lines
    }

    pub fn has_errors(&self) -> bool {
        !self.error_lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_capped() {
        let mut log = FilteredLog::new("Errors while mining:");
        for i in 0..25 {
            log.log_error(format!("error {}", i));
        }
        let errors = log.error_messages();
        assert_eq!(errors.len(), MAX_ERROR_LINES + 1);
        assert_eq!(errors[0], "Errors while mining:");
        assert_eq!(
            errors.last().map(String::as_str),
            Some("  ... skipped logging of 6 additional errors ...")
        );
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut log = FilteredLog::default();
        log.log_info("first");
        let mut other = FilteredLog::default();
        other.log_info("second");
        other.log_error("broken");
        log.merge(other);

        assert_eq!(log.info_messages(), ["first", "second"]);
        assert_eq!(log.error_messages(), vec!["broken".to_string()]);
    }

    #[test]
    fn test_exception_logs_the_chain() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "missing worktree");
        let mut log = FilteredLog::default();
        log.log_exception(&inner, "Mining failed");
        assert_eq!(log.error_messages(), vec!["Mining failed", "missing worktree"]);
        assert!(log.has_errors());
    }
}
