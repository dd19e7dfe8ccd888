//! Validation issues reported by configuration and catalog checks.
//!
//! Checks collect every problem they find instead of stopping at the first,
//! so a loader can report the whole list at once. [`ensure_valid`] turns the
//! first error-severity issue into a [`HatcheryError::InvalidInput`].

use crate::error::{HatcheryError, Result};

/// A single validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl ValidationIssue {
    pub fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Push an error unless `value` is strictly positive and finite.
pub(crate) fn check_positive(
    issues: &mut Vec<ValidationIssue>,
    field: &'static str,
    owner: &str,
    value: f64,
) {
    if !(value.is_finite() && value > 0.0) {
        issues.push(ValidationIssue::error(
            field,
            format!("{owner}: {field} must be positive, got {value}"),
        ));
    }
}

/// Fail on the first error-severity issue. Warnings are logged and ignored.
pub fn ensure_valid(issues: &[ValidationIssue]) -> Result<()> {
    for issue in issues {
        if issue.severity == Severity::Warning {
            log::warn!("{}", issue.message);
        }
    }
    match issues.iter().find(|i| i.severity == Severity::Error) {
        Some(issue) => Err(HatcheryError::invalid(issue.field, issue.message.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_pass() {
        let issues = vec![ValidationIssue::warning("x", "odd but fine")];
        assert!(ensure_valid(&issues).is_ok());
    }

    #[test]
    fn test_first_error_wins() {
        let issues = vec![
            ValidationIssue::warning("a", "warn"),
            ValidationIssue::error("b", "first"),
            ValidationIssue::error("c", "second"),
        ];
        match ensure_valid(&issues) {
            Err(HatcheryError::InvalidInput { field, reason }) => {
                assert_eq!(field, "b");
                assert_eq!(reason, "first");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_check_positive() {
        let mut issues = Vec::new();
        check_positive(&mut issues, "weight", "Rex", 1.0);
        assert!(issues.is_empty());
        check_positive(&mut issues, "weight", "Rex", 0.0);
        check_positive(&mut issues, "weight", "Rex", f64::NAN);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("Rex"));
    }
}
