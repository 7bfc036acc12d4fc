//! Diagnostic records handed back to the host's reporting pipeline.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  /// A lint finding.
  Error,
  /// Guidance about a documented limitation.
  Warning,
  /// An invariant violation that aborted analysis of the program.
  Internal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
  pub message: String,
  pub line: usize,
  pub severity: Severity,
}

impl Diagnostic {
  pub fn error(message: impl Into<String>, line: usize) -> Self {
    Diagnostic { message: message.into(), line, severity: Severity::Error }
  }

  pub fn warning(message: impl Into<String>, line: usize) -> Self {
    Diagnostic { message: message.into(), line, severity: Severity::Warning }
  }

  pub fn internal(message: impl Into<String>, line: usize) -> Self {
    Diagnostic { message: message.into(), line, severity: Severity::Internal }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn serializes_with_lowercase_severity() {
    let diagnostic = Diagnostic::error("Missing @throws RuntimeException annotation", 4);
    let json = serde_json::to_value(&diagnostic).expect("serializable");
    assert_eq!(
      json,
      serde_json::json!({
        "message": "Missing @throws RuntimeException annotation",
        "line": 4,
        "severity": "error",
      })
    );
  }
}
