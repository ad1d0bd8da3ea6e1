//! Diagnostic records
//!
//! Flat records {stage, severity, line, column, message, code} collected by
//! the compilation stages, with terminal rendering through codespan and a
//! JSON form for editor integration.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity as CsSeverity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use termcolor::Buffer;

use super::error::CheckError;
use crate::syntax::Position;

/// Compilation stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Semantic,
    Optimization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub severity: Severity,
    /// 1-based line, when the node carried a position
    pub line: Option<u32>,
    /// 1-based column, when the node carried a position
    pub column: Option<u32>,
    pub message: String,
    /// Error code (e.g., "E1001")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl Diagnostic {
    pub fn new(
        stage: Stage,
        severity: Severity,
        position: Option<Position>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            severity,
            line: position.map(|p| p.line),
            column: position.map(|p| p.column),
            message: message.into(),
            code: None,
        }
    }

    /// Create a warning diagnostic
    pub fn warning(stage: Stage, position: Option<Position>, message: impl Into<String>) -> Self {
        Self::new(stage, Severity::Warning, position, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render against the source text the tree was parsed from
    pub fn render(&self, name: &str, source: &str) -> String {
        let mut files = SimpleFiles::new();
        let file_id = files.add(name.to_string(), source.to_string());

        let severity = match self.severity {
            Severity::Error => CsSeverity::Error,
            Severity::Warning => CsSeverity::Warning,
        };
        let mut diagnostic = CsDiagnostic::new(severity).with_message(self.message.clone());
        if let Some(code) = self.code {
            diagnostic = diagnostic.with_code(code);
        }
        if let Some(range) = self.byte_range(source) {
            diagnostic = diagnostic.with_labels(vec![Label::primary(file_id, range)]);
        }

        let mut buffer = Buffer::no_color();
        let config = term::Config::default();
        match term::emit(&mut buffer, &config, &files, &diagnostic) {
            Ok(()) => String::from_utf8_lossy(buffer.as_slice()).into_owned(),
            Err(_) => self.to_string(),
        }
    }

    /// Convert to JSON representation for IDE integration
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Byte range of the token starting at this diagnostic's position
    fn byte_range(&self, source: &str) -> Option<Range<usize>> {
        let line = self.line? as usize;
        let column = self.column.unwrap_or(1).max(1) as usize;

        let mut offset = 0;
        for (index, text) in source.split_inclusive('\n').enumerate() {
            if index + 1 == line {
                let content = text.trim_end_matches(['\n', '\r']);
                let start = offset + (column - 1).min(content.len());
                let token = source
                    .get(start..offset + content.len())?
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .map(char::len_utf8)
                    .sum::<usize>()
                    .max(1);
                let end = (start + token).min(source.len());
                return Some(start..end.max(start));
            }
            offset += text.len();
        }
        None
    }
}

impl From<&CheckError> for Diagnostic {
    fn from(error: &CheckError) -> Self {
        Diagnostic::new(
            Stage::Semantic,
            Severity::Error,
            error.position(),
            error.to_string(),
        )
        .with_code(error.code())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}", severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, " at {}:{}", line, column)?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Type;

    fn sample() -> Diagnostic {
        Diagnostic::from(&CheckError::UndeclaredVariable {
            name: "count".to_string(),
            position: Some(Position::new(2, 13)),
        })
    }

    #[test]
    fn test_from_check_error() {
        let diag = sample();
        assert_eq!(diag.stage, Stage::Semantic);
        assert!(diag.is_error());
        assert_eq!(diag.line, Some(2));
        assert_eq!(diag.column, Some(13));
        assert_eq!(diag.code, Some("E1010"));
        assert_eq!(diag.to_string(), "error[E1010] at 2:13: Variable count is undeclared");
    }

    #[test]
    fn test_render_points_at_token() {
        let source = "class A {\n    int x = count;\n}\n";
        let rendered = sample().render("A.jmm", source);
        assert!(rendered.contains("error[E1010]"));
        assert!(rendered.contains("Variable count is undeclared"));
        assert!(rendered.contains("A.jmm:2:13"));
    }

    #[test]
    fn test_render_without_position() {
        let diag = Diagnostic::from(&CheckError::MissingReturn {
            method: "f".to_string(),
            expected: Type::int(),
            position: None,
        });
        let rendered = diag.render("A.jmm", "");
        assert!(rendered.contains("Method f of type int has no return statement"));
    }

    #[test]
    fn test_to_json() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stage"], "semantic");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["line"], 2);
        assert_eq!(value["code"], "E1010");
    }
}
