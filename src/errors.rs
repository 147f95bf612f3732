//! Diagnosed IDL errors.
//!
//! Every error the parser diagnoses is identified by a stable string id (see [`ErrorId`]) so that
//! negative tests can assert on exactly which rule fired, independent of message wording.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use once_cell::sync::Lazy;
use thiserror::Error;

/// Read-only view of a set of diagnosed errors.
///
/// This is all the assertion harness needs from a parser's error output.
pub trait ErrorCollection {
    /// Number of diagnosed errors.
    fn count(&self) -> usize;

    /// Whether any diagnosed error carries `error_id`.
    fn contains(&self, error_id: &str) -> bool;

    /// One human-readable line per error, in diagnosis order.
    ///
    /// Each call yields a fresh iterator over the same lines.
    fn to_list(&self) -> Box<dyn Iterator<Item = String> + '_>;
}

/// The diagnostics the reference parser can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorId {
    UnknownRootNode,
    NodeType,
    UnknownNode,
    DuplicateSymbol,
    MissingField,
    EmptyFields,
    BadBool,
    BadIdentifier,
    BadEnumType,
    BadEnumValue,
    DuplicateEnumValue,
    BadCommandNamespace,
    EmptyDocument,
}

impl ErrorId {
    pub const ALL: [ErrorId; 13] = [
        ErrorId::UnknownRootNode,
        ErrorId::NodeType,
        ErrorId::UnknownNode,
        ErrorId::DuplicateSymbol,
        ErrorId::MissingField,
        ErrorId::EmptyFields,
        ErrorId::BadBool,
        ErrorId::BadIdentifier,
        ErrorId::BadEnumType,
        ErrorId::BadEnumValue,
        ErrorId::DuplicateEnumValue,
        ErrorId::BadCommandNamespace,
        ErrorId::EmptyDocument,
    ];

    /// The stable string id used in test assertions.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorId::UnknownRootNode => "unknown_root_node",
            ErrorId::NodeType => "node_type",
            ErrorId::UnknownNode => "unknown_node",
            ErrorId::DuplicateSymbol => "duplicate_symbol",
            ErrorId::MissingField => "missing_field",
            ErrorId::EmptyFields => "empty_fields",
            ErrorId::BadBool => "bad_bool",
            ErrorId::BadIdentifier => "bad_identifier",
            ErrorId::BadEnumType => "bad_enum_type",
            ErrorId::BadEnumValue => "bad_enum_value",
            ErrorId::DuplicateEnumValue => "duplicate_enum_value",
            ErrorId::BadCommandNamespace => "bad_command_namespace",
            ErrorId::EmptyDocument => "empty_document",
        }
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static ERROR_IDS: Lazy<HashMap<&'static str, ErrorId>> =
    Lazy::new(|| ErrorId::ALL.iter().map(|id| (id.as_str(), *id)).collect());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error id '{0}'")]
pub struct UnknownErrorId(pub String);

impl FromStr for ErrorId {
    type Err = UnknownErrorId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ERROR_IDS
            .get(s)
            .copied()
            .ok_or_else(|| UnknownErrorId(s.to_string()))
    }
}

/// A single diagnosed error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file_name}: {path}: {error_id}: {message}")]
pub struct ParserError {
    pub error_id: ErrorId,
    pub message: String,
    pub file_name: String,
    /// Dotted path of the offending node, e.g. `structs.foo.fields.bar`.
    pub path: String,
}

impl Diagnostic for ParserError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.error_id))
    }
}

/// Ordered collection of the errors diagnosed in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserErrorCollection {
    errors: Vec<ParserError>,
}

impl ParserErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        error_id: ErrorId,
        file_name: &str,
        path: &str,
        message: impl Into<String>,
    ) {
        self.errors.push(ParserError {
            error_id,
            message: message.into(),
            file_name: file_name.to_string(),
            path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParserError> {
        self.errors.iter()
    }
}

impl ErrorCollection for ParserErrorCollection {
    fn count(&self) -> usize {
        self.errors.len()
    }

    fn contains(&self, error_id: &str) -> bool {
        self.errors.iter().any(|e| e.error_id.as_str() == error_id)
    }

    fn to_list(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(self.errors.iter().map(ToString::to_string))
    }
}

impl fmt::Display for ParserErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.to_list().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(&line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_errors() -> ParserErrorCollection {
        let mut errors = ParserErrorCollection::new();
        errors.add(ErrorId::MissingField, "a.idl", "structs.foo", "missing 'fields'");
        errors.add(ErrorId::BadBool, "a.idl", "structs.foo.strict", "expected true or false");
        errors
    }

    #[test]
    fn test_error_ids_round_trip_through_lookup() {
        for id in ErrorId::ALL {
            assert_eq!(id.as_str().parse::<ErrorId>(), Ok(id));
        }
        assert_eq!(
            "no_such_id".parse::<ErrorId>(),
            Err(UnknownErrorId("no_such_id".to_string()))
        );
    }

    #[test]
    fn test_count_and_contains() {
        let errors = two_errors();
        assert_eq!(errors.count(), 2);
        assert!(errors.contains("missing_field"));
        assert!(errors.contains("bad_bool"));
        assert!(!errors.contains("unknown_node"));
    }

    #[test]
    fn test_to_list_is_restartable_and_ordered() {
        let errors = two_errors();
        let first: Vec<String> = errors.to_list().collect();
        let second: Vec<String> = errors.to_list().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0], "a.idl: structs.foo: missing_field: missing 'fields'");
        assert!(first.iter().all(|line| !line.is_empty()));
    }

    #[test]
    fn test_root_path_is_never_empty() {
        let mut errors = ParserErrorCollection::new();
        errors.add(ErrorId::EmptyDocument, "a.idl", "", "document is empty");
        assert_eq!(
            errors.to_string(),
            "a.idl: <root>: empty_document: document is empty"
        );
    }

    #[test]
    fn test_diagnostic_code_is_error_id() {
        let errors = two_errors();
        let first = errors.iter().next().expect("first error");
        let code = first.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("missing_field"));
    }

    #[test]
    fn test_display_joins_lines() {
        let rendered = two_errors().to_string();
        assert_eq!(rendered.lines().count(), 2);
    }
}
