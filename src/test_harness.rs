//! Parse assertions for IDL test suites.
//!
//! [`ParseHarness`] drives an [`IdlParser`] with a raw document and turns the outcome into a
//! pass/fail signal for the test that called it. There are two flavours of every assertion:
//!
//! - `check_*` methods return `Result<_, HarnessFailure>` so callers can inspect what went wrong.
//! - `assert_*` methods (and [`ParseHarness::parse_or_fail`]) panic with the rendered failure,
//!   which is how a Rust test reports failure.
//!
//! A failure message always carries the input document verbatim and the dump of the actual
//! errors, so a failing test can be reproduced without re-running the parser by hand.
//!
//! # Example
//!
//! ```rust
//! use idlspec::test_harness::ParseHarness;
//!
//! let harness: ParseHarness = ParseHarness::default();
//! harness.assert_parse_succeeds(
//!     "structs:\n  point:\n    description: a point\n    fields:\n      x: int\n",
//! );
//! harness.assert_parse_fails("structs:\n  point:\n    fields:\n      x: int\n", "missing_field");
//! ```

pub mod suite;

use thiserror::Error;

use crate::errors::ErrorCollection;
use crate::parser::{IdlParser, YamlIdlParser};
use crate::syntax::{IdlSpec, ParsedSpec};

/// Placeholder dump for a parse outcome that has no error collection.
pub const EMPTY_ERRORS: &str = "<empty>";

/// Dumps an error collection as newline-joined lines, or `<empty>` when there is none.
pub fn errors_to_str<E: ErrorCollection>(errors: Option<&E>) -> String {
    match errors {
        Some(errors) => errors.to_list().collect::<Vec<_>>().join("\n"),
        None => EMPTY_ERRORS.to_string(),
    }
}

// =============================================================================
// FAILURES
// =============================================================================

/// Broad classification of a [`HarnessFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The parser raised a fault instead of returning a result.
    ParserFault,
    /// The parse went the wrong direction: errors where a spec was expected, or the reverse.
    InvariantViolation,
    /// A single diagnosed error was expected but a different number was found.
    CountViolation,
    /// The expected error id is not among the diagnosed errors.
    IdentityViolation,
}

/// A failed parse assertion, carrying everything needed to reproduce it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessFailure {
    #[error("Failed to parse document:\n{document}\nCaused by: {cause}")]
    ParserFault { document: String, cause: String },

    #[error("Expected no parser errors\nFor document:\n{document}\nReceived errors:\n\n{errors}")]
    UnexpectedErrors { document: String, errors: String },

    #[error(
        "Expected no parsed doc\nFor document:\n{document}\nExpected error message '{expected_error_id}' but received errors:\n\n{errors}"
    )]
    UnexpectedSpec {
        document: String,
        expected_error_id: String,
        errors: String,
    },

    #[error(
        "For document:\n{document}\nExpected only error message '{expected_error_id}' but received {count} errors:\n\n{errors}"
    )]
    ErrorCount {
        document: String,
        expected_error_id: String,
        count: usize,
        errors: String,
    },

    #[error(
        "For document:\n{document}\nExpected error message '{expected_error_id}' but received only errors:\n {errors}"
    )]
    MissingErrorId {
        document: String,
        expected_error_id: String,
        errors: String,
    },
}

impl HarnessFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            HarnessFailure::ParserFault { .. } => FailureKind::ParserFault,
            HarnessFailure::UnexpectedErrors { .. } | HarnessFailure::UnexpectedSpec { .. } => {
                FailureKind::InvariantViolation
            }
            HarnessFailure::ErrorCount { .. } => FailureKind::CountViolation,
            HarnessFailure::MissingErrorId { .. } => FailureKind::IdentityViolation,
        }
    }

    /// The input document, verbatim.
    pub fn document(&self) -> &str {
        match self {
            HarnessFailure::ParserFault { document, .. }
            | HarnessFailure::UnexpectedErrors { document, .. }
            | HarnessFailure::UnexpectedSpec { document, .. }
            | HarnessFailure::ErrorCount { document, .. }
            | HarnessFailure::MissingErrorId { document, .. } => document,
        }
    }

    /// The dump of the actual errors; `None` for parser faults.
    pub fn errors(&self) -> Option<&str> {
        match self {
            HarnessFailure::ParserFault { .. } => None,
            HarnessFailure::UnexpectedErrors { errors, .. }
            | HarnessFailure::UnexpectedSpec { errors, .. }
            | HarnessFailure::ErrorCount { errors, .. }
            | HarnessFailure::MissingErrorId { errors, .. } => Some(errors),
        }
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";

/// Presentation settings for failure messages.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub use_colors: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
        }
    }
}

impl HarnessConfig {
    /// A configuration that never emits ANSI escapes.
    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    /// Apply color formatting to text if colors are enabled.
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }

    /// Renders a failure for a panic message; only the headline is colored.
    pub fn render(&self, failure: &HarnessFailure) -> String {
        let text = failure.to_string();
        match text.split_once('\n') {
            Some((headline, rest)) => format!("{}\n{}", self.colorize(headline, RED), rest),
            None => self.colorize(&text, RED),
        }
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// Parse assertions over a particular parser.
#[derive(Debug, Clone)]
pub struct ParseHarness<P = YamlIdlParser> {
    parser: P,
    config: HarnessConfig,
}

impl Default for ParseHarness<YamlIdlParser> {
    fn default() -> Self {
        Self::new(YamlIdlParser::default())
    }
}

/// The parse outcome type produced by parser `P`.
pub type Parsed<P> = ParsedSpec<<P as IdlParser>::Spec, <P as IdlParser>::Errors>;

impl<P: IdlParser> ParseHarness<P> {
    pub fn new(parser: P) -> Self {
        Self::with_config(parser, HarnessConfig::default())
    }

    pub fn with_config(parser: P, config: HarnessConfig) -> Self {
        Self { parser, config }
    }

    /// Runs the parser, turning a fault into [`HarnessFailure::ParserFault`].
    pub fn check_parse(&self, document: &str) -> Result<Parsed<P>, HarnessFailure> {
        self.parser
            .parse(document)
            .map_err(|fault| HarnessFailure::ParserFault {
                document: document.to_string(),
                cause: fault.to_string(),
            })
    }

    /// Checks that `document` parses to a specification with no errors.
    pub fn check_parse_succeeds(&self, document: &str) -> Result<P::Spec, HarnessFailure> {
        match self.check_parse(document)? {
            ParsedSpec::Success(spec) => Ok(spec),
            ParsedSpec::Failure(errors) => Err(HarnessFailure::UnexpectedErrors {
                document: document.to_string(),
                errors: errors_to_str(Some(&errors)),
            }),
        }
    }

    /// Checks that `document` fails to parse and that `expected_error_id` was diagnosed.
    ///
    /// Unless `allow_multiple` is set, exactly one error must be diagnosed; this is checked
    /// before, and independently of, the presence of `expected_error_id`.
    pub fn check_parse_fails(
        &self,
        document: &str,
        expected_error_id: &str,
        allow_multiple: bool,
    ) -> Result<P::Errors, HarnessFailure> {
        let errors = match self.check_parse(document)? {
            ParsedSpec::Failure(errors) => errors,
            ParsedSpec::Success(_) => {
                return Err(HarnessFailure::UnexpectedSpec {
                    document: document.to_string(),
                    expected_error_id: expected_error_id.to_string(),
                    errors: errors_to_str::<P::Errors>(None),
                })
            }
        };

        let count = errors.count();
        if !allow_multiple && count != 1 {
            return Err(HarnessFailure::ErrorCount {
                document: document.to_string(),
                expected_error_id: expected_error_id.to_string(),
                count,
                errors: errors_to_str(Some(&errors)),
            });
        }

        if !errors.contains(expected_error_id) {
            return Err(HarnessFailure::MissingErrorId {
                document: document.to_string(),
                expected_error_id: expected_error_id.to_string(),
                errors: errors_to_str(Some(&errors)),
            });
        }
        Ok(errors)
    }

    /// Parses `document`, failing the test if the parser raises a fault.
    #[track_caller]
    pub fn parse_or_fail(&self, document: &str) -> Parsed<P> {
        match self.check_parse(document) {
            Ok(parsed) => parsed,
            Err(failure) => self.fail(failure),
        }
    }

    /// Asserts `document` parses cleanly and returns the parsed specification.
    #[track_caller]
    pub fn assert_parse_succeeds(&self, document: &str) -> P::Spec {
        match self.check_parse_succeeds(document) {
            Ok(spec) => spec,
            Err(failure) => self.fail(failure),
        }
    }

    /// Asserts `document` fails with exactly one error, `expected_error_id`.
    #[track_caller]
    pub fn assert_parse_fails(&self, document: &str, expected_error_id: &str) {
        if let Err(failure) = self.check_parse_fails(document, expected_error_id, false) {
            self.fail(failure);
        }
    }

    /// Asserts `document` fails and `expected_error_id` is among possibly several errors.
    #[track_caller]
    pub fn assert_parse_fails_multiple(&self, document: &str, expected_error_id: &str) {
        if let Err(failure) = self.check_parse_fails(document, expected_error_id, true) {
            self.fail(failure);
        }
    }

    #[track_caller]
    fn fail(&self, failure: HarnessFailure) -> ! {
        panic!("{}", self.config.render(&failure))
    }
}

/// Asserts `document` parses cleanly with the default parser.
#[track_caller]
pub fn assert_parse(document: &str) -> IdlSpec {
    ParseHarness::<YamlIdlParser>::default().assert_parse_succeeds(document)
}

/// Asserts `document` fails to parse with the default parser.
#[track_caller]
pub fn assert_parse_fail(document: &str, error_id: &str, multiple: bool) {
    let harness: ParseHarness = ParseHarness::default();
    if multiple {
        harness.assert_parse_fails_multiple(document, error_id);
    } else {
        harness.assert_parse_fails(document, error_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorId, ParserErrorCollection};

    fn failure() -> HarnessFailure {
        HarnessFailure::MissingErrorId {
            document: "a: 1".to_string(),
            expected_error_id: "missing_field".to_string(),
            errors: "x.idl: a: unknown_root_node: unknown node 'a'".to_string(),
        }
    }

    #[test]
    fn test_errors_to_str_absent_collection() {
        assert_eq!(errors_to_str::<ParserErrorCollection>(None), "<empty>");
    }

    #[test]
    fn test_errors_to_str_one_line_per_error() {
        let mut errors = ParserErrorCollection::new();
        errors.add(ErrorId::UnknownRootNode, "x.idl", "a", "unknown node 'a'");
        errors.add(ErrorId::UnknownRootNode, "x.idl", "b", "unknown node 'b'");
        let dump = errors_to_str(Some(&errors));
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.lines().all(|line| !line.is_empty()));
    }

    #[test]
    fn test_plain_render_is_display() {
        let failure = failure();
        assert_eq!(HarnessConfig::plain().render(&failure), failure.to_string());
    }

    #[test]
    fn test_colored_render_wraps_headline_only() {
        let config = HarnessConfig { use_colors: true };
        let rendered = config.render(&failure());
        assert!(rendered.starts_with("\x1b[31mFor document:\x1b[0m\n"));
        assert!(rendered.contains("\na: 1\n"));
    }

    #[test]
    fn test_failure_accessors() {
        let failure = failure();
        assert_eq!(failure.kind(), FailureKind::IdentityViolation);
        assert_eq!(failure.document(), "a: 1");
        assert!(failure.errors().is_some_and(|e| e.contains("unknown_root_node")));

        let fault = HarnessFailure::ParserFault {
            document: "a: [".to_string(),
            cause: "eof".to_string(),
        };
        assert_eq!(fault.kind(), FailureKind::ParserFault);
        assert_eq!(fault.errors(), None);
    }
}
