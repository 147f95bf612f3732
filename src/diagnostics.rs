//! Fault reporting for documents that never reach the IDL layer.
//!
//! A document that is not well-formed YAML cannot produce a [`ParsedSpec`](crate::syntax::ParsedSpec)
//! at all, so the parser reports it as a [`DocumentError`] instead of a diagnosed IDL error.
//! Faults carry the offending source and, when the YAML layer knows it, the byte span of the
//! problem so that `miette` can render a labelled snippet.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

pub type SourceArc = Arc<NamedSource<String>>;

/// Byte range into a source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    fn len(&self) -> usize {
        if self.end > self.start {
            self.end - self.start
        } else {
            1
        }
    }
}

/// Source, span and help attached to a fault.
#[derive(Debug, Default)]
pub struct ErrorContext {
    pub source: Option<SourceArc>,
    pub span: Option<Span>,
    pub help: Option<String>,
    /// 1-based line and column, when known.
    pub location: Option<(usize, usize)>,
}

impl ErrorContext {
    /// Creates a context with only a source.
    pub fn with_source(source: SourceArc) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }
}

/// A runtime fault raised while reading a document, before any IDL checks run.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Malformed document: {message}")]
    Malformed {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: serde_yaml::Error,
    },
}

impl DocumentError {
    /// Wraps a YAML-layer error, capturing the document and the failing position.
    pub fn from_yaml(err: serde_yaml::Error, file_name: &str, document: &str) -> Self {
        let mut ctx = ErrorContext::with_source(to_error_source(file_name, document));
        if let Some(loc) = err.location() {
            // The YAML layer reports end-of-input errors one past the last byte.
            let start = loc.index().min(document.len().saturating_sub(1));
            ctx.span = Some(Span::new(start, (start + 1).min(document.len())));
            ctx.location = Some((loc.line(), loc.column()));
        }
        ctx.help = Some("the document must be well-formed YAML before IDL rules apply".to_string());
        DocumentError::Malformed {
            message: err.to_string(),
            ctx,
            source: err,
        }
    }

    fn get_ctx(&self) -> &ErrorContext {
        match self {
            DocumentError::Malformed { ctx, .. } => ctx,
        }
    }

    /// 1-based line and column of the fault, if the YAML layer reported one.
    pub fn location(&self) -> Option<(usize, usize)> {
        self.get_ctx().location
    }
}

impl Diagnostic for DocumentError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new("idl::malformed_document"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.get_ctx()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.get_ctx().span?;
        let DocumentError::Malformed { message, .. } = self;
        let label = LabeledSpan::new(Some(message.clone()), span.start, span.len());
        Some(Box::new(std::iter::once(label)))
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source<S: AsRef<str>>(name: &str, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}
