pub use crate::diagnostics::{DocumentError, Span};
pub use crate::errors::{ErrorCollection, ErrorId, ParserError, ParserErrorCollection};
pub use crate::parser::{parse, IdlParser, ParserConfig, YamlIdlParser};
pub use crate::syntax::{IdlSpec, ParsedSpec};

pub mod diagnostics;
pub mod errors;
pub mod parser;
pub mod syntax;
pub mod test_harness;
