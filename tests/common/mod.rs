//! Shared helpers for the integration tests.
#![allow(dead_code)]

use idlspec::test_harness::{HarnessConfig, ParseHarness};
use idlspec::{ErrorCollection, IdlParser, ParsedSpec, YamlIdlParser};

/// A harness over the reference parser that never colors its messages.
pub fn harness() -> ParseHarness {
    ParseHarness::with_config(YamlIdlParser::default(), HarnessConfig::plain())
}

/// Error ids standing in for a parser's diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdList(pub Vec<&'static str>);

impl ErrorCollection for IdList {
    fn count(&self) -> usize {
        self.0.len()
    }

    fn contains(&self, error_id: &str) -> bool {
        self.0.iter().any(|id| *id == error_id)
    }

    fn to_list(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(self.0.iter().map(|id| format!("scripted: {id}")))
    }
}

/// A parser that returns the same outcome for every document.
pub enum ScriptedParser {
    Spec,
    Errors(Vec<&'static str>),
    Fault(&'static str),
}

impl IdlParser for ScriptedParser {
    type Spec = ();
    type Errors = IdList;
    type Fault = std::io::Error;

    fn parse(&self, _document: &str) -> Result<ParsedSpec<(), IdList>, std::io::Error> {
        match self {
            ScriptedParser::Spec => Ok(ParsedSpec::Success(())),
            ScriptedParser::Errors(ids) => Ok(ParsedSpec::Failure(IdList(ids.clone()))),
            ScriptedParser::Fault(msg) => {
                Err(std::io::Error::new(std::io::ErrorKind::Other, *msg))
            }
        }
    }
}

pub fn scripted(parser: ScriptedParser) -> ParseHarness<ScriptedParser> {
    ParseHarness::with_config(parser, HarnessConfig::plain())
}

pub const VALID_DOCUMENT: &str = r#"
global:
  cpp_namespace: "mongo::idl"
  cpp_includes:
    - "mongo/base/string_data.h"
imports:
  - "mongo/idl/basic_types.idl"
types:
  string:
    description: "A BSON UTF-8 string"
    cpp_type: "std::string"
    bson_serialization_type: string
    deserializer: "mongo::BSONElement::str"
  safeInt:
    description: "Accepts any numerical type"
    cpp_type: "std::int32_t"
    bson_serialization_type:
      - int
      - long
structs:
  point:
    description: "A geographic point"
    strict: true
    fields:
      lat: int
      lon:
        type: int
        optional: true
        cpp_name: longitude
        default: 0
      label:
        type: string
        ignore: true
enums:
  Color:
    description: "Colors"
    type: int
    values:
      red: 0
      green: 1
  Mode:
    description: "Modes"
    type: string
    values:
      fast: "fast"
      slow: "slow"
commands:
  find:
    description: "find command"
    namespace: concatenate_with_db
    strict: false
    fields:
      filter: object
  ping:
    description: "ping command"
    namespace: ignored
"#;

/// A struct whose name appears twice; the YAML layer rejects it.
pub const DUPLICATE_KEY_DOCUMENT: &str = r#"
structs:
  point:
    description: first
    fields:
      lat: int
  point:
    description: second
    fields:
      lat: int
"#;

/// A struct with exactly one fault: no `description`.
pub const MISSING_FIELD_DOCUMENT: &str = r#"
structs:
  point:
    fields:
      lat: int
"#;

/// A struct with two faults: no `description` and a non-boolean `strict`.
pub const TWO_FAULT_DOCUMENT: &str = r#"
structs:
  point:
    strict: maybe
    fields:
      lat: int
"#;
