//! IDL document model and the result of one parse attempt.

use crate::errors::{ErrorCollection, ParserErrorCollection};

/// Outcome of parsing one document: a specification or the diagnosed errors, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSpec<S = IdlSpec, E = ParserErrorCollection> {
    Success(S),
    Failure(E),
}

impl<S, E: ErrorCollection> ParsedSpec<S, E> {
    pub fn spec(&self) -> Option<&S> {
        match self {
            ParsedSpec::Success(spec) => Some(spec),
            ParsedSpec::Failure(_) => None,
        }
    }

    pub fn errors(&self) -> Option<&E> {
        match self {
            ParsedSpec::Success(_) => None,
            ParsedSpec::Failure(errors) => Some(errors),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParsedSpec::Success(_))
    }

    pub fn into_result(self) -> Result<S, E> {
        match self {
            ParsedSpec::Success(spec) => Ok(spec),
            ParsedSpec::Failure(errors) => Err(errors),
        }
    }
}

/// A parsed IDL document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdlSpec {
    pub globals: Option<Global>,
    /// Import paths in document order. They are recorded, not resolved.
    pub imports: Vec<String>,
    pub types: Vec<Type>,
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
    pub commands: Vec<Command>,
}

impl IdlSpec {
    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn find_type(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Global {
    pub cpp_namespace: Option<String>,
    pub cpp_includes: Vec<String>,
}

/// A scalar type mapping between BSON and C++.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Type {
    pub name: String,
    pub description: String,
    pub cpp_type: String,
    pub bson_serialization_type: Vec<String>,
    pub serializer: Option<String>,
    pub deserializer: Option<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    pub name: String,
    pub description: String,
    pub strict: bool,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub cpp_name: Option<String>,
    pub type_name: String,
    pub optional: bool,
    pub ignore: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumType {
    Int,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: String,
    pub description: String,
    pub type_name: EnumType,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub value: String,
}

/// How a command's first element names its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandNamespace {
    ConcatenateWithDb,
    Ignored,
    Type,
}

impl CommandNamespace {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "concatenate_with_db" => Some(CommandNamespace::ConcatenateWithDb),
            "ignored" => Some(CommandNamespace::Ignored),
            "type" => Some(CommandNamespace::Type),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub namespace: CommandNamespace,
    pub strict: bool,
    pub fields: Vec<Field>,
}
