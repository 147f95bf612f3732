//! YAML-based IDL parser.
//!
//! Parsing happens in two layers. The YAML layer turns text into a `serde_yaml::Value`; a failure
//! there is a [`DocumentError`] fault. The IDL layer then walks the value tree, checking every
//! node against the IDL rules and collecting *all* violations into a [`ParserErrorCollection`]
//! rather than stopping at the first.
//!
//! ```yaml
//! global:
//!   cpp_namespace: "mongo::idl"
//! types:
//!   string:
//!     description: "A BSON UTF-8 string"
//!     cpp_type: "std::string"
//!     bson_serialization_type: string
//! structs:
//!   point:
//!     description: "A 2D point"
//!     fields:
//!       x: int
//!       y:
//!         type: int
//!         optional: true
//! ```

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::diagnostics::DocumentError;
use crate::errors::{ErrorCollection, ErrorId, ParserErrorCollection};
use crate::syntax::{
    Command, CommandNamespace, Enum, EnumType, EnumValue, Field, Global, IdlSpec, ParsedSpec,
    Struct, Type,
};

/// Anything that can turn a document into a [`ParsedSpec`].
///
/// A parser either returns a result (a spec or diagnosed errors) or raises a typed fault for
/// input it cannot read at all.
pub trait IdlParser {
    type Spec;
    type Errors: ErrorCollection;
    type Fault: std::error::Error + 'static;

    fn parse(
        &self,
        document: &str,
    ) -> Result<ParsedSpec<Self::Spec, Self::Errors>, Self::Fault>;
}

/// Configuration for [`YamlIdlParser`].
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Name reported in every diagnosed error line.
    pub file_name: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            file_name: "<memory>".to_string(),
        }
    }
}

/// The reference IDL parser.
#[derive(Debug, Clone, Default)]
pub struct YamlIdlParser {
    config: ParserConfig,
}

impl YamlIdlParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }
}

impl IdlParser for YamlIdlParser {
    type Spec = IdlSpec;
    type Errors = ParserErrorCollection;
    type Fault = DocumentError;

    fn parse(&self, document: &str) -> Result<ParsedSpec, DocumentError> {
        let file_name = self.config.file_name.as_str();
        let mut ctx = ParseContext::new(file_name);

        if document.trim().is_empty() {
            ctx.error(ErrorId::EmptyDocument, "", "document is empty");
            return Ok(ctx.finish(IdlSpec::default()));
        }

        let root: Value = serde_yaml::from_str(document)
            .map_err(|e| DocumentError::from_yaml(e, file_name, document))?;
        let spec = ctx.parse_root(&root);
        Ok(ctx.finish(spec))
    }
}

/// Parses `document` with the default configuration.
pub fn parse(document: &str) -> Result<ParsedSpec, DocumentError> {
    YamlIdlParser::default().parse(document)
}

// =============================================================================
// NODE RULES
// =============================================================================

const ROOT_NODES: &[&str] = &["global", "imports", "types", "structs", "enums", "commands"];
const GLOBAL_NODES: &[&str] = &["cpp_namespace", "cpp_includes"];
const TYPE_NODES: &[&str] = &[
    "description",
    "cpp_type",
    "bson_serialization_type",
    "serializer",
    "deserializer",
    "default",
];
const TYPE_REQUIRED: &[&str] = &["description", "cpp_type", "bson_serialization_type"];
const STRUCT_NODES: &[&str] = &["description", "strict", "fields"];
const STRUCT_REQUIRED: &[&str] = &["description", "fields"];
const FIELD_NODES: &[&str] = &["description", "cpp_name", "type", "optional", "ignore", "default"];
const FIELD_REQUIRED: &[&str] = &["type"];
const ENUM_NODES: &[&str] = &["description", "type", "values"];
const ENUM_REQUIRED: &[&str] = &["description", "type", "values"];
const COMMAND_NODES: &[&str] = &["description", "namespace", "strict", "fields"];
const COMMAND_REQUIRED: &[&str] = &["description", "namespace"];

static CPP_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"));
static CPP_NAMESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid namespace pattern")
});

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn node_kind(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "scalar",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Whether a `fields` node may be absent or empty.
#[derive(Clone, Copy)]
enum FieldsRule {
    /// `fields` must be present and non-empty.
    NonEmpty,
    /// `fields` may be absent or empty.
    Optional,
}

/// Per-document parse state: error sink and the symbol table.
struct ParseContext<'a> {
    file_name: &'a str,
    errors: ParserErrorCollection,
    /// Symbol name to the path where it was first defined.
    symbols: HashMap<String, String>,
}

impl<'a> ParseContext<'a> {
    fn new(file_name: &'a str) -> Self {
        Self {
            file_name,
            errors: ParserErrorCollection::new(),
            symbols: HashMap::new(),
        }
    }

    fn error(&mut self, id: ErrorId, path: &str, message: impl Into<String>) {
        self.errors.add(id, self.file_name, path, message);
    }

    fn finish(self, spec: IdlSpec) -> ParsedSpec {
        if self.errors.has_errors() {
            ParsedSpec::Failure(self.errors)
        } else {
            ParsedSpec::Success(spec)
        }
    }

    // --- node shape helpers ---------------------------------------------------

    fn expect_mapping<'v>(&mut self, node: &'v Value, path: &str) -> Option<&'v Mapping> {
        match node {
            Value::Mapping(map) => Some(map),
            other => {
                self.error(
                    ErrorId::NodeType,
                    path,
                    format!("expected a mapping, found a {}", node_kind(other)),
                );
                None
            }
        }
    }

    fn expect_scalar(&mut self, node: &Value, path: &str) -> Option<String> {
        match node {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => {
                self.error(
                    ErrorId::NodeType,
                    path,
                    format!("expected a scalar, found a {}", node_kind(other)),
                );
                None
            }
        }
    }

    fn expect_bool(&mut self, node: &Value, path: &str) -> bool {
        match node {
            Value::Bool(b) => *b,
            other => {
                self.error(
                    ErrorId::BadBool,
                    path,
                    format!("expected 'true' or 'false', found {}", describe(other)),
                );
                false
            }
        }
    }

    /// A scalar or a sequence of scalars.
    fn expect_scalar_list(&mut self, node: &Value, path: &str) -> Vec<String> {
        match node {
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| self.expect_scalar(item, &child(path, &i.to_string())))
                .collect(),
            other => self.expect_scalar(other, path).into_iter().collect(),
        }
    }

    /// Returns the entries of `map` whose keys are in `allowed`, reporting all others.
    fn entries<'v>(
        &mut self,
        map: &'v Mapping,
        path: &str,
        allowed: &[&str],
        unknown: ErrorId,
    ) -> Vec<(String, &'v Value)> {
        let mut out = Vec::with_capacity(map.len());
        for (key, value) in map {
            let Some(key) = self.expect_key(key, path) else {
                continue;
            };
            if allowed.contains(&key.as_str()) {
                out.push((key, value));
            } else {
                let key_path = child(path, &key);
                self.error(unknown, &key_path, format!("unknown node '{key}'"));
            }
        }
        out
    }

    /// Returns every entry of a name-keyed mapping such as `structs` or `fields`.
    fn named_entries<'v>(&mut self, map: &'v Mapping, path: &str) -> Vec<(String, &'v Value)> {
        map.iter()
            .filter_map(|(key, value)| self.expect_key(key, path).map(|k| (k, value)))
            .collect()
    }

    fn expect_key(&mut self, key: &Value, path: &str) -> Option<String> {
        match key {
            Value::String(s) => Some(s.clone()),
            other => {
                self.error(
                    ErrorId::NodeType,
                    path,
                    format!("expected a scalar key, found {}", describe(other)),
                );
                None
            }
        }
    }

    fn check_required(&mut self, entries: &[(String, &Value)], required: &[&str], path: &str) {
        let present: HashSet<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        for name in required {
            if !present.contains(name) {
                self.error(
                    ErrorId::MissingField,
                    path,
                    format!("missing required field '{name}'"),
                );
            }
        }
    }

    fn register_symbol(&mut self, name: &str, path: &str) {
        if let Some(first) = self.symbols.get(name) {
            let message = format!("'{name}' is already defined at '{first}'");
            self.error(ErrorId::DuplicateSymbol, path, message);
        } else {
            self.symbols.insert(name.to_string(), path.to_string());
        }
    }

    fn check_identifier(&mut self, value: &str, pattern: &Regex, path: &str, what: &str) {
        if !pattern.is_match(value) {
            self.error(
                ErrorId::BadIdentifier,
                path,
                format!("'{value}' is not a valid {what}"),
            );
        }
    }

    // --- document structure ---------------------------------------------------

    fn parse_root(&mut self, root: &Value) -> IdlSpec {
        let mut spec = IdlSpec::default();
        if root.is_null() {
            self.error(ErrorId::EmptyDocument, "", "document is empty");
            return spec;
        }
        let Some(map) = self.expect_mapping(root, "") else {
            return spec;
        };

        for (key, value) in self.entries(map, "", ROOT_NODES, ErrorId::UnknownRootNode) {
            match key.as_str() {
                "global" => spec.globals = self.parse_global(value, &key),
                "imports" => spec.imports = self.expect_scalar_list(value, &key),
                "types" => spec.types = self.parse_section(value, &key, Self::parse_type),
                "structs" => spec.structs = self.parse_section(value, &key, Self::parse_struct),
                "enums" => spec.enums = self.parse_section(value, &key, Self::parse_enum),
                "commands" => {
                    spec.commands = self.parse_section(value, &key, Self::parse_command)
                }
                _ => {}
            }
        }
        spec
    }

    fn parse_global(&mut self, node: &Value, path: &str) -> Option<Global> {
        let map = self.expect_mapping(node, path)?;
        let mut global = Global::default();
        for (key, value) in self.entries(map, path, GLOBAL_NODES, ErrorId::UnknownNode) {
            let key_path = child(path, &key);
            match key.as_str() {
                "cpp_namespace" => {
                    if let Some(ns) = self.expect_scalar(value, &key_path) {
                        self.check_identifier(&ns, &CPP_NAMESPACE, &key_path, "C++ namespace");
                        global.cpp_namespace = Some(ns);
                    }
                }
                "cpp_includes" => global.cpp_includes = self.expect_scalar_list(value, &key_path),
                _ => {}
            }
        }
        Some(global)
    }

    /// Parses a name-keyed section, registering each name as a symbol.
    fn parse_section<T>(
        &mut self,
        node: &Value,
        path: &str,
        item: fn(&mut Self, &str, &Value, &str) -> Option<T>,
    ) -> Vec<T> {
        let Some(map) = self.expect_mapping(node, path) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (name, value) in self.named_entries(map, path) {
            let item_path = child(path, &name);
            self.register_symbol(&name, &item_path);
            if let Some(parsed) = item(self, &name, value, &item_path) {
                out.push(parsed);
            }
        }
        out
    }

    fn parse_type(&mut self, name: &str, node: &Value, path: &str) -> Option<Type> {
        let map = self.expect_mapping(node, path)?;
        let entries = self.entries(map, path, TYPE_NODES, ErrorId::UnknownNode);
        self.check_required(&entries, TYPE_REQUIRED, path);

        let mut ty = Type {
            name: name.to_string(),
            ..Type::default()
        };
        for (key, value) in entries {
            let key_path = child(path, &key);
            match key.as_str() {
                "bson_serialization_type" => {
                    ty.bson_serialization_type = self.expect_scalar_list(value, &key_path)
                }
                _ => {
                    let Some(text) = self.expect_scalar(value, &key_path) else {
                        continue;
                    };
                    match key.as_str() {
                        "description" => ty.description = text,
                        "cpp_type" => ty.cpp_type = text,
                        "serializer" => ty.serializer = Some(text),
                        "deserializer" => ty.deserializer = Some(text),
                        "default" => ty.default = Some(text),
                        _ => {}
                    }
                }
            }
        }
        Some(ty)
    }

    fn parse_struct(&mut self, name: &str, node: &Value, path: &str) -> Option<Struct> {
        let map = self.expect_mapping(node, path)?;
        let entries = self.entries(map, path, STRUCT_NODES, ErrorId::UnknownNode);
        self.check_required(&entries, STRUCT_REQUIRED, path);

        let mut parsed = Struct {
            name: name.to_string(),
            ..Struct::default()
        };
        for (key, value) in entries {
            let key_path = child(path, &key);
            match key.as_str() {
                "description" => {
                    parsed.description = self.expect_scalar(value, &key_path).unwrap_or_default()
                }
                "strict" => parsed.strict = self.expect_bool(value, &key_path),
                "fields" => {
                    parsed.fields = self.parse_fields(value, &key_path, FieldsRule::NonEmpty)
                }
                _ => {}
            }
        }
        Some(parsed)
    }

    fn parse_command(&mut self, name: &str, node: &Value, path: &str) -> Option<Command> {
        let map = self.expect_mapping(node, path)?;
        let entries = self.entries(map, path, COMMAND_NODES, ErrorId::UnknownNode);
        self.check_required(&entries, COMMAND_REQUIRED, path);

        let mut description = String::new();
        let mut namespace = None;
        let mut strict = true;
        let mut fields = Vec::new();
        for (key, value) in entries {
            let key_path = child(path, &key);
            match key.as_str() {
                "description" => {
                    description = self.expect_scalar(value, &key_path).unwrap_or_default()
                }
                "namespace" => {
                    let Some(text) = self.expect_scalar(value, &key_path) else {
                        continue;
                    };
                    namespace = CommandNamespace::from_name(&text);
                    if namespace.is_none() {
                        self.error(
                            ErrorId::BadCommandNamespace,
                            &key_path,
                            format!(
                                "'{text}' is not one of 'concatenate_with_db', 'ignored', 'type'"
                            ),
                        );
                    }
                }
                "strict" => strict = self.expect_bool(value, &key_path),
                "fields" => fields = self.parse_fields(value, &key_path, FieldsRule::Optional),
                _ => {}
            }
        }
        Some(Command {
            name: name.to_string(),
            description,
            namespace: namespace?,
            strict,
            fields,
        })
    }

    fn parse_fields(&mut self, node: &Value, path: &str, rule: FieldsRule) -> Vec<Field> {
        let entries = match node {
            Value::Null => Vec::new(),
            other => match self.expect_mapping(other, path) {
                Some(map) => self.named_entries(map, path),
                None => return Vec::new(),
            },
        };
        if entries.is_empty() {
            if let FieldsRule::NonEmpty = rule {
                self.error(ErrorId::EmptyFields, path, "expected at least one field");
            }
            return Vec::new();
        }
        entries
            .into_iter()
            .filter_map(|(name, value)| {
                let field_path = child(path, &name);
                self.parse_field(&name, value, &field_path)
            })
            .collect()
    }

    fn parse_field(&mut self, name: &str, node: &Value, path: &str) -> Option<Field> {
        let mut field = Field {
            name: name.to_string(),
            ..Field::default()
        };
        // `name: type_name` shorthand
        if !node.is_mapping() {
            field.type_name = self.expect_scalar(node, path)?;
            return Some(field);
        }

        let map = self.expect_mapping(node, path)?;
        let entries = self.entries(map, path, FIELD_NODES, ErrorId::UnknownNode);
        self.check_required(&entries, FIELD_REQUIRED, path);
        for (key, value) in entries {
            let key_path = child(path, &key);
            match key.as_str() {
                "optional" => field.optional = self.expect_bool(value, &key_path),
                "ignore" => field.ignore = self.expect_bool(value, &key_path),
                _ => {
                    let Some(text) = self.expect_scalar(value, &key_path) else {
                        continue;
                    };
                    match key.as_str() {
                        "type" => field.type_name = text,
                        "description" => field.description = Some(text),
                        "default" => field.default = Some(text),
                        "cpp_name" => {
                            self.check_identifier(&text, &CPP_IDENTIFIER, &key_path, "C++ name");
                            field.cpp_name = Some(text);
                        }
                        _ => {}
                    }
                }
            }
        }
        Some(field)
    }

    fn parse_enum(&mut self, name: &str, node: &Value, path: &str) -> Option<Enum> {
        let map = self.expect_mapping(node, path)?;
        let entries = self.entries(map, path, ENUM_NODES, ErrorId::UnknownNode);
        self.check_required(&entries, ENUM_REQUIRED, path);

        let mut description = String::new();
        let mut type_name = None;
        let mut values_node = None;
        for (key, value) in entries {
            let key_path = child(path, &key);
            match key.as_str() {
                "description" => {
                    description = self.expect_scalar(value, &key_path).unwrap_or_default()
                }
                "type" => {
                    let Some(text) = self.expect_scalar(value, &key_path) else {
                        continue;
                    };
                    type_name = match text.as_str() {
                        "int" => Some(EnumType::Int),
                        "string" => Some(EnumType::String),
                        _ => {
                            self.error(
                                ErrorId::BadEnumType,
                                &key_path,
                                format!("enum type must be 'int' or 'string', found '{text}'"),
                            );
                            None
                        }
                    };
                }
                "values" => values_node = Some((value, key_path)),
                _ => {}
            }
        }

        // Values can only be checked once the enum's type is known.
        let values = match (&type_name, values_node) {
            (Some(ty), Some((node, values_path))) => self.parse_enum_values(ty, node, &values_path),
            _ => Vec::new(),
        };
        Some(Enum {
            name: name.to_string(),
            description,
            type_name: type_name?,
            values,
        })
    }

    fn parse_enum_values(&mut self, ty: &EnumType, node: &Value, path: &str) -> Vec<EnumValue> {
        let Some(map) = self.expect_mapping(node, path) else {
            return Vec::new();
        };
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut values = Vec::new();
        for (name, value) in self.named_entries(map, path) {
            let value_path = child(path, &name);
            let text = match (ty, value) {
                (EnumType::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
                (EnumType::String, Value::String(s)) => s.clone(),
                (_, other) => {
                    let expected = match ty {
                        EnumType::Int => "an integer",
                        EnumType::String => "a string",
                    };
                    self.error(
                        ErrorId::BadEnumValue,
                        &value_path,
                        format!("expected {expected}, found {}", describe(other)),
                    );
                    continue;
                }
            };
            if let Some(first) = seen.get(&text) {
                let message = format!("value '{text}' is already used by '{first}'");
                self.error(ErrorId::DuplicateEnumValue, &value_path, message);
                continue;
            }
            seen.insert(text.clone(), name.clone());
            values.push(EnumValue { name, value: text });
        }
        values
    }
}

fn describe(node: &Value) -> String {
    match node {
        Value::String(s) => format!("'{s}'"),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("a {}", node_kind(other)),
    }
}
