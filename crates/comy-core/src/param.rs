//! Command parameter model and strict coercion.
//!
//! Every value arrives from the wire as a string. Before a command body runs,
//! the raw map is decoded against the command's declared parameters into
//! tagged [`ParamValue`]s; bodies never see an undecoded value.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Primitive type tag of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Bool,
    Int,
    String,
}

impl ParamKind {
    /// Numeric code published to clients.
    pub fn type_code(self) -> u8 {
        match self {
            ParamKind::Bool => 0,
            ParamKind::Int => 1,
            ParamKind::String => 2,
        }
    }

    /// Only integer parameters may be promoted to a command's main parameter.
    pub fn is_main_eligible(self) -> bool {
        matches!(self, ParamKind::Int)
    }

    /// Decode a wire string into a value of this kind.
    pub fn coerce(self, raw: &str) -> Option<ParamValue> {
        match self {
            ParamKind::Bool => {
                if raw.eq_ignore_ascii_case("true") {
                    Some(ParamValue::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(ParamValue::Bool(false))
                } else {
                    None
                }
            }
            ParamKind::Int => raw.trim().parse::<i64>().ok().map(ParamValue::Int),
            ParamKind::String => Some(ParamValue::Str(raw.to_owned())),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamKind::Bool => "bool",
            ParamKind::Int => "int",
            ParamKind::String => "string",
        };
        f.write_str(s)
    }
}

/// A decoded parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Declared parameter of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    default_value: String,
    group_index: u32,
}

impl Parameter {
    pub fn bool(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, ParamKind::Bool, default.to_string())
    }

    pub fn int(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, ParamKind::Int, default.to_string())
    }

    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, default.into())
    }

    fn new(name: impl Into<String>, kind: ParamKind, default_value: String) -> Self {
        Self {
            name: name.into(),
            kind,
            default_value,
            group_index: 0,
        }
    }

    /// Display grouping hint for clients; lower means higher priority.
    pub fn with_group_index(mut self, group_index: u32) -> Self {
        self.group_index = group_index;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> ParamKind {
        self.kind
    }
    pub fn default_value(&self) -> &str {
        &self.default_value
    }
    pub fn group_index(&self) -> u32 {
        self.group_index
    }
    pub fn is_main_eligible(&self) -> bool {
        self.kind.is_main_eligible()
    }

    pub fn descriptor(&self) -> ParameterDescriptor {
        ParameterDescriptor {
            name: self.name.clone(),
            type_code: self.kind.type_code(),
            default_value: self.default_value.clone(),
            group_index: self.group_index,
        }
    }
}

/// Wire view of a declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,
    pub type_code: u8,
    pub default_value: String,
    pub group_index: u32,
}

/// Why a raw parameter map was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("unknown parameter: {0}")]
    Unknown(String),
    #[error("parameter {name} is not a valid {kind}")]
    TypeMismatch { name: String, kind: ParamKind },
}

impl ParamError {
    /// Status message reported to the client.
    pub fn status_message(&self) -> &'static str {
        match self {
            ParamError::Unknown(_) => "Parameter error",
            ParamError::TypeMismatch { .. } => "Parameter type error",
        }
    }
}

/// Parameters decoded against a command's schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, ParamValue>);

impl Params {
    /// Decode `raw` strictly against `schema`.
    ///
    /// Wire values must be JSON strings; anything else is a type mismatch
    /// for that parameter. An unknown key is reported before any type
    /// mismatch so the outcome does not depend on map iteration order.
    pub fn coerce<'a, I>(schema: I, raw: &HashMap<String, Value>) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = &'a Parameter>,
    {
        let kinds: HashMap<&str, ParamKind> = schema
            .into_iter()
            .map(|p| (p.name(), p.kind()))
            .collect();

        if let Some(unknown) = raw.keys().find(|k| !kinds.contains_key(k.as_str())) {
            return Err(ParamError::Unknown(unknown.clone()));
        }

        let mut out = HashMap::with_capacity(raw.len());
        for (name, value) in raw {
            let kind = kinds
                .get(name.as_str())
                .copied()
                .ok_or_else(|| ParamError::Unknown(name.clone()))?;
            let decoded = value
                .as_str()
                .and_then(|s| kind.coerce(s))
                .ok_or_else(|| ParamError::TypeMismatch {
                    name: name.clone(),
                    kind,
                })?;
            out.insert(name.clone(), decoded);
        }
        Ok(Self(out))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(ParamValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name) {
            Some(ParamValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ParamValue::Str(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
