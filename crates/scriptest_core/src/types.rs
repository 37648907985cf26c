//! Declared parameter/output type vocabulary.
//!
//! This registry covers the type names a test case may declare for each parameter and for its expected output, along
//! with their accepted aliases.
//!
//! ## Notes
//! - The canonical spelling is the one the interpreter harness understands (`int`, `dict`, `NoneType`, …) and is what
//!   gets written to the request artifact.
//! - Aliases exist for user ergonomics (`integer`, `mapping`, `none`, …). Lookup via [`ParamType::from_name`] is
//!   **case-sensitive** for canonical names and aliases alike.
//!
//! ## Examples
//! ```rust
//! use scriptest_core::ParamType;
//!
//! assert_eq!(ParamType::from_name("int"), Some(ParamType::Int));
//! assert_eq!(ParamType::from_name("integer"), Some(ParamType::Int));
//! assert_eq!(ParamType::None.as_str(), "NoneType");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::SpecError;

/// Declared type of a parameter or expected output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    #[default]
    Any,
    Int,
    Float,
    Str,
    List,
    Dict,
    Tuple,
    Bool,
    Set,
    None,
    Bytes,
    Error,
}

/// Metadata for a declared type.
#[derive(Debug, Clone, Copy)]
pub struct ParamTypeInfo {
    pub id: ParamType,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

/// Registry of declared types, in the order a picker should present them.
pub const PARAM_TYPES: &[ParamTypeInfo] = &[
    info(ParamType::Any, "any", &[]),
    info(ParamType::Int, "int", &["integer"]),
    info(ParamType::Float, "float", &["double"]),
    info(ParamType::Str, "str", &["string", "text"]),
    info(ParamType::List, "list", &["sequence"]),
    info(ParamType::Dict, "dict", &["mapping", "map"]),
    info(ParamType::Tuple, "tuple", &["fixed-tuple"]),
    info(ParamType::Bool, "bool", &["boolean"]),
    info(ParamType::Set, "set", &[]),
    info(ParamType::None, "NoneType", &["none", "None", "null"]),
    info(ParamType::Bytes, "bytes", &[]),
    info(ParamType::Error, "error", &["exception"]),
];

const fn info(id: ParamType, canonical: &'static str, aliases: &'static [&'static str]) -> ParamTypeInfo {
    ParamTypeInfo { id, canonical, aliases }
}

impl ParamType {
    /// Resolve a type name (canonical or alias) to a [`ParamType`].
    ///
    /// ## Returns
    /// - `Some(ParamType)` if the spelling matches the registry, `None` otherwise.
    pub fn from_name(name: &str) -> Option<Self> {
        PARAM_TYPES
            .iter()
            .find(|t| t.canonical == name || t.aliases.contains(&name))
            .map(|t| t.id)
    }

    /// Canonical (wire) spelling.
    pub fn as_str(self) -> &'static str {
        self.info().canonical
    }

    /// Registry metadata for this type.
    pub fn info(self) -> &'static ParamTypeInfo {
        // Every variant has exactly one registry row; the fallback is unreachable by construction.
        PARAM_TYPES.iter().find(|t| t.id == self).unwrap_or(&PARAM_TYPES[0])
    }

    /// Whether a value of this type carries no user input (the input box is disabled).
    pub fn takes_no_value(self) -> bool {
        matches!(self, ParamType::None)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| SpecError::UnknownType(s.to_string()))
    }
}

impl Serialize for ParamType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParamType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
