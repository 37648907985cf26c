//! Typed parameter lists and their mapping-key encoding.
//!
//! A test case is keyed by its parameter list. The key is the compact JSON text of `[[value, type], …]`, e.g.
//! `[["3","int"],["abc","str"]]`. JSON string escaping is injective, so two structurally distinct lists never share a
//! key, and decoding a key always yields the list it was built from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SpecError;
use crate::types::ParamType;

/// One `(value, declared type)` pair. Values stay textual; the interpreter harness converts them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, ParamType)", into = "(String, ParamType)")]
pub struct Param {
    pub value: String,
    pub ty: ParamType,
}

impl Param {
    pub fn new(value: impl Into<String>, ty: ParamType) -> Self {
        Self {
            value: value.into(),
            ty,
        }
    }
}

impl From<(String, ParamType)> for Param {
    fn from((value, ty): (String, ParamType)) -> Self {
        Self { value, ty }
    }
}

impl From<Param> for (String, ParamType) {
    fn from(p: Param) -> Self {
        (p.value, p.ty)
    }
}

/// Parse the command-line form `VALUE:TYPE`. The split happens at the last `:` so values may contain colons.
impl FromStr for Param {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, ty) = s.rsplit_once(':').ok_or_else(|| SpecError::InvalidParam(s.to_string()))?;
        Ok(Param::new(value, ty.parse()?))
    }
}

/// Expected output of a test case: `(value, declared type)`, serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, ParamType)", into = "(String, ParamType)")]
pub struct Expected {
    pub value: String,
    pub ty: ParamType,
}

impl Expected {
    pub fn new(value: impl Into<String>, ty: ParamType) -> Self {
        Self {
            value: value.into(),
            ty,
        }
    }
}

impl From<(String, ParamType)> for Expected {
    fn from((value, ty): (String, ParamType)) -> Self {
        Self { value, ty }
    }
}

impl From<Expected> for (String, ParamType) {
    fn from(e: Expected) -> Self {
        (e.value, e.ty)
    }
}

impl FromStr for Expected {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p: Param = s.parse()?;
        Ok(Expected::new(p.value, p.ty))
    }
}

/// Ordered parameter list of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamList(pub Vec<Param>);

impl ParamList {
    pub fn new(params: Vec<Param>) -> Self {
        Self(params)
    }

    pub fn params(&self) -> &[Param] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode this list as its mapping key.
    ///
    /// ## Returns
    /// - (`String`): compact JSON `[[value, type], …]`, identical for structurally equal lists.
    pub fn to_key(&self) -> String {
        Value::Array(
            self.0
                .iter()
                .map(|p| {
                    Value::Array(vec![
                        Value::String(p.value.clone()),
                        Value::String(p.ty.as_str().to_string()),
                    ])
                })
                .collect(),
        )
        .to_string()
    }

    /// Decode a mapping key produced by [`ParamList::to_key`] (or by any front end writing the same format).
    ///
    /// ## Errors
    /// - [`SpecError::InvalidKey`] if the key is not a JSON array of `[string, type]` pairs.
    pub fn from_key(key: &str) -> Result<Self, SpecError> {
        serde_json::from_str(key).map_err(|e| SpecError::InvalidKey {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for ParamList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_key())
    }
}

impl FromIterator<Param> for ParamList {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
