//! The test specification: what to call, with which inputs, against which scripts.
//!
//! ## Wire format
//!
//! The specification is written verbatim to the request artifact read by the interpreter harness:
//!
//! ```json
//! {
//!   "testfunc": "square",
//!   "tests": { "[[\"3\",\"int\"]]": ["9", "int"] },
//!   "scriptPaths": { "script.py": "/home/me/script.py" }
//! }
//! ```
//!
//! Both mappings keep their insertion order through a serialize/deserialize cycle.

use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::SpecError;
use crate::params::{Expected, ParamList};

/// Display names longer than this many characters are truncated and suffixed with `...`.
pub const DISPLAY_NAME_MAX_CHARS: usize = 64;

const TRUNCATION_MARKER: &str = "...";

/// A complete test run request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestSpecification {
    /// Name of the function exercised in every target (opaque to the runner).
    #[serde(rename = "testfunc")]
    pub function_under_test: String,

    #[serde(rename = "tests", with = "test_cases_serde", default)]
    test_cases: Vec<(ParamList, Expected)>,

    #[serde(rename = "scriptPaths", default)]
    pub targets: Targets,
}

impl TestSpecification {
    pub fn new(function_under_test: impl Into<String>) -> Self {
        Self {
            function_under_test: function_under_test.into(),
            test_cases: Vec::new(),
            targets: Targets::default(),
        }
    }

    /// Add a test case. Re-adding an existing parameter list replaces its expected output in place.
    pub fn add_case(&mut self, params: ParamList, expected: Expected) {
        if let Some(slot) = self.test_cases.iter_mut().find(|(p, _)| *p == params) {
            slot.1 = expected;
        } else {
            self.test_cases.push((params, expected));
        }
    }

    /// Builder-style variant of [`TestSpecification::add_case`].
    pub fn with_case(mut self, params: ParamList, expected: Expected) -> Self {
        self.add_case(params, expected);
        self
    }

    /// Builder-style variant of [`Targets::add`].
    pub fn with_target(mut self, path: impl Into<PathBuf>) -> Result<Self, SpecError> {
        self.targets.add(path)?;
        Ok(self)
    }

    pub fn cases(&self) -> &[(ParamList, Expected)] {
        &self.test_cases
    }

    pub fn expected_for(&self, params: &ParamList) -> Option<&Expected> {
        self.test_cases.iter().find(|(p, _)| p == params).map(|(_, e)| e)
    }

    pub fn remove_case(&mut self, params: &ParamList) -> Option<Expected> {
        let idx = self.test_cases.iter().position(|(p, _)| p == params)?;
        Some(self.test_cases.remove(idx).1)
    }

    /// Parse a specification from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the specification in its JSON wire form (pretty-printed, two-space indent).
    pub fn to_json_pretty(&self) -> Result<String, SpecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Ordered mapping from display name to the real path of each target script.
///
/// Display names are unique; real paths may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Targets {
    entries: Vec<(String, PathBuf)>,
}

impl Targets {
    /// Register a script, deriving a unique display name from its base name.
    ///
    /// ## Returns
    /// - (`&str`): the display name assigned to this path.
    ///
    /// ## Notes
    /// - Base names longer than [`DISPLAY_NAME_MAX_CHARS`] characters are cut and suffixed with `...`.
    /// - A collision with an existing display name is resolved by appending ` (2)`, ` (3)`, …
    pub fn add(&mut self, path: impl Into<PathBuf>) -> Result<&str, SpecError> {
        let path = path.into();
        let base = display_name_for(&path)?;
        let mut name = base.clone();
        let mut n = 2;
        while self.get(&name).is_some() {
            name = format!("{base} ({n})");
            n += 1;
        }
        self.entries.push((name, path));
        Ok(self.entries.last().map(|(n, _)| n.as_str()).unwrap_or_default())
    }

    /// Insert under an explicit display name, replacing the path of an existing entry with that name.
    pub fn insert(&mut self, display_name: impl Into<String>, path: impl Into<PathBuf>) {
        let display_name = display_name.into();
        let path = path.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == display_name) {
            slot.1 = path;
        } else {
            self.entries.push((display_name, path));
        }
    }

    pub fn remove(&mut self, display_name: &str) -> Option<PathBuf> {
        let idx = self.entries.iter().position(|(n, _)| n == display_name)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, display_name: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(n, _)| n == display_name)
            .map(|(_, p)| p.as_path())
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.entries.iter().any(|(_, p)| p == path)
    }

    /// Iterate `(display name, real path)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive the (not yet de-duplicated) display name of a script path.
pub fn display_name_for(path: &Path) -> Result<String, SpecError> {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SpecError::NoFileName(path.display().to_string()))?;
    if base.chars().count() > DISPLAY_NAME_MAX_CHARS {
        let mut cut: String = base.chars().take(DISPLAY_NAME_MAX_CHARS).collect();
        cut.push_str(TRUNCATION_MARKER);
        Ok(cut)
    } else {
        Ok(base)
    }
}

impl Serialize for Targets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, path) in &self.entries {
            map.serialize_entry(name, &path.to_string_lossy())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Targets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut targets = Targets::default();
        for (name, value) in raw {
            let Value::String(path) = value else {
                return Err(D::Error::custom(format!("path of target '{name}' must be a string")));
            };
            targets.insert(name, path);
        }
        Ok(targets)
    }
}

/// `tests` is a JSON object keyed by the encoded parameter list.
mod test_cases_serde {
    use super::*;

    pub fn serialize<S: Serializer>(cases: &[(ParamList, Expected)], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(cases.len()))?;
        for (params, expected) in cases {
            map.serialize_entry(&params.to_key(), expected)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<(ParamList, Expected)>, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut cases = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let params = ParamList::from_key(&key).map_err(D::Error::custom)?;
            let expected: Expected = serde_json::from_value(value).map_err(|e| {
                D::Error::custom(SpecError::InvalidExpected {
                    key: key.clone(),
                    reason: e.to_string(),
                })
            })?;
            cases.push((params, expected));
        }
        Ok(cases)
    }
}
