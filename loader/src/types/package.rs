use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// State value the catalog uses for live packages.
const ACTIVE_STATE: &str = "active";

/// Lifecycle state of a package in the catalog.
///
/// Only [`PackageState::Active`] packages are considered when matching; every other state the
/// catalog reports is kept verbatim so it round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PackageState {
    Active,
    Inactive(String),
}

impl From<String> for PackageState {
    fn from(value: String) -> Self {
        if value == ACTIVE_STATE {
            PackageState::Active
        } else {
            PackageState::Inactive(value)
        }
    }
}

impl From<PackageState> for String {
    fn from(value: PackageState) -> Self {
        match value {
            PackageState::Active => ACTIVE_STATE.to_owned(),
            PackageState::Inactive(state) => state,
        }
    }
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageState::Active => f.write_str(ACTIVE_STATE),
            PackageState::Inactive(state) => f.write_str(state),
        }
    }
}

/// A sub-entry of a package, typically a reference to a data file.
///
/// Resources of a series are told apart by an identity token embedded in `description`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Resource {
    /// Creates a resource with the given description and no other fields.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            fields: Map::new(),
        }
    }

    /// Sets an additional field, returning the resource.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A dataset description as stored in the catalog.
///
/// `name` is the unique human-readable identifier. Fields the catalog does not promote to the
/// top level live in `extras`; every other top-level field is preserved in `fields`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    /// Identifier generated by the catalog on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PackageState>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Package {
    /// Creates a package with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: PackageState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if the catalog reports this package as active.
    pub fn is_active(&self) -> bool {
        matches!(self.state, Some(PackageState::Active))
    }

    /// Returns `true` if `key` is present at the top level of the package.
    pub fn has_top_level(&self, key: &str) -> bool {
        match key {
            "name" | "resources" | "extras" => true,
            "id" => self.id.is_some(),
            "state" => self.state.is_some(),
            _ => self.fields.contains_key(key),
        }
    }

    /// Returns the top-level value stored under `key`, if any.
    ///
    /// `resources` and `extras` are structural and never returned here.
    pub fn top_level_value(&self, key: &str) -> Option<Value> {
        match key {
            "name" => Some(Value::String(self.name.clone())),
            "id" => self.id.clone().map(Value::String),
            "state" => self.state.as_ref().map(|state| Value::String(state.to_string())),
            "resources" | "extras" => None,
            _ => self.fields.get(key).cloned(),
        }
    }

    /// Returns the value stored under `key` in `extras` as a JSON string.
    pub fn extra_value(&self, key: &str) -> Option<Value> {
        self.extras.get(key).cloned().map(Value::String)
    }

    /// Reads an identifying field as text, looking at the top level first and then `extras`.
    ///
    /// Blank values are treated as missing.
    pub fn identity_value(&self, key: &str) -> Option<Cow<'_, str>> {
        let top_level = match key {
            "name" => Some(Cow::Borrowed(self.name.as_str())),
            "id" => self.id.as_deref().map(Cow::Borrowed),
            "state" => self.state.as_ref().map(|state| Cow::Owned(state.to_string())),
            _ => self.fields.get(key).and_then(scalar_text),
        };

        top_level
            .filter(|value| !value.is_empty())
            .or_else(|| {
                self.extras
                    .get(key)
                    .map(|value| Cow::Borrowed(value.as_str()))
            })
            .filter(|value| !value.is_empty())
    }
}

/// Renders a scalar JSON value as text. Containers and nulls have no text form.
fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A named catalog group listing the packages that belong to it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Member package names. The catalog may report this as absent or `null`.
    #[serde(default)]
    pub packages: Option<Vec<String>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
