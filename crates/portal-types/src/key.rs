//! Query keys.
//!
//! A [`QueryKey`] is an ordered sequence of primitive values, resource name
//! first, e.g. `["messages", "c1"]`. Two keys are equal iff their parts are
//! element-wise equal.

use serde::{Deserialize, Serialize};

/// One primitive element of a [`QueryKey`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl KeyPart {
    /// Returns the part as a string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyPart::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPart::Bool(b) => write!(f, "{b}"),
            KeyPart::Int(n) => write!(f, "{n}"),
            KeyPart::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s)
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        KeyPart::Int(n)
    }
}

impl From<i32> for KeyPart {
    fn from(n: i32) -> Self {
        KeyPart::Int(n.into())
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        KeyPart::Bool(b)
    }
}

/// Identity of a cached remote result.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    /// Creates a single-part key naming a resource, e.g. `["conversations"]`.
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![KeyPart::Str(name.into())])
    }

    /// Creates a key from explicit parts.
    pub fn from_parts(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// Returns a new key with `part` appended.
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    /// Returns the key parts in order.
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Returns the resource name (first part) if it is a string.
    pub fn resource(&self) -> Option<&str> {
        self.0.first().and_then(KeyPart::as_str)
    }

    /// Returns the part at `index` as a string slice, if present and a string.
    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(KeyPart::as_str)
    }

    /// Returns true if `prefix` matches the leading parts of this key.
    ///
    /// Every key starts with itself and with the empty key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the key has no parts.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{part}")?;
        }
        write!(f, "]")
    }
}
