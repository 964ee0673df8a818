//! Identity records carried inside tokens.
//!
//! An [`IdentityRecord`] is an already-authenticated subject: a typed id of the
//! form `<Kind>#<id>` plus a flat map of attributes. The token layer flattens
//! the attributes into claims, so a handful of claim names are reserved and can
//! never be used as attribute keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Separator between the kind and the raw id inside a typed id.
pub const SEPARATOR: &str = "#";

/// Attribute keys that collide with claims written by the token layer
/// (subject, issue time, issuer).
pub const RESERVED_ATTRIBUTES: [&str; 3] = ["sub", "iat", "iss"];

/// Errors raised when an identity record would break its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// The typed id is empty or whitespace.
    #[error("typed id must not be blank")]
    BlankId,

    /// The kind part of a typed id is empty or whitespace.
    #[error("identity kind must not be blank")]
    BlankKind,

    /// An attribute key is empty or whitespace.
    #[error("attribute key must not be blank")]
    BlankAttributeKey,

    /// An attribute key collides with a reserved claim name.
    #[error("attribute key '{0}' is reserved")]
    ReservedAttribute(String),
}

/// Check whether a key is reserved for token claims.
pub fn is_reserved(key: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&key)
}

/// An authenticated subject and its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIdentityRecord")]
pub struct IdentityRecord {
    typed_id: String,
    attributes: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct RawIdentityRecord {
    typed_id: String,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl TryFrom<RawIdentityRecord> for IdentityRecord {
    type Error = ProfileError;

    fn try_from(raw: RawIdentityRecord) -> Result<Self, Self::Error> {
        Self::from_parts(raw.typed_id, raw.attributes)
    }
}

impl IdentityRecord {
    /// Create a record with no attributes.
    pub fn new(typed_id: impl Into<String>) -> Result<Self, ProfileError> {
        let typed_id = typed_id.into();
        if typed_id.trim().is_empty() {
            return Err(ProfileError::BlankId);
        }
        Ok(Self {
            typed_id,
            attributes: BTreeMap::new(),
        })
    }

    /// Create a record whose typed id is `<kind>#<id>`.
    pub fn with_kind(kind: &str, id: &str) -> Result<Self, ProfileError> {
        if kind.trim().is_empty() {
            return Err(ProfileError::BlankKind);
        }
        if id.trim().is_empty() {
            return Err(ProfileError::BlankId);
        }
        Self::new(format!("{kind}{SEPARATOR}{id}"))
    }

    /// Create a record from a typed id and a full attribute map.
    pub fn from_parts(
        typed_id: impl Into<String>,
        attributes: BTreeMap<String, Value>,
    ) -> Result<Self, ProfileError> {
        let mut record = Self::new(typed_id)?;
        for (key, value) in attributes {
            record.add_attribute(key, value)?;
        }
        Ok(record)
    }

    /// The typed id, including the kind prefix when present.
    pub fn typed_id(&self) -> &str {
        &self.typed_id
    }

    /// The kind part of the typed id, if it has one.
    pub fn kind(&self) -> Option<&str> {
        self.typed_id
            .split_once(SEPARATOR)
            .map(|(kind, _)| kind)
    }

    /// The raw id without the kind prefix.
    pub fn id(&self) -> &str {
        self.typed_id
            .split_once(SEPARATOR)
            .map(|(_, id)| id)
            .unwrap_or(&self.typed_id)
    }

    /// All attributes.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Look up one attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Insert or replace an attribute.
    pub fn add_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ProfileError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ProfileError::BlankAttributeKey);
        }
        if is_reserved(&key) {
            return Err(ProfileError::ReservedAttribute(key));
        }
        self.attributes.insert(key, value.into());
        Ok(self)
    }

    /// Builder-style variant of [`IdentityRecord::add_attribute`].
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ProfileError> {
        self.add_attribute(key, value)?;
        Ok(self)
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Consume the record into its typed id and attributes.
    pub fn into_parts(self) -> (String, BTreeMap<String, Value>) {
        (self.typed_id, self.attributes)
    }
}
