//! Mapping between identity records and JWT claim sets.
//!
//! Claim values are [`serde_json::Value`]s: strings, numbers, booleans, null,
//! arrays and nested objects all pass through unchanged in both directions.
//! Three claim names are written by the generator itself:
//!
//! | Claim | Meaning | Encoding |
//! |-------|---------|----------|
//! | `sub` | typed id of the identity | string |
//! | `iat` | generation time | NumericDate (seconds since the epoch) |
//! | `iss` | name of the generator | string |
//!
//! Every attribute of the identity becomes one more top-level claim.

use crate::error::{Result, TokenError};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tessera_core::{IdentityRecord, SEPARATOR};

/// Subject claim.
pub const SUBJECT: &str = "sub";

/// Issued-at claim.
pub const ISSUED_AT: &str = "iat";

/// Issuer claim.
pub const ISSUER: &str = "iss";

/// A decoded claim set.
///
/// `extra` never contains the three registered claim names above.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    subject: String,
    issued_at: Option<DateTime<Utc>>,
    issuer: Option<String>,
    extra: Map<String, Value>,
}

impl ClaimSet {
    /// Build the claims for an identity.
    pub fn for_identity(identity: &IdentityRecord, issuer: &str, now: DateTime<Utc>) -> Self {
        let extra = identity
            .attributes()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            subject: identity.typed_id().to_string(),
            issued_at: Some(now),
            issuer: Some(issuer.to_string()),
            extra,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Claims other than `sub`, `iat` and `iss`.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Look up any claim by name, registered or not.
    pub fn claim(&self, name: &str) -> Option<Value> {
        match name {
            SUBJECT => Some(Value::String(self.subject.clone())),
            ISSUED_AT => self.issued_at.map(|t| Value::from(t.timestamp())),
            ISSUER => self.issuer.clone().map(Value::String),
            _ => self.extra.get(name).cloned(),
        }
    }

    /// Encode as a JSON object.
    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(self.extra.len() + 3);
        map.insert(SUBJECT.to_string(), Value::String(self.subject.clone()));
        if let Some(issued_at) = self.issued_at {
            map.insert(ISSUED_AT.to_string(), Value::from(issued_at.timestamp()));
        }
        if let Some(issuer) = &self.issuer {
            map.insert(ISSUER.to_string(), Value::String(issuer.clone()));
        }
        for (key, value) in &self.extra {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    /// Decode a JSON object.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(TokenError::Format("claims are not a JSON object".to_string()));
        };

        let subject = match map.remove(SUBJECT) {
            Some(Value::String(subject)) => subject,
            Some(_) => return Err(TokenError::Format("sub claim is not a string".to_string())),
            None => return Err(TokenError::Format("missing sub claim".to_string())),
        };

        let issued_at = match map.remove(ISSUED_AT) {
            Some(Value::Number(n)) => Some(numeric_date(&n)?),
            Some(_) => return Err(TokenError::Format("iat claim is not a number".to_string())),
            None => None,
        };

        let issuer = match map.remove(ISSUER) {
            Some(Value::String(issuer)) => Some(issuer),
            Some(_) => return Err(TokenError::Format("iss claim is not a string".to_string())),
            None => None,
        };

        Ok(Self {
            subject,
            issued_at,
            issuer,
            extra: map,
        })
    }

    /// Parse claims from the decoded JWS payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| TokenError::Format(format!("claims are not valid JSON: {e}")))?;
        Self::from_json(value)
    }

    /// Rebuild the identity record.
    ///
    /// A subject without a kind gets `<default_kind>#` prepended. The
    /// registered claims are not carried over as attributes.
    pub fn into_identity(self, default_kind: &str) -> Result<IdentityRecord> {
        if self.subject.trim().is_empty() {
            return Err(TokenError::Format("sub claim is blank".to_string()));
        }

        let typed_id = if self.subject.contains(SEPARATOR) {
            self.subject
        } else {
            format!("{default_kind}{SEPARATOR}{}", self.subject)
        };

        IdentityRecord::from_parts(typed_id, self.extra.into_iter().collect())
            .map_err(|e| TokenError::Format(format!("claims do not form an identity: {e}")))
    }
}

fn numeric_date(n: &serde_json::Number) -> Result<DateTime<Utc>> {
    let seconds = match n.as_i64() {
        Some(seconds) => seconds,
        None => n
            .as_f64()
            .map(|f| f.floor() as i64)
            .ok_or_else(|| TokenError::Format("iat claim is out of range".to_string()))?,
    };
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| TokenError::Format("iat claim is out of range".to_string()))
}
