//! Request record leaf nodes and the partial-update patch applied to them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use apinav_core::types::id::RequestId;

use super::encoded::Encoded;

/// Field names owned by [`RequestRecord`] itself or by the addressing
/// envelope; never merged into [`RequestRecord::extra`].
const RESERVED_KEYS: &[&str] = &[
    "id",
    "requestId",
    "collectionId",
    "folderId",
    "folderPath",
    "name",
    "method",
    "url",
    "headers",
    "query",
    "body",
    "auth",
    "preRequestScript",
    "testScript",
    "description",
    "hidden",
    "createdAt",
    "updatedAt",
];

/// Authentication attached to a request.
///
/// Stored as `{"type": "...", ...params}`, or as that object encoded in a
/// string by older clients. The kind set is open (basic,
/// bearer, apikey, jwt, oauth2, digest…); parameters are kept verbatim
/// so credentials for kinds this crate does not interpret are never lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthDescriptor {
    /// Auth kind, `"no-auth"` when unset.
    #[serde(rename = "type", default = "no_auth")]
    pub kind: String,
    /// Kind-specific parameters (`username`, `token`, `key`, `addTo`…).
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

fn no_auth() -> String {
    "no-auth".to_string()
}

impl Default for AuthDescriptor {
    fn default() -> Self {
        Self::none()
    }
}

impl AuthDescriptor {
    /// No authentication.
    pub fn none() -> Self {
        Self {
            kind: no_auth(),
            params: Map::new(),
        }
    }

    /// Bearer token authentication.
    pub fn bearer(token: impl Into<String>) -> Self {
        let mut params = Map::new();
        params.insert("token".to_string(), Value::String(token.into()));
        Self {
            kind: "bearer".to_string(),
            params,
        }
    }

    /// HTTP Basic authentication.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        let mut params = Map::new();
        params.insert("username".to_string(), Value::String(username.into()));
        params.insert("password".to_string(), Value::String(password.into()));
        Self {
            kind: "basic".to_string(),
            params,
        }
    }

    /// Whether no authentication is configured.
    pub fn is_none(&self) -> bool {
        self.kind == "no-auth" || self.kind == "none" || self.kind.is_empty()
    }

    /// A string parameter, if present.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

/// One HTTP request's full configuration. Never has children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// Unique request identifier.
    pub id: RequestId,
    /// Display name; may be empty, see [`RequestRecord::display_name`].
    #[serde(default)]
    pub name: String,
    /// HTTP method.
    #[serde(default = "default_method")]
    pub method: String,
    /// Target URL, possibly containing `{{var}}` tokens.
    #[serde(default)]
    pub url: String,
    /// Header name → value.
    #[serde(default)]
    pub headers: Encoded<BTreeMap<String, String>>,
    /// Query parameter name → value.
    #[serde(default)]
    pub query: Encoded<BTreeMap<String, String>>,
    /// Raw request body.
    #[serde(default)]
    pub body: String,
    /// Authentication descriptor.
    #[serde(default)]
    pub auth: Encoded<AuthDescriptor>,
    /// Script run before the request is sent.
    #[serde(default)]
    pub pre_request_script: String,
    /// Script run against the response.
    #[serde(default)]
    pub test_script: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Visibility toggle; hidden requests are still part of the tree.
    #[serde(default)]
    pub hidden: bool,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this model does not interpret (body type, GraphQL query, tags…),
    /// carried through load/save untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RequestRecord {
    /// Create a request with the given method and URL and empty everything else.
    pub fn new(id: RequestId, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: String::new(),
            method: method.into(),
            url: url.into(),
            headers: Encoded::default(),
            query: Encoded::default(),
            body: String::new(),
            auth: Encoded::default(),
            pre_request_script: String::new(),
            test_script: String::new(),
            description: String::new(),
            hidden: false,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Build a new record from a draft patch, stamping both timestamps.
    pub fn from_patch(id: RequestId, patch: &RequestPatch, now: DateTime<Utc>) -> Self {
        let mut record = Self::new(id, default_method(), String::new());
        patch.apply_fields(&mut record);
        record.created_at = Some(now);
        record.updated_at = Some(now);
        record
    }

    /// Name shown in trees: the name, or the URL when the name is empty.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// Partial update of a [`RequestRecord`].
///
/// Only fields that are present replace the stored value. A present empty
/// string clears the field; an absent field keeps the prior value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPatch {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// New URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Replacement header map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Encoded<BTreeMap<String, String>>>,
    /// Replacement query map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Encoded<BTreeMap<String, String>>>,
    /// New body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// New auth descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Encoded<AuthDescriptor>>,
    /// New pre-request script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_request_script: Option<String>,
    /// New test script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_script: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Uninterpreted fields merged key-by-key into [`RequestRecord::extra`].
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestPatch {
    /// Whether the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.method.is_none()
            && self.url.is_none()
            && self.headers.is_none()
            && self.query.is_none()
            && self.body.is_none()
            && self.auth.is_none()
            && self.pre_request_script.is_none()
            && self.test_script.is_none()
            && self.description.is_none()
            && self.mergeable_extra().next().is_none()
    }

    /// Shallow-merge the patch into `record`.
    ///
    /// Returns `true` if any stored value changed; `updated_at` is bumped
    /// to `now` only in that case.
    pub fn apply(&self, record: &mut RequestRecord, now: DateTime<Utc>) -> bool {
        let changed = self.apply_fields(record);
        if changed {
            record.updated_at = Some(now);
        }
        changed
    }

    fn apply_fields(&self, record: &mut RequestRecord) -> bool {
        let mut changed = false;
        changed |= assign(&mut record.name, &self.name);
        changed |= assign(&mut record.method, &self.method);
        changed |= assign(&mut record.url, &self.url);
        changed |= assign(&mut record.headers, &self.headers);
        changed |= assign(&mut record.query, &self.query);
        changed |= assign(&mut record.body, &self.body);
        changed |= assign(&mut record.auth, &self.auth);
        changed |= assign(&mut record.pre_request_script, &self.pre_request_script);
        changed |= assign(&mut record.test_script, &self.test_script);
        changed |= assign(&mut record.description, &self.description);
        for (key, value) in self.mergeable_extra() {
            if record.extra.get(key) != Some(value) {
                record.extra.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    fn mergeable_extra(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.extra
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
    }
}

fn assign<T: PartialEq + Clone>(slot: &mut T, value: &Option<T>) -> bool {
    match value {
        Some(v) if slot != v => {
            *slot = v.clone();
            true
        }
        _ => false,
    }
}
