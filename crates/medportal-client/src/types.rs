use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity record returned by the backend.
///
/// The session core never looks inside it; the accessors below exist for
/// frontends that want to show who is logged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(Value);

impl UserIdentity {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Picks the identity out of a backend response.
    ///
    /// An object under `user` or `data.user` is taken as is. An object under
    /// `data`, or the body itself, only counts when it carries an `id`, and
    /// any access token next to it is dropped. A body saying
    /// `"authenticated": false` never yields an identity.
    pub fn from_response(body: &Value) -> Option<Self> {
        if body.get("authenticated").and_then(Value::as_bool) == Some(false) {
            return None;
        }
        let nested = body
            .get("user")
            .or_else(|| body.get("data").and_then(|d| d.get("user")));
        if let Some(Value::Object(map)) = nested
            && !map.is_empty()
        {
            return Some(Self(Value::Object(map.clone())));
        }

        let Value::Object(map) = body.get("data").unwrap_or(body) else {
            return None;
        };
        if map.get("id").is_none_or(Value::is_null) {
            return None;
        }
        let mut map = map.clone();
        for key in ["token", "access_token", "token_type", "expires_in"] {
            map.remove(key);
        }
        Some(Self(Value::Object(map)))
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Login form payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Registration form payload.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Unwraps the `{ "data": ... }` envelope when present.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
