use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who the server says the token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "isAdmin", alias = "is_admin")]
    pub is_admin: bool,
}

impl Identity {
    pub fn new(name: impl Into<String>, is_admin: bool) -> Self {
        Self {
            name: name.into(),
            is_admin,
        }
    }

    /// Reads the identity out of a response body, looking inside the `data`
    /// envelope first.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        serde_json::from_value(identity_body(payload)?.clone()).ok()
    }

    /// This identity updated with the fields a "who am I" reply carries.
    /// Fields the reply leaves out keep their current value, so a reply with
    /// only a name does not drop the admin flag.
    pub fn refreshed(&self, payload: &Value) -> Self {
        let Some(refresh) = identity_body(payload)
            .and_then(|body| serde_json::from_value::<IdentityRefresh>(body.clone()).ok())
        else {
            return self.clone();
        };
        Self {
            name: refresh.name.unwrap_or_else(|| self.name.clone()),
            is_admin: refresh.is_admin.unwrap_or(self.is_admin),
        }
    }
}

#[derive(Deserialize)]
struct IdentityRefresh {
    name: Option<String>,
    #[serde(rename = "isAdmin", alias = "is_admin")]
    is_admin: Option<bool>,
}

fn identity_body(payload: &Value) -> Option<&Value> {
    let body = payload.get("data").filter(|d| d.is_object()).unwrap_or(payload);
    body.is_object().then_some(body)
}

/// Reads the bearer token out of a login response (`data.token` or `token`).
pub(crate) fn token_from_payload(payload: &Value) -> Option<String> {
    payload
        .get("data")
        .and_then(|d| d.get("token"))
        .or_else(|| payload.get("token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No valid token held.
    #[default]
    Anonymous,
    /// Valid token; the identity says whether it is an admin.
    Authenticated(Identity),
}

impl SessionState {
    pub fn role(&self) -> Role {
        match self {
            SessionState::Anonymous => Role::Anonymous,
            SessionState::Authenticated(id) if id.is_admin => Role::Admin,
            SessionState::Authenticated(_) => Role::Authenticated,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Anonymous,
    Authenticated,
    Admin,
}

impl Role {
    pub fn is_signed_in(&self) -> bool {
        !matches!(self, Role::Anonymous)
    }
}
