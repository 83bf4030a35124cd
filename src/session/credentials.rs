use serde::{Deserialize, Serialize};

/// Form body for login, registration and password recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
}

impl Credentials {
    pub fn login(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn register(email: impl Into<String>, password: impl Into<String>, confirmation: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Some(password.into()),
            password_confirmation: Some(confirmation.into()),
            ..Default::default()
        }
    }

    pub fn verification_code(mut self, code: impl Into<String>) -> Self {
        self.verification_code = Some(code.into());
        self
    }
}
