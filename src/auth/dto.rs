use serde::{Deserialize, Serialize};

/// Form body of `POST /token`; `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self { access_token, token_type: "bearer" }
    }
}
