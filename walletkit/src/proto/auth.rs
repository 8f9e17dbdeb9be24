use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/authentication/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Client id issued with the API key.
    pub x_client_id: String,
    /// API key exchanged for a bearer token.
    pub x_api_key: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("x_client_id", &self.x_client_id)
            .field("x_api_key", &"[REDACTED]")
            .finish()
    }
}

/// Response of the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent calls.
    pub token: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .finish()
    }
}
