//! Header names, environment variable names, and provider base URLs.

use http::Method;

/// Header carrying the idempotency token on mutating requests.
pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";

/// Header identifying the API client to the provider.
pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Bearer credential header.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Request body content type header.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Content type of every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Endpoint exchanging a client id and API key for a bearer token.
pub const LOGIN_PATH: &str = "/api/v1/authentication/login";

/// Provider sandbox API.
pub const SANDBOX_BASE_URL: &str = "https://api-demo.airwallex.com";

/// Provider production API.
pub const PRODUCTION_BASE_URL: &str = "https://api.airwallex.com";

/// Environment variable overriding the API base URL.
pub const ENV_API_BASE: &str = "WALLETKIT_API_BASE";

/// Environment variable holding the bearer credential.
pub const ENV_API_KEY: &str = "WALLETKIT_API_KEY";

/// Environment variable holding the client id.
pub const ENV_CLIENT_ID: &str = "WALLETKIT_CLIENT_ID";

/// Environment variable selecting `sandbox` or `production` when no base
/// URL is given.
pub const ENV_ENVIRONMENT: &str = "WALLETKIT_ENVIRONMENT";

/// Returns `true` for the methods that carry an idempotency key:
/// POST, PUT, PATCH, and DELETE.
#[must_use]
pub fn is_mutating(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutating_methods() {
        for m in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(is_mutating(&m), "{m} should be mutating");
        }
        for m in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(!is_mutating(&m), "{m} should not be mutating");
        }
    }
}
