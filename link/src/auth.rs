//! Authentication provider for the wallet API client.
//!
//! The backend only understands JWT bearer tokens, so the provider is either a
//! token or nothing at all.

/// Credentials attached to outbound requests.
///
/// # Examples
///
/// ```rust
/// use wallet_link::AuthProvider;
///
/// let auth = AuthProvider::jwt_token("eyJhbGc...".to_string());
/// assert!(auth.is_authenticated());
///
/// let anonymous = AuthProvider::from_token(None);
/// assert!(!anonymous.is_authenticated());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub enum AuthProvider {
    /// JWT token authentication
    JwtToken(String),

    /// Anonymous request (login, register)
    None,
}

impl AuthProvider {
    /// Create JWT token authentication
    pub fn jwt_token(token: String) -> Self {
        Self::JwtToken(token)
    }

    /// No authentication
    pub fn none() -> Self {
        Self::None
    }

    /// Bearer auth when a token is supplied, anonymous otherwise.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(token) if !token.is_empty() => Self::JwtToken(token.to_string()),
            _ => Self::None,
        }
    }

    /// Attach the `Authorization: Bearer <token>` header when a token is set.
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::JwtToken(token) => request.bearer_auth(token),
            Self::None => request,
        }
    }

    /// The raw token, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::JwtToken(token) => Some(token.as_str()),
            Self::None => None,
        }
    }

    /// Check if authentication is configured
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

// Tokens never end up in logs through `{:?}`.
impl std::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JwtToken(_) => write!(f, "AuthProvider::JwtToken(<redacted>)"),
            Self::None => write!(f, "AuthProvider::None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_provider_creation() {
        let jwt = AuthProvider::jwt_token("test_token".to_string());
        assert!(jwt.is_authenticated());
        assert_eq!(jwt.token(), Some("test_token"));

        let none = AuthProvider::none();
        assert!(!none.is_authenticated());
        assert_eq!(none.token(), None);
    }

    #[test]
    fn test_from_token_treats_empty_as_anonymous() {
        assert_eq!(AuthProvider::from_token(Some("")), AuthProvider::None);
        assert_eq!(AuthProvider::from_token(None), AuthProvider::None);
        assert_eq!(
            AuthProvider::from_token(Some("t1")),
            AuthProvider::JwtToken("t1".to_string())
        );
    }

    #[test]
    fn test_bearer_header_is_applied() {
        let client = reqwest::Client::new();
        let request = AuthProvider::jwt_token("t1".to_string())
            .apply_to_request(client.get("http://localhost:3000/users/me"))
            .build()
            .unwrap();

        let header = request.headers().get("authorization").unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer t1");
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = AuthProvider::jwt_token("secret-token".to_string());
        assert!(!format!("{:?}", auth).contains("secret-token"));
    }
}
