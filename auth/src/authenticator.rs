use crate::jwt::AccessGrant;
use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenIssuer;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token
/// issuance.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator from its two parts.
    pub fn new(password_hasher: PasswordHasher, token_issuer: TokenIssuer) -> Self {
        Self {
            password_hasher,
            token_issuer,
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored digest.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue an access/refresh grant for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<AccessGrant, AuthenticationError> {
        if !self.verify_password(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.token_issuer.issue_grant(subject)?)
    }

    /// Issue a grant without password verification.
    ///
    /// Used by the refresh flow, where the caller already proved identity
    /// with a valid refresh token.
    pub fn issue_grant(&self, subject: &str) -> Result<AccessGrant, JwtError> {
        self.token_issuer.issue_grant(subject)
    }

    /// Validate an access token and return its claims.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.token_issuer.verify_access_token(token)
    }

    /// Validate a refresh token and return its claims.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.token_issuer.verify_refresh_token(token)
    }
}
