//! Authentication primitives for the account service.
//!
//! - Password hashing (Argon2id, configurable work factor)
//! - Access / refresh token issuance and verification (HS256 JWT)
//! - Authentication coordination
//!
//! The service crate defines its own ports and adapts these implementations,
//! so nothing here knows about accounts, stores or transports.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::TokenIssuer;
//!
//! let issuer = TokenIssuer::with_default_lifetimes(b"secret_key_at_least_32_bytes_long!", "accounts").unwrap();
//! let grant = issuer.issue_grant("user123").unwrap();
//! let claims = issuer.verify_access_token(&grant.access.token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, PasswordHasher, TokenIssuer};
//!
//! let issuer = TokenIssuer::with_default_lifetimes(b"secret_key_at_least_32_bytes_long!", "accounts").unwrap();
//! let auth = Authenticator::new(PasswordHasher::new(), issuer);
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue tokens
//! let grant = auth.authenticate("password123", &hash, "user123").unwrap();
//!
//! // Validate token
//! let claims = auth.validate_access_token(&grant.access.token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::AccessGrant;
pub use jwt::Claims;
pub use jwt::IssuedToken;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenIssuer;
pub use jwt::TokenKind;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::WorkFactor;
