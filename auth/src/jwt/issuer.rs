use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::claims::Claims;
use super::errors::JwtError;
use super::handler::JwtHandler;

/// Default access token lifetime.
pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 60;

/// Default refresh token lifetime.
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;

/// The two kinds of token the issuer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn suffix(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// A signed token together with its decoded claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }
}

/// Access + refresh token pair bound to one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issues and verifies short-lived access tokens and long-lived refresh
/// tokens.
///
/// Each kind is signed with the same secret but carries its own issuer label
/// (`<issuer>-access`, `<issuer>-refresh`), so a refresh token is never
/// accepted where an access token is expected and vice versa.
pub struct TokenIssuer {
    handler: JwtHandler,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer.
    ///
    /// # Arguments
    /// * `secret` - Process-wide signing secret
    /// * `issuer` - Issuer name, suffixed per token kind
    /// * `access_ttl` - Access token lifetime
    /// * `refresh_ttl` - Refresh token lifetime
    ///
    /// # Errors
    /// * `EmptySecret` - The secret is empty
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, JwtError> {
        Ok(Self {
            handler: JwtHandler::new(secret)?,
            issuer: issuer.into(),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Create an issuer with the default 1 hour / 7 day lifetimes.
    pub fn with_default_lifetimes(
        secret: &[u8],
        issuer: impl Into<String>,
    ) -> Result<Self, JwtError> {
        Self::new(
            secret,
            issuer,
            Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        )
    }

    /// Issuer label embedded in tokens of `kind`.
    pub fn issuer_label(&self, kind: TokenKind) -> String {
        format!("{}-{}", self.issuer, kind.suffix())
    }

    fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn issue(
        &self,
        kind: TokenKind,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let claims = Claims::new(subject, self.issuer_label(kind), now, self.lifetime(kind));
        let token = self.handler.encode(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Sign an access token for `subject`, valid from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue_access_token(&self, subject: &str) -> Result<IssuedToken, JwtError> {
        self.issue(TokenKind::Access, subject, Utc::now())
    }

    /// Sign a refresh token for `subject`, valid from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue_refresh_token(&self, subject: &str) -> Result<IssuedToken, JwtError> {
        self.issue(TokenKind::Refresh, subject, Utc::now())
    }

    /// Sign both tokens for `subject` with a shared issue time.
    pub fn issue_grant(&self, subject: &str) -> Result<AccessGrant, JwtError> {
        let now = Utc::now();
        Ok(AccessGrant {
            access: self.issue(TokenKind::Access, subject, now)?,
            refresh: self.issue(TokenKind::Refresh, subject, now)?,
        })
    }

    /// Verify a token of the given kind and return its claims.
    ///
    /// # Errors
    /// * `TokenExpired` - Token is past its expiry
    /// * `InvalidToken` - Bad signature or wrong kind
    /// * `DecodingFailed` - Malformed token
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, JwtError> {
        self.handler.decode(token, &self.issuer_label(kind))
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify(TokenKind::Access, token)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.verify(TokenKind::Refresh, token)
    }
}
