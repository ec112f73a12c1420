use auth::JwtHandler;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::account::models::Account;
use crate::domain::token::claims::AccessClaims;
use crate::domain::token::errors::TokenError;

/// A freshly minted bearer token.
///
/// The refresh value is an opaque random string issued alongside the signed
/// token. It is not persisted or validated anywhere yet, so it cannot be
/// redeemed; clients should treat it as reserved.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates signed bearer tokens for accounts.
///
/// Tokens are HMAC-signed compact JWTs carrying the claims in
/// [`AccessClaims`], pinned to a fixed issuer and audience, and validated
/// with zero clock-skew tolerance.
pub struct TokenIssuer {
    handler: JwtHandler,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create a token issuer from signing settings.
    ///
    /// # Arguments
    /// * `secret` - Symmetric signing key (at least 32 bytes recommended)
    /// * `issuer` - Value stamped into and required from the `iss` claim
    /// * `audience` - Value stamped into and required from the `aud` claim
    /// * `ttl_minutes` - Token lifetime
    ///
    /// # Errors
    /// * `MissingSecret` - The secret is empty. This is a startup-class
    ///   failure: the service must refuse to serve auth traffic without a
    ///   signing key rather than fail per request.
    pub fn new(
        secret: &str,
        issuer: &str,
        audience: &str,
        ttl_minutes: i64,
    ) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let handler = JwtHandler::new(secret.as_bytes()).with_expected_claims(issuer, audience);

        Ok(Self {
            handler,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            ttl: Duration::minutes(ttl_minutes),
        })
    }

    /// Issue a signed access token for an account.
    ///
    /// # Arguments
    /// * `account` - Account whose identity the token asserts
    ///
    /// # Returns
    /// IssuedToken with the signed token, an opaque refresh value, and the
    /// expiry timestamp
    ///
    /// # Errors
    /// * `IssuanceFailed` - Claims could not be encoded
    pub fn issue(&self, account: &Account) -> Result<IssuedToken, TokenError> {
        let expires_at = Utc::now() + self.ttl;

        let claims = AccessClaims {
            sub: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            role: account.role.name.clone(),
            company_id: account
                .company_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            access_level: account.role.access_level,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
        };

        let access_token = self
            .handler
            .encode(&claims)
            .map_err(|e| TokenError::IssuanceFailed(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            refresh_token: Uuid::new_v4().simple().to_string(),
            expires_at,
        })
    }

    /// Decode a token and return its claims if it is valid.
    ///
    /// # Arguments
    /// * `token` - Compact token string from a bearer header
    ///
    /// # Errors
    /// * `Invalid` - Malformed token, bad signature, wrong issuer or
    ///   audience, or expired
    pub fn decode(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.handler
            .decode(token)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }

    /// Whether a token passes signature, issuer, audience, and expiry checks.
    ///
    /// Never fails past this boundary: any validation problem is `false`.
    pub fn verify(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }
}
