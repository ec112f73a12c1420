use serde::Deserialize;
use serde::Serialize;

/// Claims carried by an access token.
///
/// The subject is the account id rendered as a string; `company_id` is the
/// empty string for accounts with no company association so the claim is
/// always present with a stable type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub company_id: String,
    pub access_level: i32,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
}
