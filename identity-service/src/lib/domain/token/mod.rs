pub mod claims;
pub mod errors;
pub mod issuer;

pub use claims::AccessClaims;
pub use errors::TokenError;
pub use issuer::IssuedToken;
pub use issuer::TokenIssuer;
