//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for services:
//! - Password hashing (Argon2id)
//! - JWT token encoding and validation
//! - Brute-force lockout policy
//!
//! Each service defines its own claims types and authentication traits and
//! adapts these implementations. This avoids coupling services through shared
//! domain logic while reducing code duplication.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest));
//! assert!(!hasher.verify("other_password", &digest));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::JwtHandler;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Claims {
//!     sub: String,
//!     exp: i64,
//! }
//!
//! let handler = JwtHandler::new(b"secret_key_at_least_32_bytes_long!");
//! let claims = Claims {
//!     sub: "account-1".to_string(),
//!     exp: chrono::Utc::now().timestamp() + 3600,
//! };
//! let token = handler.encode(&claims).unwrap();
//! let decoded: Claims = handler.decode(&token).unwrap();
//! assert_eq!(decoded.sub, "account-1");
//! ```
//!
//! ## Lockout Policy
//! ```
//! use auth::lockout;
//!
//! assert!(!lockout::is_locked(4));
//! assert!(lockout::is_locked(5));
//! ```

pub mod jwt;
pub mod lockout;
pub mod password;

// Re-export commonly used items
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use lockout::LOCKOUT_THRESHOLD;
pub use password::PasswordError;
pub use password::PasswordHasher;
