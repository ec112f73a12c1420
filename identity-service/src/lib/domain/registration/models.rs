use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::Activation;
use crate::domain::account::models::CompanyId;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::Role;
use crate::domain::account::models::RoleId;
use crate::domain::account::models::Username;
use crate::domain::registration::errors::CustomerKindError;
use crate::domain::registration::errors::DocumentError;
use crate::domain::token::IssuedToken;

/// Message returned when a self-registration yields a usable session.
pub const REGISTRATION_SUCCESSFUL_MESSAGE: &str = "registration successful";

/// Message returned when the new account awaits administrative activation.
pub const PENDING_ACTIVATION_MESSAGE: &str = "account pending administrative activation";

/// Kind of customer behind a self-registration.
///
/// Drives the initial activation branch: persons go live immediately, legal
/// entities wait for administrative approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerKind {
    Person,
    Company,
}

impl CustomerKind {
    /// Parse a customer kind from its wire representation.
    ///
    /// # Arguments
    /// * `kind` - Raw kind string ("person" or "company")
    ///
    /// # Errors
    /// * `Unknown` - Not a recognized customer kind
    pub fn new(kind: &str) -> Result<Self, CustomerKindError> {
        match kind {
            "person" => Ok(CustomerKind::Person),
            "company" => Ok(CustomerKind::Company),
            other => Err(CustomerKindError::Unknown(other.to_string())),
        }
    }

    /// Storage and wire representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerKind::Person => "person",
            CustomerKind::Company => "company",
        }
    }
}

impl fmt::Display for CustomerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity document value type
///
/// Ensures the document identifier is non-empty and bounded. No structural
/// validation is applied; formats vary by document type and country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document(String);

impl Document {
    const MAX_LENGTH: usize = 64;

    /// Create a new validated document identifier.
    ///
    /// # Arguments
    /// * `document` - Raw document string
    ///
    /// # Errors
    /// * `Empty` - Document is empty
    /// * `TooLong` - Document exceeds 64 characters
    pub fn new(document: String) -> Result<Self, DocumentError> {
        let length = document.len();
        if length == 0 {
            Err(DocumentError::Empty)
        } else if length > Self::MAX_LENGTH {
            Err(DocumentError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(document))
        }
    }

    /// Get document as string slice.
    ///
    /// # Returns
    /// Document string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Customer profile unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomerProfileId(pub i64);

impl fmt::Display for CustomerProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Business-facing customer record linked to exactly one account.
///
/// Created only through customer self-registration, in the same atomic unit
/// as its owning account.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub id: CustomerProfileId,
    pub company_id: CompanyId,
    pub account_id: AccountId,
    pub customer_kind: CustomerKind,
    pub document: String,
    pub document_type: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub rating: Decimal,
    pub rental_count: i32,
    pub damage_count: i32,
    pub activation: Activation,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Command to register an account on behalf of a caller (back office).
#[derive(Debug)]
pub struct RegisterInternalCommand {
    pub username: Username,
    pub email: EmailAddress,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub company_id: Option<CompanyId>,
    pub role_id: Option<RoleId>,
}

/// Command for customer self-registration.
///
/// The email doubles as the login username of the created account.
#[derive(Debug)]
pub struct RegisterCustomerCommand {
    pub name: String,
    pub email: EmailAddress,
    pub password: String,
    pub phone: Option<String>,
    pub company_id: CompanyId,
    pub customer_kind: CustomerKind,
    pub document: Document,
    pub document_type: String,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Write model for a new account row.
#[derive(Debug)]
pub struct NewAccount {
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub company_id: Option<CompanyId>,
    pub role: Role,
    pub activation: Activation,
}

/// Write model for a new customer profile row.
///
/// Rating and lifetime counters are defaulted by the store (5.0 and 0).
#[derive(Debug)]
pub struct NewCustomerProfile {
    pub company_id: CompanyId,
    pub customer_kind: CustomerKind,
    pub document: Document,
    pub document_type: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub activation: Activation,
}

/// Result of a customer self-registration.
///
/// The token is present only for person customers; company registrations
/// stay inactive until approved and carry a pending-activation message.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub account: Account,
    pub profile: CustomerProfile,
    pub token: Option<IssuedToken>,
    pub message: &'static str,
}
