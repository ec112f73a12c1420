use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::errors::EmailError;
use crate::domain::account::models::CompanyId;
use crate::domain::account::models::EmailAddress;
use crate::domain::registration::errors::CustomerKindError;
use crate::domain::registration::errors::DocumentError;
use crate::domain::registration::models::CustomerKind;
use crate::domain::registration::models::CustomerProfile;
use crate::domain::registration::models::Document;
use crate::domain::registration::models::RegisterCustomerCommand;
use crate::domain::registration::models::RegistrationOutcome;
use crate::domain::registration::ports::RegistrationServicePort;
use crate::domain::token::IssuedToken;
use crate::inbound::http::router::AppState;

pub async fn register_customer(
    State(state): State<AppState>,
    Json(body): Json<RegisterCustomerRequestBody>,
) -> Result<ApiSuccess<RegisterCustomerResponseData>, ApiError> {
    state
        .registration_service
        .register_customer(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref outcome| ApiSuccess::new(StatusCode::CREATED, outcome.into()))
}

/// HTTP request body for customer self-registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterCustomerRequestBody {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
    company_id: i64,
    customer_type: String,
    document: String,
    document_type: String,
    address: Option<String>,
    city: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterCustomerError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),

    #[error("Invalid customer type: {0}")]
    CustomerKind(#[from] CustomerKindError),
}

impl RegisterCustomerRequestBody {
    fn try_into_command(self) -> Result<RegisterCustomerCommand, ParseRegisterCustomerError> {
        let email = EmailAddress::new(self.email)?;
        let customer_kind = CustomerKind::new(&self.customer_type)?;
        let document = Document::new(self.document)?;
        Ok(RegisterCustomerCommand {
            name: self.name,
            email,
            password: self.password,
            phone: self.phone,
            company_id: CompanyId(self.company_id),
            customer_kind,
            document,
            document_type: self.document_type,
            address: self.address,
            city: self.city,
        })
    }
}

impl From<ParseRegisterCustomerError> for ApiError {
    fn from(err: ParseRegisterCustomerError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterCustomerResponseData {
    pub account: AccountData,
    pub profile: CustomerProfileData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionTokenData>,
    pub message: String,
}

impl From<&RegistrationOutcome> for RegisterCustomerResponseData {
    fn from(outcome: &RegistrationOutcome) -> Self {
        Self {
            account: (&outcome.account).into(),
            profile: (&outcome.profile).into(),
            session: outcome.token.as_ref().map(SessionTokenData::from),
            message: outcome.message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionTokenData {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&IssuedToken> for SessionTokenData {
    fn from(token: &IssuedToken) -> Self {
        Self {
            token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at: token.expires_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerProfileData {
    pub id: i64,
    pub company_id: i64,
    pub account_id: i64,
    pub customer_type: String,
    pub document: String,
    pub document_type: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub rating: Decimal,
    pub rental_count: i32,
    pub damage_count: i32,
    pub status: String,
}

impl From<&CustomerProfile> for CustomerProfileData {
    fn from(profile: &CustomerProfile) -> Self {
        Self {
            id: profile.id.0,
            company_id: profile.company_id.0,
            account_id: profile.account_id.0,
            customer_type: profile.customer_kind.as_str().to_string(),
            document: profile.document.clone(),
            document_type: profile.document_type.clone(),
            address: profile.address.clone(),
            city: profile.city.clone(),
            rating: profile.rating,
            rental_count: profile.rental_count,
            damage_count: profile.damage_count,
            status: profile.activation.as_str().to_string(),
        }
    }
}
