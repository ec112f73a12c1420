use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::AccountData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::account::errors::EmailError;
use crate::domain::account::errors::UsernameError;
use crate::domain::account::models::CompanyId;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::RoleId;
use crate::domain::account::models::Session;
use crate::domain::account::models::Username;
use crate::domain::registration::models::RegisterInternalCommand;
use crate::domain::registration::ports::RegistrationServicePort;
use crate::inbound::http::router::AppState;

pub async fn create_account(
    State(state): State<AppState>,
    Json(body): Json<CreateAccountRequestBody>,
) -> Result<ApiSuccess<CreateAccountResponseData>, ApiError> {
    state
        .registration_service
        .register_internal(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::CREATED, session.into()))
}

/// HTTP request body for registering an account on behalf of a caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateAccountRequestBody {
    username: String,
    email: String,
    password: String,
    name: String,
    phone: Option<String>,
    company_id: Option<i64>,
    role_id: Option<i64>,
}

#[derive(Debug, Clone, Error)]
enum ParseCreateAccountError {
    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),
}

impl CreateAccountRequestBody {
    fn try_into_command(self) -> Result<RegisterInternalCommand, ParseCreateAccountError> {
        let username = Username::new(self.username)?;
        let email = EmailAddress::new(self.email)?;
        Ok(RegisterInternalCommand {
            username,
            email,
            password: self.password,
            name: self.name,
            phone: self.phone,
            company_id: self.company_id.map(CompanyId),
            role_id: self.role_id.map(RoleId),
        })
    }
}

impl From<ParseCreateAccountError> for ApiError {
    fn from(err: ParseCreateAccountError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateAccountResponseData {
    pub account: AccountData,
    pub token: String,
}

impl From<&Session> for CreateAccountResponseData {
    fn from(session: &Session) -> Self {
        Self {
            account: (&session.account).into(),
            token: session.token.access_token.clone(),
        }
    }
}
