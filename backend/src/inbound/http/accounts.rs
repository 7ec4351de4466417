//! Authentication and roster handlers.
//!
//! ```text
//! POST /auth/login {"email":"admin@fleet.test","password":"secret1"}
//! POST /auth/register {"email":"jo@fleet.test","password":"secret1","name":"Jo"}
//! GET /auth/profile
//! GET /auth/users?search=jo&role=user&isActive=true&page=1&limit=10
//! POST /auth/users
//! GET|PUT|DELETE /auth/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    AccountUpdate, AuthSession, NewAccount, Registration, UserPage, UserProfile, UserQuery,
};
use crate::domain::{
    CredentialsValidationError, Email, Error, LoginCredentials, Password, Role, UserId, UserName,
    UserValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, IS_ACTIVE, LIMIT, PAGE, ROLE, parse_optional_bool, parse_optional_integer,
    parse_optional_role, parse_user_id,
};

const ID: FieldName = FieldName::new("id");

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@fleet.test")]
    pub email: String,
    pub password: String,
}

/// Self-service registration body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Account creation body for admins.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Defaults to `user`.
    pub role: Option<Role>,
    /// Defaults to `true`.
    pub is_active: Option<bool>,
}

/// Partial account update; omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Roster listing filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Case-insensitive name or email substring.
    pub search: Option<String>,
    #[param(value_type = Option<Role>)]
    pub role: Option<String>,
    #[param(value_type = Option<bool>)]
    pub is_active: Option<String>,
    #[param(value_type = Option<u32>, example = 1)]
    pub page: Option<String>,
    #[param(value_type = Option<u32>, example = 10)]
    pub limit: Option<String>,
}

fn user_value_error(err: UserValidationError) -> Error {
    let (field, code) = match err {
        UserValidationError::InvalidId => ("id", "invalid_id"),
        UserValidationError::EmptyEmail => ("email", "empty_email"),
        UserValidationError::InvalidEmail => ("email", "invalid_email"),
        UserValidationError::EmailTooLong { .. } => ("email", "email_too_long"),
        UserValidationError::EmptyName => ("name", "empty_name"),
        UserValidationError::NameTooLong { .. } => ("name", "name_too_long"),
        UserValidationError::UnknownRole => ("role", "invalid_role"),
    };
    Error::invalid_field(field, code, err.to_string())
}

fn credentials_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::Email(inner) => user_value_error(inner),
        CredentialsValidationError::EmptyPassword => {
            Error::invalid_field("password", "empty_password", err.to_string())
        }
        CredentialsValidationError::PasswordTooShort { .. } => {
            Error::invalid_field("password", "password_too_short", err.to_string())
        }
    }
}

fn email(raw: &str) -> Result<Email, Error> {
    Email::new(raw).map_err(user_value_error)
}

fn name(raw: &str) -> Result<UserName, Error> {
    UserName::new(raw).map_err(user_value_error)
}

fn password(raw: &str) -> Result<Password, Error> {
    Password::new(raw).map_err(credentials_error)
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = Error;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password).map_err(credentials_error)
    }
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: email(&value.email)?,
            password: password(&value.password)?,
            name: name(&value.name)?,
        })
    }
}

impl TryFrom<CreateUserRequest> for NewAccount {
    type Error = Error;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: email(&value.email)?,
            password: password(&value.password)?,
            name: name(&value.name)?,
            role: value.role.unwrap_or(Role::User),
            is_active: value.is_active.unwrap_or(true),
        })
    }
}

impl TryFrom<UpdateUserRequest> for AccountUpdate {
    type Error = Error;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: value.email.as_deref().map(email).transpose()?,
            password: value.password.as_deref().map(password).transpose()?,
            name: value.name.as_deref().map(name).transpose()?,
            role: value.role,
            is_active: value.is_active,
        })
    }
}

impl TryFrom<&ListUsersQuery> for UserQuery {
    type Error = Error;

    fn try_from(value: &ListUsersQuery) -> Result<Self, Self::Error> {
        let defaults = UserQuery::default();
        Ok(Self {
            search: value.search.clone(),
            role: parse_optional_role(value.role.as_deref(), ROLE)?,
            is_active: parse_optional_bool(value.is_active.as_deref(), IS_ACTIVE)?,
            page: parse_optional_integer(value.page.as_deref(), PAGE)?.unwrap_or(defaults.page),
            limit: parse_optional_integer(value.limit.as_deref(), LIMIT)?
                .unwrap_or(defaults.limit),
        })
    }
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token and profile", body = AuthSession),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials or disabled account", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthSession>> {
    let credentials = LoginCredentials::try_from(payload.into_inner())?;
    let session = state.accounts.login(&credentials).await?;
    Ok(web::Json(session))
}

/// Create a plain `user` account and log it in.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Token and profile", body = AuthSession),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let session = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(session))
}

/// The caller's own profile.
#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Missing or invalid bearer token", body = Error)
    ),
    tags = ["auth"],
    operation_id = "profile"
)]
#[get("/auth/profile")]
pub async fn profile(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<web::Json<UserProfile>> {
    let account = state.accounts.profile(auth.actor()).await?;
    Ok(web::Json(account))
}

/// Filtered, paged roster. Admins see only accounts they created.
#[utoipa::path(
    get,
    path = "/auth/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Roster page", body = UserPage),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/auth/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<ListUsersQuery>,
) -> ApiResult<web::Json<UserPage>> {
    let query = UserQuery::try_from(&*query)?;
    let page = state.accounts.list_users(auth.actor(), query).await?;
    Ok(web::Json(page))
}

/// Create an account owned by the caller.
#[utoipa::path(
    post,
    path = "/auth/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created account", body = UserProfile),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 403, description = "Role may not be assigned", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/auth/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let account = NewAccount::try_from(payload.into_inner())?;
    let created = state.accounts.create_user(auth.actor(), account).await?;
    Ok(HttpResponse::Created().json(created))
}

/// One account from the caller's roster.
#[utoipa::path(
    get,
    path = "/auth/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Account", body = UserProfile),
        (status = 400, description = "Invalid identifier", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 404, description = "Unknown or not visible", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/auth/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserProfile>> {
    let id: UserId = parse_user_id(&path, ID)?;
    let account = state.accounts.get_user(auth.actor(), id).await?;
    Ok(web::Json(account))
}

/// Update an account the caller manages.
#[utoipa::path(
    put,
    path = "/auth/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated account", body = UserProfile),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 403, description = "Not allowed to manage this account", body = Error),
        (status = 404, description = "Unknown or not visible", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/auth/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserProfile>> {
    let id = parse_user_id(&path, ID)?;
    let update = AccountUpdate::try_from(payload.into_inner())?;
    let account = state.accounts.update_user(auth.actor(), id, update).await?;
    Ok(web::Json(account))
}

/// Delete an account and its samples.
#[utoipa::path(
    delete,
    path = "/auth/users/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 403, description = "Not allowed to manage this account", body = Error),
        (status = 404, description = "Unknown or not visible", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/auth/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    auth: AuthContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path, ID)?;
    state.accounts.delete_user(auth.actor(), id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register every account handler on a service config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(register)
        .service(profile)
        .service(list_users)
        .service(create_user)
        .service(get_user)
        .service(update_user)
        .service(delete_user);
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
