//! Roster data model and the role hierarchy.
//!
//! Every management and visibility rule lives on [`Role`] and [`Actor`] so
//! services and adapters never compare roles ad hoc.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum accepted length for an email address.
pub const EMAIL_MAX: usize = 255;
/// Maximum accepted length for a user's display name.
pub const USER_NAME_MAX: usize = 100;

/// Validation errors for roster values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier was zero or negative.
    #[error("user id must be a positive integer")]
    InvalidId,
    /// Email was blank.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email did not look like `local@domain`.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Email exceeded [`EMAIL_MAX`].
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum length.
        max: usize,
    },
    /// Name was blank.
    #[error("name must not be empty")]
    EmptyName,
    /// Name exceeded [`USER_NAME_MAX`].
    #[error("name must be at most {max} characters")]
    NameTooLong {
        /// Maximum length.
        max: usize,
    },
    /// Role string was not one of the known roles.
    #[error("role must be one of user, admin, super_admin")]
    UnknownRole,
}

/// Database-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: i64) -> Result<Self, UserValidationError> {
        if id <= 0 {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed role hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Driver or field worker; sees only their own data.
    User,
    /// Supervisor; manages the plain users they created.
    Admin,
    /// Unrestricted operator.
    SuperAdmin,
}

impl Role {
    /// Wire and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// True for roles allowed to read other users' data.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// Whether an account holding this role may hand out `role`.
    ///
    /// # Examples
    /// ```
    /// use fleet_tracker::domain::Role;
    ///
    /// assert!(Role::SuperAdmin.can_assign_role(Role::SuperAdmin));
    /// assert!(Role::Admin.can_assign_role(Role::User));
    /// assert!(!Role::Admin.can_assign_role(Role::Admin));
    /// ```
    #[must_use]
    pub const fn can_assign_role(self, role: Role) -> bool {
        match self {
            Self::SuperAdmin => true,
            Self::Admin => matches!(role, Self::User),
            Self::User => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(UserValidationError::UnknownRole),
        }
    }
}

/// Normalised, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Human-readable user name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate a display name, trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if trimmed.chars().count() > USER_NAME_MAX {
            return Err(UserValidationError::NameTooLong {
                max: USER_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

/// Roster entry.
///
/// ## Invariants
/// - `created_by`, when set, references a different user and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identifier.
    pub id: UserId,
    /// Unique login email.
    pub email: Email,
    /// Display name.
    pub name: UserName,
    /// Role in the hierarchy.
    pub role: Role,
    /// Disabled accounts cannot log in.
    pub is_active: bool,
    /// Admin or super admin that created this account.
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Values required to insert a roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique login email.
    pub email: Email,
    /// Display name.
    pub name: UserName,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Role in the hierarchy.
    pub role: Role,
    /// Initial active flag.
    pub is_active: bool,
    /// Creator, if any.
    pub created_by: Option<UserId>,
}

/// Partial update applied to a roster entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// New email.
    pub email: Option<Email>,
    /// New display name.
    pub name: Option<UserName>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New active flag.
    pub is_active: Option<bool>,
}

impl UserChanges {
    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

/// Stored credentials for a roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    /// The account.
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Subset of the roster visible to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterScope {
    /// Every account.
    All,
    /// Accounts created by the given user.
    CreatedBy(UserId),
}

/// The authenticated caller of a driving port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Caller identifier.
    pub id: UserId,
    /// Caller role at authentication time.
    pub role: Role,
}

impl Actor {
    /// Construct an actor.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Roster visible to this actor, or `None` for plain users.
    #[must_use]
    pub const fn roster_scope(&self) -> Option<RosterScope> {
        match self.role {
            Role::SuperAdmin => Some(RosterScope::All),
            Role::Admin => Some(RosterScope::CreatedBy(self.id)),
            Role::User => None,
        }
    }

    /// Whether `target` belongs to this actor's roster.
    #[must_use]
    pub fn can_view(&self, target: &User) -> bool {
        match self.roster_scope() {
            Some(RosterScope::All) => true,
            Some(RosterScope::CreatedBy(creator)) => target.created_by == Some(creator),
            None => false,
        }
    }

    /// Whether this actor may update or delete `target`.
    ///
    /// Super admins manage everyone; admins manage only plain users they
    /// created; plain users manage nobody.
    #[must_use]
    pub fn can_manage(&self, target: &User) -> bool {
        match self.role {
            Role::SuperAdmin => true,
            Role::Admin => target.role == Role::User && target.created_by == Some(self.id),
            Role::User => false,
        }
    }

    /// Whether this actor may create or promote an account to `role`.
    #[must_use]
    pub const fn can_assign_role(&self, role: Role) -> bool {
        self.role.can_assign_role(role)
    }
}
