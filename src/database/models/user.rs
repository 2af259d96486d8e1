use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Closed role enumeration. Stored as text (canonical PascalCase), parsed
/// case-insensitively on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Sensor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
            Role::Sensor => "Sensor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            "sensor" => Ok(Role::Sensor),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

// Roles live in a TEXT column; delegate to the string codecs.
impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse::<Role>()?)
    }
}

/// Full user row including the password hash. Deliberately not `Serialize`:
/// the hash can never leak into a response body.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Hash-free view of a user; the shape every read endpoint returns.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for PublicUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            role: record.role,
            last_login: record.last_login,
            created_at: record.created_at,
        }
    }
}

/// Columns backing [`PublicUser`], used as the default projection so the
/// hash column never leaves the database unless explicitly requested.
pub const PUBLIC_USER_COLUMNS: [&str; 6] =
    ["id", "name", "email", "role", "last_login", "created_at"];

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

impl RegisterInput {
    /// Validate all fields, resolving the requested role (default Student).
    pub fn validate(&self) -> Result<Role, ValidationError> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;

        match &self.role {
            None => Ok(Role::Student),
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|_| ValidationError::new("role", format!("Unknown role: {}", raw))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserUpdateInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UserUpdateInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
    }

    /// Validate whichever fields are present, resolving the role if given.
    pub fn validate(&self) -> Result<Option<Role>, ValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        match &self.role {
            None => Ok(None),
            Some(raw) => raw
                .parse::<Role>()
                .map(Some)
                .map_err(|_| ValidationError::new("role", format!("Unknown role: {}", raw))),
        }
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len < 3 {
        return Err(ValidationError::new(
            "name",
            "Name must be more than 3 characters",
        ));
    }
    if len > 30 {
        return Err(ValidationError::new(
            "name",
            "Name must be less than 30 characters",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("email", "Please enter a valid email address");

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() => {
            if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
                return Err(invalid());
            }
            Ok(())
        }
        _ => Err(invalid()),
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters long",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive_with_canonical_output() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("SENSOR".parse::<Role>().unwrap(), Role::Sensor);
        assert_eq!(Role::Teacher.to_string(), "Teacher");
        assert!("superuser".parse::<Role>().is_err());
    }

    fn input(name: &str, email: &str, password: &str, role: Option<&str>) -> RegisterInput {
        RegisterInput {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn registration_defaults_to_student() {
        let role = input("Ada Lovelace", "ada@example.com", "difference engine", None)
            .validate()
            .unwrap();
        assert_eq!(role, Role::Student);
    }

    #[test]
    fn registration_rejects_short_name_and_password() {
        assert_eq!(
            input("Al", "al@example.com", "longenough", None)
                .validate()
                .unwrap_err()
                .field,
            "name"
        );
        assert_eq!(
            input("Alan Turing", "alan@example.com", "short", None)
                .validate()
                .unwrap_err()
                .field,
            "password"
        );
    }

    #[test]
    fn registration_rejects_bad_emails() {
        for email in ["", "no-at-sign", "two@@signs", "@nolocal.com", "user@nodot", "spa ce@x.com"] {
            let err = input("Valid Name", email, "longenough", None)
                .validate()
                .unwrap_err();
            assert_eq!(err.field, "email", "expected rejection for {:?}", email);
        }
    }

    #[test]
    fn registration_rejects_unknown_role() {
        let err = input("Valid Name", "v@example.com", "longenough", Some("root"))
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "role");
    }

    #[test]
    fn update_validates_only_present_fields() {
        let update = UserUpdateInput {
            role: Some("teacher".to_string()),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap(), Some(Role::Teacher));

        let empty = UserUpdateInput::default();
        assert!(empty.is_empty());
        assert_eq!(empty.validate().unwrap(), None);
    }

    #[test]
    fn public_user_serialization_has_no_password_field() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            role: Role::Admin,
            last_login: Utc::now(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], serde_json::json!("Admin"));
    }
}
