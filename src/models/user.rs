//! User (authentication identity) model, roles and access checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as TEXT)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// User row from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub member_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// User query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
}

/// Update user request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    /// Link to a member profile; `null` leaves the link unchanged
    pub member_id: Option<i32>,
}

/// Signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct Signup {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub name: String,
    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Update own profile request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

impl UpdateProfile {
    /// Whether any member-profile field is being changed
    pub fn touches_member(&self) -> bool {
        self.name.is_some()
            || self.phone.is_some()
            || self.address.is_some()
            || self.profile_picture.is_some()
    }
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub member_id: Option<i32>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// Identity of the user making a request, loaded fresh from the users table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    pub member_id: Option<i32>,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            member_id: user.member_id,
        }
    }
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// True when the record belongs to the caller's own member profile.
    /// Orphaned records (owner `None`) belong to nobody.
    pub fn owns(&self, owner: Option<i32>) -> bool {
        matches!((self.member_id, owner), (Some(mine), Some(theirs)) if mine == theirs)
    }

    /// Admins may act on anything, members only on what they own
    pub fn require_owner_or_admin(&self, owner: Option<i32>, what: &str) -> Result<(), AppError> {
        if self.is_admin() || self.owns(owner) {
            Ok(())
        } else {
            tracing::warn!(user_id = self.user_id, "Rejected access to another member's {}", what);
            Err(AppError::Authorization(format!("You can only access your own {}", what)))
        }
    }

    /// The caller's linked member profile
    pub fn require_member_id(&self) -> Result<i32, AppError> {
        self.member_id.ok_or_else(|| {
            AppError::Validation(
                "Member profile not found. Please contact administrator.".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn caller(role: Role, member_id: Option<i32>) -> Caller {
        Caller {
            user_id: 1,
            email: "reader@example.com".to_string(),
            role,
            member_id,
        }
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert!("librarian".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(serde_json::to_string(&Role::Member).unwrap(), "\"member\"");
    }

    #[test]
    fn test_member_owns_only_own_records() {
        let member = caller(Role::Member, Some(7));
        assert!(member.owns(Some(7)));
        assert!(!member.owns(Some(8)));
        assert!(!member.owns(None));
        assert!(member.require_owner_or_admin(Some(7), "borrowings").is_ok());
        assert!(matches!(
            member.require_owner_or_admin(Some(8), "borrowings"),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_member_without_profile_owns_nothing() {
        let member = caller(Role::Member, None);
        assert!(!member.owns(None));
        assert!(matches!(member.require_member_id(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_admin_can_access_everything() {
        let admin = caller(Role::Admin, None);
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_owner_or_admin(Some(42), "borrowings").is_ok());
        assert!(admin.require_owner_or_admin(None, "borrowings").is_ok());
        assert!(caller(Role::Member, Some(1)).require_admin().is_err());
    }

    #[test]
    fn test_token_round_trip() {
        let now = Utc::now();
        let claims = UserClaims {
            sub: "5".to_string(),
            user_id: 5,
            role: Role::Member,
            member_id: Some(3),
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };
        let token = claims.create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, 5);
        assert_eq!(decoded.role, Role::Member);
        assert_eq!(decoded.member_id, Some(3));
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let claims = UserClaims {
            sub: "5".to_string(),
            user_id: 5,
            role: Role::Admin,
            member_id: None,
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
        };
        let token = claims.create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_profile_touches_member() {
        let profile = UpdateProfile {
            name: None,
            email: Some("new@example.com".to_string()),
            phone: None,
            address: None,
            profile_picture: None,
            password: Some("secret1".to_string()),
        };
        assert!(!profile.touches_member());
        assert!(profile.validate().is_ok());
    }
}
