//! Member (library patron) model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::user::{Role, User};

/// Member with the role of its linked user account, if any
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub membership_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Role of the linked user account
    pub user_role: Option<Role>,
}

/// Short member representation embedded in borrowings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberShort {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Member query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MemberQuery {
    /// Case-insensitive search in name, email and phone
    pub search: Option<String>,
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub per_page: Option<i64>,
}

/// Create member request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMember {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    /// Create a login for this member
    #[serde(default)]
    pub create_user_account: bool,
    /// Role of the created account (default: member)
    pub role: Option<Role>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// Update member request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMember {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"), custom(function = "crate::models::not_blank"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    /// Update (or create) the linked login
    #[serde(default)]
    pub update_user_account: bool,
    pub role: Option<Role>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// Login status of a member
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberAccount {
    pub has_user_account: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl From<Option<&User>> for MemberAccount {
    fn from(user: Option<&User>) -> Self {
        match user {
            Some(user) => Self {
                has_user_account: true,
                role: Some(user.role),
                is_active: Some(user.is_active),
            },
            None => Self {
                has_user_account: false,
                role: None,
                is_active: None,
            },
        }
    }
}

/// Login details to attach to a member, already hashed
#[derive(Debug, Clone)]
pub struct AccountChange {
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}
