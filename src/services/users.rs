//! User account administration service

use crate::{
    error::{AppError, AppResult},
    models::user::{Caller, Role, UpdateUser, User, UserQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &UserQuery, limit: i64, offset: i64) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(query, limit, offset).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Change role, active flag or member link of a user
    pub async fn update(&self, caller: &Caller, id: i32, update: UpdateUser) -> AppResult<User> {
        if id == caller.user_id
            && (update.role == Some(Role::Member) || update.is_active == Some(false))
        {
            return Err(AppError::Validation(
                "You cannot demote or deactivate your own account".to_string(),
            ));
        }

        self.repository.users.get_by_id(id).await?;

        if let Some(member_id) = update.member_id {
            self.repository.members.get_by_id(member_id).await?;
        }

        let user = self.repository.users.update(id, &update).await?;
        tracing::info!(
            user_id = id,
            role = %user.role,
            is_active = user.is_active,
            by = caller.user_id,
            "User updated"
        );
        Ok(user)
    }
}
