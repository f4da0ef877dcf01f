//! Member management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        member::{AccountChange, CreateMember, Member, MemberAccount, MemberQuery, UpdateMember},
        user::{Caller, Role},
    },
    repository::Repository,
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(&self, query: &MemberQuery, limit: i64, offset: i64) -> AppResult<(Vec<Member>, i64)> {
        self.repository.members.search(query, limit, offset).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        self.repository.members.get_by_id(id).await
    }

    /// Whether a member has a login, and its role and state
    pub async fn account(&self, id: i32) -> AppResult<MemberAccount> {
        self.repository.members.get_by_id(id).await?;
        let user = self.repository.users.get_by_member_id(id).await?;
        Ok(MemberAccount::from(user.as_ref()))
    }

    pub async fn create(&self, member: CreateMember) -> AppResult<Member> {
        member.validate()?;

        if self.repository.members.email_exists(&member.email, None).await? {
            return Err(AppError::Conflict("A member with this email already exists".to_string()));
        }

        let account = if member.create_user_account {
            if self.repository.users.email_exists(&member.email, None).await? {
                return Err(AppError::Conflict("A user with this email already exists".to_string()));
            }
            let password = member.password.as_deref().ok_or_else(|| {
                AppError::Validation("Password is required when creating user account".to_string())
            })?;
            Some(AccountChange {
                role: member.role,
                password_hash: Some(hash_password(password)?),
            })
        } else {
            None
        };

        let created = self.repository.members.create(&member, account).await?;
        tracing::info!(member_id = created.id, with_account = member.create_user_account, "Member created");
        Ok(created)
    }

    pub async fn update(&self, caller: &Caller, id: i32, member: UpdateMember) -> AppResult<Member> {
        member.validate()?;

        if let Some(ref email) = member.email {
            if self.repository.members.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("A member with this email already exists".to_string()));
            }
        }

        let account = if member.update_user_account {
            let password_hash = match member.password {
                Some(ref password) => Some(hash_password(password)?),
                None => None,
            };
            Some(AccountChange {
                role: member.role,
                password_hash,
            })
        } else {
            None
        };
        ensure_keeps_own_role(caller, id, account.as_ref())?;

        let updated = self.repository.members.update(id, &member, account).await?;
        tracing::info!(member_id = id, "Member updated");
        Ok(updated)
    }

    pub async fn delete(&self, caller: &Caller, id: i32) -> AppResult<()> {
        ensure_not_own_profile(caller, id)?;

        self.repository.members.delete(id).await?;
        tracing::info!(member_id = id, by = caller.user_id, "Member deleted");
        Ok(())
    }
}

/// An admin editing their own member profile may not demote their own login
fn ensure_keeps_own_role(caller: &Caller, member_id: i32, account: Option<&AccountChange>) -> AppResult<()> {
    let demotes = matches!(account, Some(AccountChange { role: Some(Role::Member), .. }));
    if caller.is_admin() && caller.member_id == Some(member_id) && demotes {
        return Err(AppError::Validation(
            "You cannot demote or deactivate your own account".to_string(),
        ));
    }
    Ok(())
}

/// Deleting a member deletes its login, so nobody may delete their own profile
fn ensure_not_own_profile(caller: &Caller, member_id: i32) -> AppResult<()> {
    if caller.member_id == Some(member_id) {
        return Err(AppError::Validation(
            "You cannot delete your own member profile".to_string(),
        ));
    }
    Ok(())
}
