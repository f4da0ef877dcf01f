//! Newsletter subscriptions service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        subscription::{CreateSubscription, Subscription},
        user::Caller,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct SubscriptionsService {
    repository: Repository,
}

impl SubscriptionsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Subscribe an email. Without an explicit member the subscription is
    /// linked to the member with the same email, if any.
    pub async fn subscribe(
        &self,
        caller: Option<&Caller>,
        request: CreateSubscription,
    ) -> AppResult<Subscription> {
        request.validate()?;

        if self.repository.subscriptions.active_exists(&request.email).await? {
            return Err(AppError::Conflict("Email is already subscribed".to_string()));
        }

        let member_id = subscriber_member_id(caller, request.member_id);
        if let Some(member_id) = member_id {
            self.repository.members.get_by_id(member_id).await?;
        }

        let subscription = self
            .repository
            .subscriptions
            .create(&request.email, member_id)
            .await?;
        tracing::info!(subscription_id = subscription.id, "New subscription");
        Ok(subscription)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<(Vec<Subscription>, i64)> {
        self.repository.subscriptions.list(limit, offset).await
    }
}

/// Only admins may attach a subscription to an arbitrary member; members are
/// attached to themselves, anonymous callers only through the email match.
fn subscriber_member_id(caller: Option<&Caller>, requested: Option<i32>) -> Option<i32> {
    match caller {
        Some(caller) if caller.is_admin() => requested,
        Some(caller) => caller.member_id,
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn caller(role: Role, member_id: Option<i32>) -> Caller {
        Caller {
            user_id: 2,
            email: "someone@example.com".to_string(),
            role,
            member_id,
        }
    }

    #[test]
    fn test_anonymous_cannot_pick_member() {
        assert_eq!(subscriber_member_id(None, Some(5)), None);
        assert_eq!(subscriber_member_id(None, None), None);
    }

    #[test]
    fn test_member_is_attached_to_self() {
        let member = caller(Role::Member, Some(3));
        assert_eq!(subscriber_member_id(Some(&member), Some(5)), Some(3));
        assert_eq!(subscriber_member_id(Some(&member), None), Some(3));
    }

    #[test]
    fn test_admin_may_pick_member() {
        let admin = caller(Role::Admin, None);
        assert_eq!(subscriber_member_id(Some(&admin), Some(5)), Some(5));
        assert_eq!(subscriber_member_id(Some(&admin), None), None);
    }
}
