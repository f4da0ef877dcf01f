//! Business logic services

pub mod auth;
pub mod books;
pub mod borrowings;
pub mod dashboard;
pub mod email;
pub mod members;
pub mod reminders;
pub mod subscriptions;
pub mod testimonials;
pub mod users;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub members: members::MembersService,
    pub borrowings: borrowings::BorrowingsService,
    pub users: users::UsersService,
    pub testimonials: testimonials::TestimonialsService,
    pub subscriptions: subscriptions::SubscriptionsService,
    pub dashboard: dashboard::DashboardService,
    pub email: email::EmailService,
    pub reminders: reminders::RemindersService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let email = email::EmailService::new(config.email.clone());

        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            books: books::BooksService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            borrowings: borrowings::BorrowingsService::new(repository.clone(), config.lending.clone()),
            users: users::UsersService::new(repository.clone()),
            testimonials: testimonials::TestimonialsService::new(repository.clone()),
            subscriptions: subscriptions::SubscriptionsService::new(repository.clone()),
            dashboard: dashboard::DashboardService::new(repository.clone()),
            reminders: reminders::RemindersService::new(
                repository.clone(),
                email.clone(),
                config.reminders.clone(),
            ),
            email,
            repository,
        }
    }
}
