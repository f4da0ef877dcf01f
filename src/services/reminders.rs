//! Due-date reminder emails

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::RemindersConfig,
    error::AppResult,
    lending::overdue,
    models::borrowing::DueReminder,
    repository::Repository,
    services::{borrowings::BorrowingsService, email::EmailService},
};

/// Outcome of one reminder pass
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReminderReport {
    pub due_soon: usize,
    pub overdue: usize,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct RemindersService {
    repository: Repository,
    email: EmailService,
    config: RemindersConfig,
}

impl RemindersService {
    pub fn new(repository: Repository, email: EmailService, config: RemindersConfig) -> Self {
        Self {
            repository,
            email,
            config,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn interval_hours(&self) -> u64 {
        self.config.interval_hours.max(1)
    }

    /// Email every member with a book overdue or due soon. Failed sends are
    /// logged and counted; they never stop the pass.
    pub async fn run(&self, today: NaiveDate) -> AppResult<ReminderReport> {
        let until = today + chrono::Duration::days(self.config.days_ahead.max(0));
        let reminders = self.repository.borrowings.due_for_reminder(until).await?;

        let mut report = ReminderReport::default();
        for reminder in &reminders {
            if overdue::is_overdue(None, reminder.due_date, today) {
                report.overdue += 1;
            } else {
                report.due_soon += 1;
            }

            let (subject, body) = reminder_email(reminder, today);
            match self.email.send_email(&reminder.member_email, &subject, &body).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(borrowing_id = reminder.id, error = %e, "Failed to send reminder");
                }
            }
        }

        tracing::info!(
            due_soon = report.due_soon,
            overdue = report.overdue,
            sent = report.sent,
            failed = report.failed,
            "Reminder pass finished"
        );
        Ok(report)
    }

    /// Run a pass every `interval_hours` until the process exits
    pub async fn run_periodically(self) {
        let period = std::time::Duration::from_secs(self.interval_hours() * 3600);
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(e) = self.run(BorrowingsService::today()).await {
                tracing::error!(error = %e, "Reminder pass failed");
            }
        }
    }
}

/// Subject and body of the reminder for one borrowing
pub fn reminder_email(reminder: &DueReminder, today: NaiveDate) -> (String, String) {
    let days_late = overdue::days_overdue(None, reminder.due_date, today);

    if days_late > 0 {
        let subject = format!("Overdue: \"{}\"", reminder.book_title);
        let body = format!(
            r#"
Hello {name},

"{title}" was due on {due} and is now {days} day(s) overdue.
Please return it to the library as soon as possible. Late returns are fined per day.

Neighborhood Library
"#,
            name = reminder.member_name,
            title = reminder.book_title,
            due = reminder.due_date,
            days = days_late
        );
        (subject, body)
    } else {
        let days_left = (reminder.due_date - today).num_days();
        let when = match days_left {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            n => format!("in {} days", n),
        };
        let subject = format!("Reminder: \"{}\" is due {}", reminder.book_title, when);
        let body = format!(
            r#"
Hello {name},

This is a reminder that "{title}" is due back {when} ({due}).

Neighborhood Library
"#,
            name = reminder.member_name,
            title = reminder.book_title,
            when = when,
            due = reminder.due_date
        );
        (subject, body)
    }
}
