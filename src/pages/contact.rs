//! Contact page and form submission.

use askama::Template;
use axum::extract::State;
use axum::response::Response;
use axum::Form;
use serde::Deserialize;

use super::layout::{nav, render, NavLink, Section};
use crate::backend::{BackendError, Client};
use crate::models::ContactMessage;
use crate::AppState;

pub const FIELDS_REQUIRED: &str = "Please fill in all fields";
pub const SENT: &str = "Thank you for your message! We'll get back to you soon.";
pub const SEND_FAILED: &str = "Failed to send message. Please try again.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Outcome banner for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Sent,
    Failed(String),
}

/// Store a message with the public key.
pub async fn send_message(client: &Client, message: &ContactMessage) -> Result<(), BackendError> {
    client
        .from(ContactMessage::TABLE)
        .insert(message)?
        .execute()
        .await
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub nav: Vec<NavLink>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub sent: Option<&'static str>,
    pub failed: Option<String>,
}

impl ContactTemplate {
    pub fn new(form: ContactForm, notice: Option<Notice>) -> Self {
        let (sent, failed) = match notice {
            None => (None, None),
            Some(Notice::Sent) => (Some(SENT), None),
            Some(Notice::Failed(text)) => (None, Some(text)),
        };
        Self {
            nav: nav(Some(Section::Contact)),
            name: form.name,
            email: form.email,
            message: form.message,
            sent,
            failed,
        }
    }
}

/// GET /contact
pub async fn contact_page() -> Response {
    render(ContactTemplate::new(ContactForm::default(), None))
}

/// POST /contact - Validate, store, and re-render with the outcome.
pub async fn submit_contact(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> Response {
    let message = ContactMessage {
        name: form.name.clone(),
        email: form.email.clone(),
        message: form.message.clone(),
    };

    let Some(message) = message.normalized() else {
        let notice = Notice::Failed(FIELDS_REQUIRED.to_string());
        return render(ContactTemplate::new(form, Some(notice)));
    };

    match send_message(&state.public, &message).await {
        Ok(()) => {
            tracing::info!("Contact message stored");
            render(ContactTemplate::new(ContactForm::default(), Some(Notice::Sent)))
        }
        Err(err) => {
            tracing::error!(error = %err, "Error sending contact message");
            let text = match err {
                BackendError::Api { message, .. } if !message.trim().is_empty() => message,
                _ => SEND_FAILED.to_string(),
            };
            render(ContactTemplate::new(form, Some(Notice::Failed(text))))
        }
    }
}
