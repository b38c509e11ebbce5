//! Shared page chrome: header navigation, error pages and template rendering.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::errors::AppError;

/// Top-level navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Home,
    About,
    Collection,
    Contact,
}

impl Section {
    const NAV: [Section; 4] = [
        Section::Home,
        Section::About,
        Section::Collection,
        Section::Contact,
    ];

    fn href(&self) -> &'static str {
        match self {
            Section::Home => "/",
            Section::About => "/about",
            Section::Collection => "/collection",
            Section::Contact => "/contact",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Section::Home => "Home",
            Section::About => "About",
            Section::Collection => "Collection",
            Section::Contact => "Contact",
        }
    }
}

/// One header link; `active` marks the current section.
#[derive(Debug, Clone)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
    pub active: bool,
}

pub fn nav(current: Option<Section>) -> Vec<NavLink> {
    Section::NAV
        .iter()
        .map(|section| NavLink {
            href: section.href(),
            label: section.label(),
            active: Some(*section) == current,
        })
        .collect()
}

/// Render a template into an HTML response.
pub fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(body) => Html(body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Template rendering failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Template error: {err}"),
            )
                .into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub nav: Vec<NavLink>,
    pub status: u16,
    pub heading: &'static str,
    pub message: String,
}

pub fn error_page(status: StatusCode, message: &str) -> ErrorTemplate {
    ErrorTemplate {
        nav: nav(None),
        status: status.as_u16(),
        heading: status.canonical_reason().unwrap_or("Error"),
        message: message.to_string(),
    }
}

/// Router fallback for unknown pages.
pub async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_marks_current_section() {
        let links = nav(Some(Section::About));
        assert_eq!(links.len(), 4);
        assert!(links.iter().filter(|l| l.active).all(|l| l.href == "/about"));
        assert_eq!(links.iter().filter(|l| l.active).count(), 1);
        assert!(nav(None).iter().all(|l| !l.active));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let html = error_page(StatusCode::NOT_FOUND, "<b>gone</b>")
            .render()
            .unwrap();
        assert!(html.contains("404 Not Found"));
        assert!(html.contains("&lt;b&gt;gone&lt;/b&gt;"));
        assert!(!html.contains("<b>gone"));
        assert!(html.contains("Crafted with heritage and passion."));
    }

    #[test]
    fn test_render_sets_html_content_type() {
        let response = render(error_page(StatusCode::BAD_REQUEST, "nope"));
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[axum::http::header::CONTENT_TYPE]
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("text/html"));
    }
}
