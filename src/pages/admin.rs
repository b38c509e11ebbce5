//! Admin login and content editor pages.
//!
//! Every editor action is a form post that redirects back to the dashboard
//! tab; the outcome shows up as the dashboard's status banner or form error.

use std::sync::Arc;

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::layout::render;
use crate::admin::{Dashboard, DashboardView, EditError, HeroForm, StatusKind, Tab};
use crate::errors::AppError;
use crate::models::{GalleryImage, GalleryImageUpdate, Testimonial, TestimonialUpdate, User};
use crate::session::{expired_visitor_cookie, visitor_cookie, Visitor};
use crate::AppState;

pub const LOGIN_PATH: &str = "/admin/login";
pub const DASHBOARD_PATH: &str = "/admin/dashboard";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub edit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HeroInput {
    pub title: String,
    pub subtitle: String,
    pub cta_text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GalleryInput {
    pub image_url: String,
    pub alt_text: String,
    /// Only read on update; blank keeps the current position
    pub order_index: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestimonialInput {
    pub name: String,
    pub content: String,
    pub order_index: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmInput {
    pub confirm: String,
}

/// Dashboard URL for `tab`, optionally with a record in edit mode. The
/// query is form-encoded, so any record id survives the round trip.
fn tab_url(tab: Tab, edit: Option<&str>) -> String {
    let mut query = vec![("tab", tab.as_str())];
    if let Some(id) = edit {
        query.push(("edit", id));
    }
    match serde_urlencoded::to_string(&query) {
        Ok(query) => format!("{}?{}", DASHBOARD_PATH, query),
        Err(_) => format!("{}?tab={}", DASHBOARD_PATH, tab.as_str()),
    }
}

fn parse_order_index(raw: &str) -> Result<Option<i64>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest("Order index must be a whole number.".to_string()))
}

/// The request's visitor, if its session is still good. Visitors whose
/// session has ended are dropped.
async fn signed_in(state: &AppState, jar: &CookieJar) -> Option<Arc<Visitor>> {
    let visitor = state.visitors.find(jar)?;
    visitor.session().revalidate().await;
    if visitor.session().is_logged_in() {
        return Some(visitor);
    }
    tracing::info!(visitor = %visitor.id(), "Session ended; dropping visitor");
    visitor.unmount_dashboard().await;
    state.visitors.remove(visitor.id());
    None
}

async fn editor(state: &AppState, jar: &CookieJar) -> Result<Arc<Dashboard>, AppError> {
    let visitor = signed_in(state, jar)
        .await
        .ok_or_else(|| AppError::Unauthorized("Please sign in to edit content.".to_string()))?;
    Ok(visitor.dashboard().await)
}

/// Back to `tab` once an action has run. Failures are already on the
/// dashboard; only an unknown record turns into an error page.
fn settle<T>(
    result: Result<T, EditError>,
    tab: Tab,
    edit_on_error: Option<&str>,
) -> Result<Redirect, AppError> {
    match result {
        Ok(_) => Ok(Redirect::to(&tab_url(tab, None))),
        Err(err @ EditError::UnknownRecord(_)) => Err(err.into()),
        Err(EditError::Declined) => Ok(Redirect::to(&tab_url(tab, None))),
        Err(err) => {
            tracing::debug!(error = %err, "Edit not applied");
            Ok(Redirect::to(&tab_url(tab, edit_on_error)))
        }
    }
}

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
}

#[derive(Template)]
#[template(path = "admin/loading.html")]
pub struct LoadingTemplate;

/// GET /admin/login
pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if signed_in(&state, &jar).await.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    render(LoginTemplate {
        error: None,
        email: String::new(),
    })
}

/// POST /admin/login - Sign in and bind this browser to a new visitor context.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if signed_in(&state, &jar).await.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let visitor = Visitor::start(&state.backend).await;
    match visitor.session().login(&form.email, &form.password).await {
        Ok(_) => {
            state.visitors.insert(visitor.clone());
            tracing::debug!(visitors = state.visitors.count(), "Visitor context created");
            (
                jar.add(visitor_cookie(visitor.id())),
                Redirect::to(DASHBOARD_PATH),
            )
                .into_response()
        }
        Err(err) => {
            visitor.teardown();
            render(LoginTemplate {
                error: Some(err.message),
                email: form.email,
            })
        }
    }
}

/// POST /admin/logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(visitor) = state.visitors.find(&jar) {
        visitor.unmount_dashboard().await;
        visitor.session().logout().await;
        state.visitors.remove(visitor.id());
    }
    (jar.add(expired_visitor_cookie()), Redirect::to(LOGIN_PATH)).into_response()
}

pub struct TabLink {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

pub struct StatusBanner {
    pub class: &'static str,
    pub text: String,
}

pub struct GalleryRow {
    pub image: GalleryImage,
    pub editing: bool,
    pub action: String,
    pub edit_href: String,
}

pub struct TestimonialRow {
    pub testimonial: Testimonial,
    pub editing: bool,
    pub action: String,
    pub edit_href: String,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub user: String,
    pub tabs: Vec<TabLink>,
    pub tab: &'static str,
    pub status: Option<StatusBanner>,
    pub form_error: Option<String>,
    pub hero: HeroForm,
    pub gallery: Vec<GalleryRow>,
    pub testimonials: Vec<TestimonialRow>,
    pub saving: bool,
    pub cancel_href: String,
}

pub fn render_dashboard(user: &User, tab: Tab, view: DashboardView) -> DashboardTemplate {
    let editing = view.editing.as_deref();
    let is_editing = |id: &str| editing == Some(id);

    let gallery = view
        .gallery
        .into_iter()
        .map(|image| GalleryRow {
            editing: is_editing(&image.id),
            action: format!("/admin/gallery/{}", image.id),
            edit_href: tab_url(Tab::Gallery, Some(&image.id)),
            image,
        })
        .collect();

    let testimonials = view
        .testimonials
        .into_iter()
        .map(|testimonial| TestimonialRow {
            editing: is_editing(&testimonial.id),
            action: format!("/admin/testimonials/{}", testimonial.id),
            edit_href: tab_url(Tab::Testimonials, Some(&testimonial.id)),
            testimonial,
        })
        .collect();

    let status = view.status.map(|status| StatusBanner {
        class: match status.kind {
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        },
        text: status.text,
    });

    DashboardTemplate {
        user: user.email.clone().unwrap_or_else(|| user.id.clone()),
        tabs: Tab::ALL
            .iter()
            .map(|t| TabLink {
                href: tab_url(*t, None),
                label: t.label(),
                active: *t == tab,
            })
            .collect(),
        tab: tab.as_str(),
        status,
        form_error: view.form_error,
        hero: view.hero,
        gallery,
        testimonials,
        saving: view.saving,
        cancel_href: tab_url(tab, None),
    }
}

/// GET /admin/dashboard?tab=&edit=
pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let Some(visitor) = signed_in(&state, &jar).await else {
        return Redirect::to(LOGIN_PATH).into_response();
    };
    if visitor.session().is_loading() {
        return render(LoadingTemplate);
    }
    let Some(user) = visitor.session().user() else {
        return Redirect::to(LOGIN_PATH).into_response();
    };

    let dashboard = visitor.view_dashboard().await;
    match query.edit.as_deref() {
        Some(id) => dashboard.begin_edit(id),
        None => dashboard.cancel_edit(),
    }

    let tab = Tab::from_query(query.tab.as_deref());
    render(render_dashboard(&user, tab, dashboard.view()))
}

/// POST /admin/hero
pub async fn save_hero(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<HeroInput>,
) -> Result<Redirect, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let result = dashboard
        .update_hero_content(HeroForm {
            title: input.title,
            subtitle: input.subtitle,
            cta_text: input.cta_text,
        })
        .await;
    settle(result, Tab::Hero, None)
}

/// POST /admin/gallery
pub async fn add_gallery_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<GalleryInput>,
) -> Result<Redirect, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let result = dashboard
        .add_gallery_image(&input.image_url, &input.alt_text)
        .await;
    settle(result, Tab::Gallery, None)
}

/// POST /admin/gallery/{id}
pub async fn update_gallery_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(input): Form<GalleryInput>,
) -> Result<Redirect, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let updates = GalleryImageUpdate {
        image_url: Some(input.image_url),
        alt_text: Some(input.alt_text),
        order_index: parse_order_index(&input.order_index)?,
    };
    let result = dashboard.update_gallery_image(&id, updates).await;
    settle(result, Tab::Gallery, Some(&id))
}

/// POST /admin/testimonials
pub async fn add_testimonial(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(input): Form<TestimonialInput>,
) -> Result<Redirect, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let result = dashboard.add_testimonial(&input.name, &input.content).await;
    settle(result, Tab::Testimonials, None)
}

/// POST /admin/testimonials/{id}
pub async fn update_testimonial(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(input): Form<TestimonialInput>,
) -> Result<Redirect, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let updates = TestimonialUpdate {
        name: Some(input.name),
        content: Some(input.content),
        order_index: parse_order_index(&input.order_index)?,
    };
    let result = dashboard.update_testimonial(&id, updates).await;
    settle(result, Tab::Testimonials, Some(&id))
}

#[derive(Template)]
#[template(path = "admin/confirm.html")]
pub struct ConfirmTemplate {
    pub question: &'static str,
    pub action: String,
    pub cancel_href: String,
    pub image: Option<GalleryImage>,
    pub testimonial: Option<Testimonial>,
}

fn find_image(view: &DashboardView, id: &str) -> Option<GalleryImage> {
    view.gallery.iter().find(|g| g.id == id).cloned()
}

fn find_testimonial(view: &DashboardView, id: &str) -> Option<Testimonial> {
    view.testimonials.iter().find(|t| t.id == id).cloned()
}

/// GET /admin/gallery/{id}/delete - Ask before deleting.
pub async fn confirm_delete_gallery_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let image = find_image(&dashboard.view(), &id)
        .ok_or_else(|| AppError::NotFound(format!("No gallery image with id {}.", id)))?;
    Ok(render(ConfirmTemplate {
        question: "Are you sure you want to delete this image?",
        action: format!("/admin/gallery/{}/delete", id),
        cancel_href: tab_url(Tab::Gallery, None),
        image: Some(image),
        testimonial: None,
    }))
}

/// POST /admin/gallery/{id}/delete - `confirm=yes` deletes, anything else declines.
pub async fn delete_gallery_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(input): Form<ConfirmInput>,
) -> Result<Redirect, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let result = dashboard
        .delete_gallery_image(&id, |_| input.confirm == "yes")
        .await;
    settle(result, Tab::Gallery, None)
}

/// GET /admin/testimonials/{id}/delete
pub async fn confirm_delete_testimonial(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let testimonial = find_testimonial(&dashboard.view(), &id)
        .ok_or_else(|| AppError::NotFound(format!("No testimonial with id {}.", id)))?;
    Ok(render(ConfirmTemplate {
        question: "Are you sure you want to delete this testimonial?",
        action: format!("/admin/testimonials/{}/delete", id),
        cancel_href: tab_url(Tab::Testimonials, None),
        image: None,
        testimonial: Some(testimonial),
    }))
}

/// POST /admin/testimonials/{id}/delete
pub async fn delete_testimonial(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(input): Form<ConfirmInput>,
) -> Result<Redirect, AppError> {
    let dashboard = editor(&state, &jar).await?;
    let result = dashboard
        .delete_testimonial(&id, |_| input.confirm == "yes")
        .await;
    settle(result, Tab::Testimonials, None)
}
