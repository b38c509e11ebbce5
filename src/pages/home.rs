//! Landing page and the About page.

use askama::Template;
use axum::extract::State;
use axum::response::Response;

use super::layout::{nav, render, NavLink, Section};
use crate::content::HomeContent;
use crate::lifecycle::Scope;
use crate::models::{GalleryImage, HeroContent, Testimonial};
use crate::AppState;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Vec<NavLink>,
    pub hero: HeroContent,
    pub gallery: Vec<GalleryImage>,
    pub testimonials: Vec<Testimonial>,
}

impl From<HomeContent> for HomeTemplate {
    fn from(content: HomeContent) -> Self {
        Self {
            nav: nav(Some(Section::Home)),
            hero: content.hero,
            gallery: content.gallery,
            testimonials: content.testimonials,
        }
    }
}

/// GET / - Hero, gallery and testimonials.
pub async fn home(State(state): State<AppState>) -> Response {
    let scope = Scope::new();
    let content = HomeContent::load(&state.public, &scope).await;
    render(HomeTemplate::from(content))
}

const VALUES: [(&str, &str); 4] = [
    (
        "Passion",
        "Every stitch is infused with love and dedication to creating something truly beautiful.",
    ),
    (
        "Excellence",
        "We never compromise on quality, ensuring each piece meets the highest standards.",
    ),
    (
        "Community",
        "Supporting local artisans and building a community of empowered women.",
    ),
    (
        "Innovation",
        "Constantly evolving while honoring traditional techniques and craftsmanship.",
    ),
];

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub nav: Vec<NavLink>,
    pub values: &'static [(&'static str, &'static str)],
}

/// GET /about
pub async fn about() -> Response {
    render(AboutTemplate {
        nav: nav(Some(Section::About)),
        values: &VALUES,
    })
}
