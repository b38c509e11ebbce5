//! Ivoke Site
//!
//! Server-rendered marketing site and admin content editor for the Ivoke
//! fashion brand, backed by a hosted data and auth service.

mod admin;
mod api;
mod backend;
mod config;
mod content;
mod errors;
mod lifecycle;
mod models;
mod pages;
mod session;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use backend::{Backend, Client};
use config::Config;
use session::VisitorStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    /// Client for public reads and contact submissions; never signs in
    pub public: Client,
    pub visitors: VisitorStore,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, backend::BackendError> {
        let backend = Backend::new(&config.backend)?;
        Ok(Self {
            public: backend.anonymous(),
            backend,
            visitors: VisitorStore::new(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Ivoke site");
    let state = AppState::new(&config)?;
    tracing::info!("Backend: {}", state.backend.url());
    tracing::info!("Bind address: {}", config.bind_addr);

    // Evict visitors whose browsers never came back
    state
        .visitors
        .spawn_sweeper(session::SWEEP_INTERVAL, session::VISITOR_IDLE_TIMEOUT);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public pages
    let site_routes = Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/collection", get(pages::collection))
        .route("/contact", get(pages::contact_page).post(pages::submit_contact));

    // Admin pages
    let admin_routes = Router::new()
        .route("/login", get(pages::login_page).post(pages::login))
        .route("/logout", post(pages::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/hero", post(pages::save_hero))
        // Gallery
        .route("/gallery", post(pages::add_gallery_image))
        .route("/gallery/{id}", post(pages::update_gallery_image))
        .route(
            "/gallery/{id}/delete",
            get(pages::confirm_delete_gallery_image).post(pages::delete_gallery_image),
        )
        // Testimonials
        .route("/testimonials", post(pages::add_testimonial))
        .route("/testimonials/{id}", post(pages::update_testimonial))
        .route(
            "/testimonials/{id}/delete",
            get(pages::confirm_delete_testimonial).post(pages::delete_testimonial),
        );

    // API routes
    let api_routes = Router::new()
        .route("/content", get(api::get_content))
        .fallback(api::not_found);

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(site_routes)
        .nest("/admin", admin_routes)
        .nest("/api", api_routes)
        .merge(health_routes)
        .fallback(pages::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod testing;
