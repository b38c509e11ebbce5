//! Public content loaders for the landing page sections.
//!
//! Each loader reads one collection with the public key. When the backend has
//! nothing to offer, or fails, the section renders its built-in defaults.

mod defaults;

pub use defaults::*;

use serde::Serialize;

use crate::backend::Client;
use crate::lifecycle::Scope;
use crate::models::{GalleryImage, HeroContent, Testimonial, HERO_ID};

/// Sort ascending by `key`. The sort is stable, so rows sharing an index keep
/// the order the backend returned them in.
pub fn in_display_order<T>(mut rows: Vec<T>, key: impl Fn(&T) -> i64) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    rows
}

pub async fn load_hero(client: &Client) -> HeroContent {
    let result = client
        .from(HeroContent::TABLE)
        .select("*")
        .eq("id", HERO_ID)
        .fetch_optional::<HeroContent>()
        .await;

    match result {
        Ok(Some(hero)) => hero,
        Ok(None) => {
            tracing::debug!("No hero row; using default hero content");
            HeroContent::default()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Using default hero content");
            HeroContent::default()
        }
    }
}

pub async fn load_gallery(client: &Client) -> Vec<GalleryImage> {
    let result = client
        .from(GalleryImage::TABLE)
        .select("*")
        .order("order_index", true)
        .fetch::<GalleryImage>()
        .await;

    match result {
        Ok(rows) if !rows.is_empty() => in_display_order(rows, |r| r.order_index),
        Ok(_) => default_gallery(),
        Err(err) => {
            tracing::warn!(error = %err, "Using default gallery images");
            default_gallery()
        }
    }
}

pub async fn load_testimonials(client: &Client) -> Vec<Testimonial> {
    let result = client
        .from(Testimonial::TABLE)
        .select("*")
        .order("order_index", true)
        .fetch::<Testimonial>()
        .await;

    match result {
        Ok(rows) if !rows.is_empty() => in_display_order(rows, |r| r.order_index),
        Ok(_) => default_testimonials(),
        Err(err) => {
            tracing::warn!(error = %err, "Using default testimonials");
            default_testimonials()
        }
    }
}

/// Everything the landing page shows.
#[derive(Debug, Clone, Serialize)]
pub struct HomeContent {
    pub hero: HeroContent,
    pub gallery: Vec<GalleryImage>,
    pub testimonials: Vec<Testimonial>,
}

impl Default for HomeContent {
    fn default() -> Self {
        Self {
            hero: HeroContent::default(),
            gallery: default_gallery(),
            testimonials: default_testimonials(),
        }
    }
}

impl HomeContent {
    /// Load all sections concurrently. If `scope` is torn down first, the
    /// defaults are kept.
    pub async fn load(client: &Client, scope: &Scope) -> Self {
        let loaded = scope
            .run(async {
                tokio::join!(
                    load_hero(client),
                    load_gallery(client),
                    load_testimonials(client)
                )
            })
            .await;

        match loaded {
            Some((hero, gallery, testimonials)) => Self {
                hero,
                gallery,
                testimonials,
            },
            None => Self::default(),
        }
    }
}
