//! Customer testimonial model.

use serde::{Deserialize, Serialize};

/// A customer quote shown on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub content: String,
    pub order_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Testimonial {
    pub const TABLE: &'static str = "testimonials";
}

/// Insert payload for a new testimonial.
#[derive(Debug, Clone, Serialize)]
pub struct NewTestimonial {
    pub name: String,
    pub content: String,
    pub order_index: i64,
}

/// Partial update for a testimonial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestimonialUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl TestimonialUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.content.is_none() && self.order_index.is_none()
    }
}
