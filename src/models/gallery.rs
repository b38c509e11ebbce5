//! Gallery image model.

use serde::{Deserialize, Serialize};

/// An image shown in the landing page gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub image_url: String,
    pub alt_text: String,
    /// Display position; lower comes first, duplicates allowed
    pub order_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl GalleryImage {
    pub const TABLE: &'static str = "gallery_images";
}

/// Insert payload for a new gallery image. The backend assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewGalleryImage {
    pub image_url: String,
    pub alt_text: String,
    pub order_index: i64,
}

/// Partial update for a gallery image; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GalleryImageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl GalleryImageUpdate {
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.alt_text.is_none() && self.order_index.is_none()
    }
}
