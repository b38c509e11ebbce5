//! Hero banner model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed identity of the single `hero_content` row.
pub const HERO_ID: i64 = 1;

/// Landing page hero banner. One logical row, addressed by [`HERO_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroContent {
    #[serde(default = "hero_id")]
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub cta_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn hero_id() -> i64 {
    HERO_ID
}

impl HeroContent {
    pub const TABLE: &'static str = "hero_content";
}

impl Default for HeroContent {
    fn default() -> Self {
        Self {
            id: HERO_ID,
            title: "Tradition Reimagined".to_string(),
            subtitle: "Where heritage meets haute couture. Every thread tells a story of timeless elegance."
                .to_string(),
            cta_text: "Discover Collection".to_string(),
            updated_at: None,
        }
    }
}
