//! Built-in section content shown when the backend has none.

use crate::models::{GalleryImage, Testimonial};

const GALLERY_URLS: [&str; 8] = [
    "https://i.ibb.co/zWSytyyj/Every-collection-begins-with-a-feeling-an-echo-from-our-roots-a-whisper-of-what-s-to-come-This-1.jpg",
    "https://i.ibb.co/1Yf6gy8y/Every-collection-begins-with-a-feeling-an-echo-from-our-roots-a-whisper-of-what-s-to-come-This.jpg",
    "https://i.ibb.co/0p6Hb5XS/Laid-back-but-make-it-couture-ivoke25-ivokeindia-1.jpg",
    "https://i.ibb.co/m5DShqJz/Laid-back-but-make-it-couture-ivoke25-ivokeindia-2.jpg",
    "https://i.ibb.co/Y4m0RV4p/Laid-back-but-make-it-couture-ivoke25-ivokeindia.jpg",
    "https://i.ibb.co/yn52pVgP/Look-closer-It-s-Ivoke-Where-subtle-meets-striking-ivokeindia-khoje-edit1.jpg",
    "https://i.ibb.co/67S48r5W/Poised-rebellion.jpg",
    "https://i.ibb.co/7cbJnRb/502439061-17852486307470958-6083905811463632621-n.jpg",
];

const TESTIMONIALS: [(&str, &str); 3] = [
    (
        "Priya Sharma",
        "Ivoke has redefined elegance for me. Each piece tells a story, and wearing their couture makes me feel connected to my heritage while embracing modernity.",
    ),
    (
        "Ananya Gupta",
        "The craftsmanship is absolutely breathtaking. Every detail is perfect, from the intricate embroidery to the way the fabric flows. Pure artistry.",
    ),
    (
        "Kavya Reddy",
        "I have never felt more confident and beautiful. Ivoke understands what it means to create clothes that celebrate femininity and strength.",
    ),
];

pub fn default_gallery() -> Vec<GalleryImage> {
    GALLERY_URLS
        .iter()
        .zip(1i64..)
        .map(|(url, position)| GalleryImage {
            id: position.to_string(),
            image_url: url.to_string(),
            alt_text: format!("Collection piece {}", position),
            order_index: position,
            created_at: None,
        })
        .collect()
}

pub fn default_testimonials() -> Vec<Testimonial> {
    TESTIMONIALS
        .iter()
        .zip(1i64..)
        .map(|((name, content), position)| Testimonial {
            id: position.to_string(),
            name: name.to_string(),
            content: content.to_string(),
            order_index: position,
            created_at: None,
        })
        .collect()
}
