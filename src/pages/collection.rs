//! Collection showcase with category filter and sort order.

use askama::Template;
use axum::extract::Query;
use axum::response::Response;
use serde::Deserialize;

use super::layout::{nav, render, NavLink, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Dresses,
    Tops,
    Bottoms,
    Accessories,
}

impl Category {
    const ALL: [Category; 4] = [
        Category::Dresses,
        Category::Tops,
        Category::Bottoms,
        Category::Accessories,
    ];

    fn slug(&self) -> &'static str {
        match self {
            Category::Dresses => "dresses",
            Category::Tops => "tops",
            Category::Bottoms => "bottoms",
            Category::Accessories => "accessories",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Category::Dresses => "Dresses",
            Category::Tops => "Tops & Blouses",
            Category::Bottoms => "Bottoms",
            Category::Accessories => "Accessories",
        }
    }

    fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.slug() == slug)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Featured,
    Newest,
    PriceLow,
    PriceHigh,
    Rating,
}

impl SortBy {
    fn from_slug(slug: Option<&str>) -> Self {
        match slug {
            Some("newest") => SortBy::Newest,
            Some("price-low") => SortBy::PriceLow,
            Some("price-high") => SortBy::PriceHigh,
            Some("rating") => SortBy::Rating,
            _ => SortBy::Featured,
        }
    }
}

#[derive(Debug)]
pub struct CollectionItem {
    pub name: &'static str,
    /// Price in whole rupees
    pub price: u32,
    pub image: &'static str,
    pub category: Category,
    pub is_new: bool,
    pub is_featured: bool,
    pub rating: u8,
    pub description: &'static str,
}

pub static ITEMS: [CollectionItem; 8] = [
    CollectionItem {
        name: "Ethereal Evening Gown",
        price: 45_000,
        image: "https://i.ibb.co/zWSytyyj/Every-collection-begins-with-a-feeling-an-echo-from-our-roots-a-whisper-of-what-s-to-come-This-1.jpg",
        category: Category::Dresses,
        is_new: true,
        is_featured: true,
        rating: 5,
        description: "A stunning evening gown that embodies elegance and sophistication with intricate embroidery.",
    },
    CollectionItem {
        name: "Heritage Silk Saree",
        price: 32_000,
        image: "https://i.ibb.co/1Yf6gy8y/Every-collection-begins-with-a-feeling-an-echo-from-our-roots-a-whisper-of-what-s-to-come-This.jpg",
        category: Category::Dresses,
        is_new: false,
        is_featured: true,
        rating: 5,
        description: "Traditional silk saree with contemporary draping and modern embellishments.",
    },
    CollectionItem {
        name: "Couture Blazer Set",
        price: 28_000,
        image: "https://i.ibb.co/0p6Hb5XS/Laid-back-but-make-it-couture-ivoke25-ivokeindia-1.jpg",
        category: Category::Tops,
        is_new: true,
        is_featured: false,
        rating: 4,
        description: "Laid-back luxury meets couture craftsmanship in this sophisticated blazer ensemble.",
    },
    CollectionItem {
        name: "Modern Minimalist Dress",
        price: 22_000,
        image: "https://i.ibb.co/m5DShqJz/Laid-back-but-make-it-couture-ivoke25-ivokeindia-2.jpg",
        category: Category::Dresses,
        is_new: false,
        is_featured: false,
        rating: 4,
        description: "Clean lines and subtle details create a perfect balance of comfort and elegance.",
    },
    CollectionItem {
        name: "Statement Coord Set",
        price: 35_000,
        image: "https://i.ibb.co/Y4m0RV4p/Laid-back-but-make-it-couture-ivoke25-ivokeindia.jpg",
        category: Category::Tops,
        is_new: false,
        is_featured: true,
        rating: 5,
        description: "Bold yet refined coordinate set that makes a statement while maintaining sophistication.",
    },
    CollectionItem {
        name: "Artisan Crafted Ensemble",
        price: 42_000,
        image: "https://i.ibb.co/yn52pVgP/Look-closer-It-s-Ivoke-Where-subtle-meets-striking-ivokeindia-khoje-edit1.jpg",
        category: Category::Dresses,
        is_new: true,
        is_featured: true,
        rating: 5,
        description: "Where subtle meets striking - intricate craftsmanship in every detail.",
    },
    CollectionItem {
        name: "Rebellious Grace",
        price: 38_000,
        image: "https://i.ibb.co/67S48r5W/Poised-rebellion.jpg",
        category: Category::Dresses,
        is_new: false,
        is_featured: false,
        rating: 4,
        description: "Poised rebellion captured in fabric - for the woman who dares to be different.",
    },
    CollectionItem {
        name: "Contemporary Classic",
        price: 29_000,
        image: "https://i.ibb.co/7cbJnRb/502439061-17852486307470958-6083905811463632621-n.jpg",
        category: Category::Tops,
        is_new: false,
        is_featured: false,
        rating: 4,
        description: "Timeless design with a contemporary twist, perfect for the modern woman.",
    },
];

#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// Items in `category` (all when `None`), ordered by `sort`. The sort is
/// stable, so ties keep catalogue order.
pub fn select_items(category: Option<Category>, sort: SortBy) -> Vec<&'static CollectionItem> {
    let mut items: Vec<&CollectionItem> = ITEMS
        .iter()
        .filter(|item| category.is_none() || category == Some(item.category))
        .collect();

    match sort {
        SortBy::Featured => items.sort_by_key(|item| !item.is_featured),
        SortBy::Newest => items.sort_by_key(|item| !item.is_new),
        SortBy::PriceLow => items.sort_by_key(|item| item.price),
        SortBy::PriceHigh => items.sort_by_key(|item| std::cmp::Reverse(item.price)),
        SortBy::Rating => items.sort_by_key(|item| std::cmp::Reverse(item.rating)),
    }
    items
}

/// ₹45,000 style grouping.
fn format_price(rupees: u32) -> String {
    let digits = rupees.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("₹{}", grouped)
}

pub struct FilterLink {
    pub slug: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Display-ready item.
pub struct ItemCard {
    pub name: &'static str,
    pub image: &'static str,
    pub price: String,
    pub description: &'static str,
    pub rating: u8,
    pub is_new: bool,
}

impl From<&CollectionItem> for ItemCard {
    fn from(item: &CollectionItem) -> Self {
        Self {
            name: item.name,
            image: item.image,
            price: format_price(item.price),
            description: item.description,
            rating: item.rating,
            is_new: item.is_new,
        }
    }
}

#[derive(Template)]
#[template(path = "collection.html")]
pub struct CollectionTemplate {
    pub nav: Vec<NavLink>,
    pub filters: Vec<FilterLink>,
    pub cards: Vec<ItemCard>,
}

impl CollectionTemplate {
    pub fn new(category: Option<Category>, sort: SortBy) -> Self {
        let filters = std::iter::once(("all", "All Items"))
            .chain(Category::ALL.iter().map(|c| (c.slug(), c.label())))
            .map(|(slug, label)| FilterLink {
                slug,
                label,
                active: match category {
                    Some(c) => c.slug() == slug,
                    None => slug == "all",
                },
            })
            .collect();

        Self {
            nav: nav(Some(Section::Collection)),
            filters,
            cards: select_items(category, sort)
                .into_iter()
                .map(ItemCard::from)
                .collect(),
        }
    }
}

/// GET /collection?category=&sort=
pub async fn collection(Query(query): Query<CollectionQuery>) -> Response {
    let category = query.category.as_deref().and_then(Category::from_slug);
    let sort = SortBy::from_slug(query.sort.as_deref());
    render(CollectionTemplate::new(category, sort))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_category() {
        let tops = select_items(Some(Category::Tops), SortBy::Featured);
        assert_eq!(tops.len(), 3);
        assert!(tops.iter().all(|i| i.category == Category::Tops));
        assert!(select_items(Some(Category::Accessories), SortBy::Featured).is_empty());
        assert_eq!(select_items(None, SortBy::Featured).len(), 8);
    }

    #[test]
    fn test_sort_orders() {
        let by_price = select_items(None, SortBy::PriceLow);
        assert_eq!(by_price[0].name, "Modern Minimalist Dress");
        assert_eq!(by_price[7].name, "Ethereal Evening Gown");

        let featured = select_items(None, SortBy::Featured);
        assert!(featured[..4].iter().all(|i| i.is_featured));
        assert_eq!(featured[0].name, "Ethereal Evening Gown");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(45_000), "₹45,000");
        assert_eq!(format_price(1_250_000), "₹1,250,000");
        assert_eq!(format_price(900), "₹900");
    }

    #[test]
    fn test_page_lists_filtered_items() {
        let html = CollectionTemplate::new(Some(Category::Tops), SortBy::PriceHigh)
            .render()
            .unwrap();
        assert_eq!(html.matches(r#"<article class="item">"#).count(), 3);
        assert!(html.contains(r#"<a href="/collection?category=tops" class="active">"#));
        assert!(html.contains("Tops &amp; Blouses"));
        assert!(html.contains("₹35,000"));
        let dearest = html.find("Statement Coord Set").unwrap();
        let cheapest = html.find("Couture Blazer Set").unwrap();
        assert!(dearest < cheapest);
    }

    #[test]
    fn test_unknown_query_values_fall_back() {
        assert_eq!(Category::from_slug("hats"), None);
        assert_eq!(SortBy::from_slug(Some("cheapest")), SortBy::Featured);
    }
}
