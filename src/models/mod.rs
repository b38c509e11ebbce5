//! Data models for the Ivoke site.
//!
//! Field names match the backend's table columns exactly, so rows deserialize
//! straight from data API responses.

mod contact;
mod gallery;
mod hero;
mod testimonial;
mod user;

pub use contact::*;
pub use gallery::*;
pub use hero::*;
pub use testimonial::*;
pub use user::*;
