//! Server-rendered HTML pages.
//!
//! Public pages read content with the public key per request; admin pages
//! work through the visitor's own session context.

mod admin;
mod collection;
mod contact;
mod home;
mod layout;

pub use admin::*;
pub use collection::*;
pub use contact::*;
pub use home::*;
pub use layout::*;
