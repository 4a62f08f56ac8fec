//! Storefront admin client library.
//!
//! The domain owns session state, route guarding, and the category
//! catalogue; outbound adapters talk to Supabase; the inbound CLI drives
//! both.

pub mod domain;
pub mod inbound;
pub mod outbound;
