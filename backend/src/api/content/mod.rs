//! Module for the public content pages.
//!
//! App and story detail pages, the localized index, and the result and
//! photo pages tied to a social identity.

pub mod handlers;
pub mod routes;
