//! Module for superuser-only monitoring pages.

pub mod handlers;
pub mod routes;
