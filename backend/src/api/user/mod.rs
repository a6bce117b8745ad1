//! Module for the signed-in user's own pages.

pub mod handlers;
pub mod routes;
