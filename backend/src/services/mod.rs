//! Module for the page-building services.
//!
//! Handlers stay thin: everything that decides what goes into a page context
//! (locale resolution, ad composition, per-view assembly) lives here.

pub mod ads;
pub mod context;
pub mod locale;
pub mod pages;
