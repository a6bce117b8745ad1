//! Authentication module resolving the visitor behind each request.
//!
//! Sessions are issued elsewhere (the social-login flow); this module only
//! turns a session token into a `Viewer`, exposes the viewer's social uid,
//! and guards the admin-only routes.

pub mod errors;
pub mod middleware;
pub mod models;
pub mod service;

// Re-exports for convenience
pub use errors::*;
pub use middleware::*;
pub use models::*;
pub use service::*;
